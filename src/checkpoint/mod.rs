//! Checkpointing and recovery
//!
//! # Components
//!
//! - `SnapshotStore`: durable named documents (`FsSnapshotStore`, `MemorySnapshotStore`)
//! - `SnapshotNames`: the naming scheme for snapshots and exports
//! - `CheckpointStore`: interval snapshots, the final chunk and the consolidated dataset
//! - `load_latest`: rebuilds an accumulator from the most recent full snapshot

mod fs;
mod memory;
mod names;
mod recovery;
mod store;
mod traits;

pub use fs::FsSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use names::{CheckpointInfo, SnapshotKind, SnapshotNames};
pub use recovery::{load_latest, recovery_candidates, Recovered, RecoveryCandidate};
pub use store::{final_chunk_len, CheckpointStore, FinalSnapshots, PersistenceError};
pub use traits::{SnapshotStore, StoreError, StoreResult, StoredSnapshot};
