//! State module for tracking sweep progress
//!
//! # Components
//!
//! - `Phase`: the phases of the traversal state machine and their allowed moves
//! - `TraversalState`: the controller's cursor (phase, target page, counters)
//! - `Deduplicator`: identities admitted so far
//! - `Accumulator`: admitted records in discovery order

mod accumulator;
mod dedup;
mod phase;
mod traversal_state;

// Re-export main types
pub use accumulator::{Accumulator, AdmissionError};
pub use dedup::{Admission, Deduplicator};
pub use phase::Phase;
pub use traversal_state::TraversalState;
