//! Output module for reports and dataset tooling
//!
//! This module handles:
//! - Rendering records as CSV
//! - Writing the markdown run summary
//! - Computing and printing dataset statistics
//! - Validating an exported dataset

mod markdown;
pub mod stats;
mod tabular;
mod validation;

pub use markdown::{format_run_summary, write_run_summary};
pub use stats::{print_statistics, DatasetStatistics};
pub use tabular::{render_csv, write_row};
pub use validation::{print_validation, validate_records, IssueKind, ValidationIssue};

use crate::checkpoint::{recovery_candidates, SnapshotNames, SnapshotStore, StoreError};
use crate::record::Record;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Reads the records of the most recent full snapshot, as stored
///
/// Unlike recovery this keeps duplicates and records without an ID, so
/// validation sees exactly what is on disk. Returns `None` when no snapshot
/// exists.
pub fn load_latest_records<S: SnapshotStore>(
    store: &S,
    names: &SnapshotNames,
) -> OutputResult<Option<(String, Vec<Record>)>> {
    let Some(candidate) = recovery_candidates(store, names)?.into_iter().next() else {
        return Ok(None);
    };

    let name = candidate.snapshot.name;
    let bytes = store.read(&name)?;
    let records = serde_json::from_slice(&bytes).map_err(|source| OutputError::Decode {
        name: name.clone(),
        source,
    })?;

    Ok(Some((name, records)))
}
