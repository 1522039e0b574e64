//! Snapshot store trait and error types
//!
//! A snapshot store keeps named, durable documents together with their
//! modification time. The checkpoint logic only ever replaces whole
//! documents.

use std::time::SystemTime;
use thiserror::Error;

/// Errors that can occur during snapshot store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for snapshot store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Listing entry for one stored document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSnapshot {
    pub name: String,
    pub modified: SystemTime,
    pub size: u64,
}

/// Trait for snapshot storage backends
pub trait SnapshotStore: Send {
    /// Replaces the document `name` with `contents`
    ///
    /// Implementations must never leave a partially written document under
    /// `name`.
    fn write(&mut self, name: &str, contents: &[u8]) -> StoreResult<()>;

    /// Reads the whole document `name`
    fn read(&self, name: &str) -> StoreResult<Vec<u8>>;

    /// Lists every stored document
    fn list(&self) -> StoreResult<Vec<StoredSnapshot>>;

    /// Describes one document, if it exists
    fn describe(&self, name: &str) -> StoreResult<Option<StoredSnapshot>> {
        Ok(self.list()?.into_iter().find(|s| s.name == name))
    }
}
