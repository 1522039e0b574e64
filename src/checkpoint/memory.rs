use crate::checkpoint::traits::{SnapshotStore, StoreError, StoreResult, StoredSnapshot};
use std::collections::BTreeMap;
use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// In-memory snapshot store
///
/// Modification times come from a logical clock that ticks one second per
/// write, so later writes are always strictly newer.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    documents: BTreeMap<String, (Vec<u8>, SystemTime)>,
    clock: u64,
    fail_writes: bool,
    writes: usize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail (or succeed again)
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Overrides the modification time of an existing document
    pub fn set_modified(&mut self, name: &str, modified: SystemTime) {
        if let Some(entry) = self.documents.get_mut(name) {
            entry.1 = modified;
        }
    }

    pub fn contents(&self, name: &str) -> Option<&[u8]> {
        self.documents.get(name).map(|(bytes, _)| bytes.as_slice())
    }

    pub fn names(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    /// Number of successful writes so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn write(&mut self, name: &str, contents: &[u8]) -> StoreResult<()> {
        if self.fail_writes {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("write of {} refused", name),
            )));
        }

        self.clock += 1;
        let modified = UNIX_EPOCH + Duration::from_secs(self.clock);
        self.documents
            .insert(name.to_string(), (contents.to_vec(), modified));
        self.writes += 1;
        Ok(())
    }

    fn read(&self, name: &str) -> StoreResult<Vec<u8>> {
        self.documents
            .get(name)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    fn list(&self) -> StoreResult<Vec<StoredSnapshot>> {
        Ok(self
            .documents
            .iter()
            .map(|(name, (bytes, modified))| StoredSnapshot {
                name: name.clone(),
                modified: *modified,
                size: bytes.len() as u64,
            })
            .collect())
    }
}
