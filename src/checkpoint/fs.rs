use crate::checkpoint::traits::{SnapshotStore, StoreError, StoreResult, StoredSnapshot};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Snapshot store backed by a directory
///
/// Writes go to a hidden temporary file that is renamed over the target,
/// so a reader only ever sees complete documents. Hidden files are not
/// listed.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    root: PathBuf,
}

impl FsSnapshotStore {
    /// Creates a store rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the document `name`
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn write(&mut self, name: &str, contents: &[u8]) -> StoreResult<()> {
        fs::create_dir_all(&self.root)?;

        let target = self.path_of(name);
        let staging = self.root.join(format!(".{}.tmp", name));

        let mut file = File::create(&staging)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        Ok(())
    }

    fn read(&self, name: &str) -> StoreResult<Vec<u8>> {
        match fs::read(self.path_of(name)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> StoreResult<Vec<StoredSnapshot>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            snapshots.push(StoredSnapshot {
                name,
                modified: metadata.modified()?,
                size: metadata.len(),
            });
        }

        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(snapshots)
    }
}
