//! Checkpoint cadence and the final dataset
//!
//! `CheckpointStore` decides when the accumulator is written and under which
//! name:
//! - an interval snapshot of the whole accumulator at every multiple of the
//!   interval size, once per count
//! - at the end of a run, the tail chunk since the last boundary
//! - the consolidated dataset as JSON and as CSV

use crate::checkpoint::names::{CheckpointInfo, SnapshotKind, SnapshotNames};
use crate::checkpoint::traits::{SnapshotStore, StoreError};
use crate::output::render_csv;
use crate::record::Record;
use crate::state::Accumulator;
use chrono::Utc;
use thiserror::Error;

/// A snapshot that could not be written
#[derive(Debug, Error)]
#[error("failed to write {name}: {source}")]
pub struct PersistenceError {
    pub name: String,
    #[source]
    pub source: StoreError,
}

/// What the end-of-run write produced
#[derive(Debug, Default)]
pub struct FinalSnapshots {
    pub chunk: Option<CheckpointInfo>,
    pub consolidated: Option<CheckpointInfo>,
    pub failures: Vec<PersistenceError>,
}

/// Number of records in the final chunk for `len` admitted records
///
/// The records since the last interval boundary, or a whole interval when
/// `len` sits exactly on one.
pub fn final_chunk_len(len: usize, interval: usize) -> usize {
    if len == 0 {
        return 0;
    }
    match len % interval {
        0 => interval.min(len),
        rest => rest,
    }
}

/// Writes checkpoints of an accumulator into a snapshot store
pub struct CheckpointStore<S: SnapshotStore> {
    store: S,
    names: SnapshotNames,
    interval: usize,
    last_written: Option<usize>,
    written: Vec<CheckpointInfo>,
}

impl<S: SnapshotStore> CheckpointStore<S> {
    /// Creates a checkpoint store; `interval` must be at least 1
    pub fn new(store: S, names: SnapshotNames, interval: usize) -> Self {
        Self {
            store,
            names,
            interval: interval.max(1),
            last_written: None,
            written: Vec::new(),
        }
    }

    /// Marks `count` records as already persisted by an earlier run
    pub fn seed(&mut self, count: usize) {
        if count > 0 {
            self.last_written = Some(count);
        }
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn names(&self) -> &SnapshotNames {
        &self.names
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Snapshots written by this store so far, in write order
    pub fn written(&self) -> &[CheckpointInfo] {
        &self.written
    }

    /// Writes an interval snapshot if the accumulator sits on a new boundary
    ///
    /// Returns `Ok(None)` when nothing was due. A failed write leaves the
    /// boundary pending, so the next opportunity at the same count retries it.
    pub fn maybe_checkpoint(
        &mut self,
        accumulator: &Accumulator,
    ) -> Result<Option<CheckpointInfo>, PersistenceError> {
        let len = accumulator.len();
        if len == 0 || len % self.interval != 0 {
            return Ok(None);
        }
        if self.last_written.is_some_and(|written| len <= written) {
            return Ok(None);
        }

        let name = self.names.interval(len);
        let info = self.write_records(&name, SnapshotKind::Interval(len), accumulator.records())?;
        self.last_written = Some(len);

        tracing::info!("Checkpoint written: {} ({} records)", name, len);
        Ok(Some(info))
    }

    /// Writes the final chunk and the consolidated dataset
    ///
    /// Called once per run. Every write is attempted even if an earlier one
    /// failed; failures are collected.
    pub fn final_checkpoint(&mut self, accumulator: &Accumulator) -> FinalSnapshots {
        let mut result = FinalSnapshots::default();

        let chunk_len = final_chunk_len(accumulator.len(), self.interval);
        if chunk_len > 0 {
            let name = self.names.final_chunk();
            match self.write_records(&name, SnapshotKind::FinalChunk, accumulator.tail(chunk_len)) {
                Ok(info) => {
                    tracing::info!("Final chunk written: {} ({} records)", name, chunk_len);
                    result.chunk = Some(info);
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    result.failures.push(e);
                }
            }
        }

        match self.write_consolidated(accumulator.records()) {
            Ok(info) => result.consolidated = Some(info),
            Err(errors) => {
                for e in &errors {
                    tracing::error!("{}", e);
                }
                result.failures.extend(errors);
            }
        }

        result
    }

    /// Writes `records` as the consolidated JSON dataset and its CSV rendering
    pub fn write_consolidated(
        &mut self,
        records: &[Record],
    ) -> Result<CheckpointInfo, Vec<PersistenceError>> {
        let mut failures = Vec::new();

        let json_name = self.names.consolidated();
        let info = match self.write_records(&json_name, SnapshotKind::Consolidated, records) {
            Ok(info) => Some(info),
            Err(e) => {
                failures.push(e);
                None
            }
        };

        let csv_name = self.names.tabular();
        if let Err(source) = self.store.write(&csv_name, render_csv(records).as_bytes()) {
            failures.push(PersistenceError {
                name: csv_name,
                source,
            });
        }

        match info {
            Some(info) if failures.is_empty() => {
                tracing::info!(
                    "Consolidated dataset written: {} and {} ({} records)",
                    json_name,
                    self.names.tabular(),
                    records.len()
                );
                Ok(info)
            }
            _ => Err(failures),
        }
    }

    fn write_records(
        &mut self,
        name: &str,
        kind: SnapshotKind,
        records: &[Record],
    ) -> Result<CheckpointInfo, PersistenceError> {
        let fail = |source: StoreError| PersistenceError {
            name: name.to_string(),
            source,
        };

        let bytes = serde_json::to_vec_pretty(records).map_err(|e| fail(e.into()))?;
        self.store.write(name, &bytes).map_err(fail)?;

        let info = CheckpointInfo {
            name: name.to_string(),
            kind,
            records: records.len(),
            modified: Utc::now(),
        };
        self.written.push(info.clone());
        Ok(info)
    }
}
