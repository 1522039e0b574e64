use crate::record::Record;
use crate::state::dedup::{Admission, Deduplicator};
use thiserror::Error;

/// A record the accumulator refuses outright
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("record has an empty identity")]
    EmptyIdentity,
}

/// Admitted records in discovery order, plus their identity index
///
/// Every record in `records` has exactly one entry in the index and the
/// index holds nothing else. Records are never mutated or removed.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    records: Vec<Record>,
    index: Deduplicator,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an accumulator by re-admitting `records` in order
    ///
    /// Returns the accumulator and how many records were dropped for an
    /// empty or repeated identity.
    pub fn rebuild(records: Vec<Record>) -> (Self, usize) {
        let mut accumulator = Self::new();
        let mut discarded = 0;

        for record in records {
            match accumulator.admit(record) {
                Ok(Admission::Admitted) => {}
                Ok(Admission::Duplicate) | Err(_) => discarded += 1,
            }
        }

        (accumulator, discarded)
    }

    /// Appends `record` unless its identity is empty or already admitted
    pub fn admit(&mut self, record: Record) -> Result<Admission, AdmissionError> {
        if record.identity.trim().is_empty() {
            return Err(AdmissionError::EmptyIdentity);
        }

        let admission = self.index.admit(&record.identity);
        if admission == Admission::Admitted {
            self.records.push(record);
        }
        Ok(admission)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.index.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The last `n` records (all of them when `n` exceeds the length)
    pub fn tail(&self, n: usize) -> &[Record] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }
}
