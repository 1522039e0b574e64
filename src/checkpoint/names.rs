use chrono::{DateTime, Utc};
use std::fmt;

/// What a snapshot file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    /// Every record admitted so far; the count is part of the name
    Interval(usize),
    /// Only the records since the last interval boundary
    FinalChunk,
    /// Every record of a finished run
    Consolidated,
}

impl SnapshotKind {
    /// True for snapshots holding the whole accumulator
    pub fn is_full_image(&self) -> bool {
        matches!(self, Self::Interval(_) | Self::Consolidated)
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interval(count) => write!(f, "interval ({})", count),
            Self::FinalChunk => write!(f, "final chunk"),
            Self::Consolidated => write!(f, "consolidated"),
        }
    }
}

/// Descriptor of a snapshot written during this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointInfo {
    pub name: String,
    pub kind: SnapshotKind,
    pub records: usize,
    pub modified: DateTime<Utc>,
}

/// File naming scheme for every artifact of a sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNames {
    prefix: String,
}

impl SnapshotNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn interval(&self, count: usize) -> String {
        format!("{}_backup_{}.json", self.prefix, count)
    }

    pub fn final_chunk(&self) -> String {
        format!("{}_backup_final.json", self.prefix)
    }

    pub fn consolidated(&self) -> String {
        format!("{}_all.json", self.prefix)
    }

    pub fn tabular(&self) -> String {
        format!("{}_all.csv", self.prefix)
    }

    pub fn summary(&self) -> String {
        format!("{}_run_summary.md", self.prefix)
    }

    /// Recognizes snapshot names produced by this scheme
    pub fn classify(&self, name: &str) -> Option<SnapshotKind> {
        if name == self.final_chunk() {
            return Some(SnapshotKind::FinalChunk);
        }
        if name == self.consolidated() {
            return Some(SnapshotKind::Consolidated);
        }

        let count = name
            .strip_prefix(&self.prefix)?
            .strip_prefix("_backup_")?
            .strip_suffix(".json")?;

        if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        count.parse().ok().map(SnapshotKind::Interval)
    }
}
