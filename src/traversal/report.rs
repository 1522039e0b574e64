use crate::checkpoint::{CheckpointInfo, PersistenceError};
use crate::SweepError;
use chrono::{DateTime, Utc};
use std::fmt;

/// How a traversal ended
#[derive(Debug)]
pub enum TraversalOutcome {
    /// The surface reported no further page, or the end page was processed
    Completed,
    /// Cancellation was observed; finalization still ran
    Interrupted,
    /// A fatal error stopped the traversal; finalization still ran
    Failed(SweepError),
}

impl TraversalOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Failed(_) => 1,
            Self::Interrupted => 130,
        }
    }
}

impl fmt::Display for TraversalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(e) => write!(f, "failed: {}", e),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Counters gathered while traversing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub pages_visited: u32,
    pub admitted: usize,
    pub duplicates: usize,
    pub malformed_rows: usize,
    pub missing_identity: usize,
    pub detail_failures: usize,
    pub extraction_failures: usize,
    pub nav_mismatches: usize,
    pub drift_corrections: usize,
}

/// Everything a finished run has to say about itself
#[derive(Debug)]
pub struct RunReport {
    pub outcome: TraversalOutcome,
    pub stats: RunStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub start_page: u32,
    /// Last page whose rows were processed
    pub last_page: Option<u32>,
    /// Records carried over from an earlier run
    pub recovered: usize,
    /// Records in the consolidated dataset
    pub total_records: usize,
    pub checkpoints: Vec<CheckpointInfo>,
    pub persistence_failures: Vec<PersistenceError>,
}

impl RunReport {
    pub fn exit_code(&self) -> u8 {
        self.outcome.exit_code()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
