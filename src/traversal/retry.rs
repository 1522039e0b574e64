use crate::config::TraversalConfig;
use std::time::Duration;

/// Kinds of operation with their own attempt ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Reaching or re-establishing a page; exhaustion is fatal
    Navigate,
    /// Detail views and row extraction; exhaustion skips the item
    Secondary,
}

/// Bounded retry policy: a fixed ceiling per operation kind and one fixed delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    navigate_ceiling: u32,
    secondary_ceiling: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(navigate_ceiling: u32, secondary_ceiling: u32, delay: Duration) -> Self {
        Self {
            navigate_ceiling: navigate_ceiling.max(1),
            secondary_ceiling: secondary_ceiling.max(1),
            delay,
        }
    }

    pub fn from_config(config: &TraversalConfig) -> Self {
        Self::new(
            config.max_nav_retries,
            config.max_detail_retries,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    /// Total attempts allowed for `kind`
    pub fn ceiling(&self, kind: OperationKind) -> u32 {
        match kind {
            OperationKind::Navigate => self.navigate_ceiling,
            OperationKind::Secondary => self.secondary_ceiling,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts a fresh attempt budget for one operation
    pub fn attempts(&self, kind: OperationKind) -> Attempts {
        Attempts {
            made: 0,
            ceiling: self.ceiling(kind),
            delay: self.delay,
        }
    }
}

/// Attempt budget of one operation
///
/// ```
/// # use page_sweep::traversal::{OperationKind, RetryPolicy};
/// # use std::time::Duration;
/// let policy = RetryPolicy::new(3, 2, Duration::ZERO);
/// let mut attempts = policy.attempts(OperationKind::Navigate);
/// let mut tried = Vec::new();
/// while let Some(n) = attempts.next_attempt() {
///     tried.push(n);
/// }
/// assert_eq!(tried, vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct Attempts {
    made: u32,
    ceiling: u32,
    delay: Duration,
}

impl Attempts {
    /// Claims the next attempt, numbered from 1; `None` once the budget is spent
    pub fn next_attempt(&mut self) -> Option<u32> {
        if self.made >= self.ceiling {
            return None;
        }
        self.made += 1;
        Some(self.made)
    }

    pub fn made(&self) -> u32 {
        self.made
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn exhausted(&self) -> bool {
        self.made >= self.ceiling
    }

    /// Sleeps the fixed delay, unless no attempt is left to wait for
    pub async fn pause(&self) {
        if !self.exhausted() && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
