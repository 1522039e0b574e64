use crate::state::Phase;
use crate::SweepError;

/// Cursor and phase of a running traversal
///
/// Owned by the controller; the phase only changes through `enter`.
#[derive(Debug, Clone)]
pub struct TraversalState {
    phase: Phase,

    /// Page the controller is currently trying to be on
    pub target: u32,

    /// Pages whose rows were processed
    pub pages_visited: u32,

    /// Failed attempts since the last successful verification
    pub consecutive_failures: u32,
}

impl TraversalState {
    pub fn new(start_page: u32) -> Self {
        Self {
            phase: Phase::Init,
            target: start_page,
            pages_visited: 0,
            consecutive_failures: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once the traversal reached a terminal phase
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Moves to `next`, rejecting transitions the phase table forbids
    pub fn enter(&mut self, next: Phase) -> Result<(), SweepError> {
        if !self.phase.can_transition_to(next) {
            return Err(SweepError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        if self.phase != next {
            tracing::trace!(from = %self.phase, to = %next, page = self.target, "phase");
        }
        self.phase = next;
        Ok(())
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
    }

    pub fn reset_failures(&mut self) {
        self.consecutive_failures = 0;
    }
}
