/// Phase definitions for the traversal state machine
///
/// This module defines every phase a sweep can be in and which moves
/// between them are allowed.
use std::fmt;

/// Represents the current phase of a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    // ===== Cycle Phases =====
    /// Nothing has happened yet
    Init,

    /// Bringing the session to the target page
    Navigating,

    /// Reading back the page the session is on
    Verifying,

    /// Reading the rows of the verified page
    Extracting,

    /// Turning rows into records and admitting them
    Accumulating,

    /// Deciding whether another page follows
    Advancing,

    // ===== Terminal Success State =====
    /// Every reachable page was processed
    Done,

    // ===== Failure Path =====
    /// Navigation could not be re-established
    Aborting,

    /// Terminal after `Aborting`
    Failed,

    // ===== Interrupt Path =====
    /// Cancellation was observed
    Interrupted,

    /// Terminal after `Interrupted`; only finalization remains
    Draining,
}

impl Phase {
    /// Returns true if no further traversal work follows this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Draining)
    }

    /// Checks whether moving from `self` to `next` is allowed
    ///
    /// Staying in the same phase is always allowed. Any non-terminal phase
    /// outside the failure and interrupt paths may move to `Aborting` or
    /// `Interrupted`.
    pub fn can_transition_to(&self, next: Phase) -> bool {
        if *self == next {
            return true;
        }

        if self.is_terminal() {
            return false;
        }

        match (self, next) {
            (Self::Aborting, Self::Failed) => true,
            (Self::Interrupted, Self::Draining) => true,
            (Self::Aborting, _) | (Self::Interrupted, _) => false,
            (_, Self::Aborting) | (_, Self::Interrupted) => true,

            (Self::Init, Self::Navigating) => true,
            (Self::Navigating, Self::Verifying) => true,
            (Self::Verifying, Self::Navigating | Self::Extracting | Self::Accumulating) => true,
            (Self::Extracting, Self::Accumulating | Self::Verifying | Self::Advancing) => true,
            (Self::Accumulating, Self::Verifying | Self::Navigating | Self::Advancing) => true,
            (Self::Advancing, Self::Navigating | Self::Done) => true,
            _ => false,
        }
    }

    /// Stable string form, used in logs and the run summary
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Navigating => "navigating",
            Self::Verifying => "verifying",
            Self::Extracting => "extracting",
            Self::Accumulating => "accumulating",
            Self::Advancing => "advancing",
            Self::Done => "done",
            Self::Aborting => "aborting",
            Self::Failed => "failed",
            Self::Interrupted => "interrupted",
            Self::Draining => "draining",
        }
    }

    /// Parses a phase from its string form
    pub fn from_str_name(s: &str) -> Option<Self> {
        Self::all_phases().into_iter().find(|p| p.as_str() == s)
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Init,
            Self::Navigating,
            Self::Verifying,
            Self::Extracting,
            Self::Accumulating,
            Self::Advancing,
            Self::Done,
            Self::Aborting,
            Self::Failed,
            Self::Interrupted,
            Self::Draining,
        ]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
