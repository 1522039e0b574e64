//! page-sweep: a resumable sweeper for paginated, stateful listings
//!
//! This crate walks every page of a listing that can only be reached by
//! clicking through its pager, extracts each record exactly once, and keeps
//! durable checkpoints so an interrupted run can pick up where it left off.

pub mod checkpoint;
pub mod config;
pub mod output;
pub mod record;
pub mod state;
pub mod surface;
pub mod traversal;

use thiserror::Error;

/// Main error type for page-sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigation surface error: {0}")]
    Surface(#[from] surface::SurfaceError),

    #[error("Snapshot store error: {0}")]
    Store(#[from] checkpoint::StoreError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] checkpoint::PersistenceError),

    #[error(
        "Navigation exhausted: page {target} not reached after {attempts} attempts (last seen: {last_seen:?})"
    )]
    NavigationExhausted {
        target: u32,
        attempts: u32,
        last_seen: Option<u32>,
    },

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::Phase,
        to: state::Phase,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for page-sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{Featured, RawRow, Record, RowDetail};
pub use state::{Accumulator, Admission, Phase};
pub use traversal::{RunReport, TraversalController, TraversalOutcome};
