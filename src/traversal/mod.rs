//! Traversal engine
//!
//! This module contains the controller that walks the listing page by page,
//! the bounded retry primitive it uses for every surface operation, and the
//! report it returns.

mod controller;
mod report;
mod retry;

pub use controller::{ControllerSettings, TraversalController, Verification};
pub use report::{RunReport, RunStats, TraversalOutcome};
pub use retry::{Attempts, OperationKind, RetryPolicy};
