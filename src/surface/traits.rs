//! Surface traits and error types
//!
//! The traversal engine only talks to the navigation surface through these
//! traits. A surface holds the session's ambient "current page"; every read
//! of it is an explicit call.

use crate::record::{RawRow, RowDetail};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while driving the navigation surface
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("No document loaded in the session")]
    NoDocument,

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Invalid link '{href}': {source}")]
    Link {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type for surface operations
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Page number the session is actually on; `None` when it is not on a listing page
pub type ActualPage = Option<u32>;

/// Moves the session between listing pages and reports where it is
#[async_trait]
pub trait PageNavigator: Send {
    /// Tries to bring the session to `page` and reports where it landed
    ///
    /// A return value different from `page` is not an error; the caller
    /// verifies and retries.
    async fn go_to(&mut self, page: u32) -> SurfaceResult<ActualPage>;

    /// Reads back the page the session is on, without moving it
    async fn current_page(&mut self) -> SurfaceResult<ActualPage>;

    /// Page numbers reachable by a direct link from the current pager block
    async fn visible_pages(&mut self) -> SurfaceResult<Vec<u32>>;

    /// Follows the pager's "next block" control
    ///
    /// Returns false when there is no such control.
    async fn advance_block(&mut self) -> SurfaceResult<bool>;

    /// Whether any page follows the current one
    async fn has_next(&mut self) -> SurfaceResult<bool>;
}

/// Reads rows of the current page and opens per-row detail views
#[async_trait]
pub trait RowExtractor: Send {
    /// Raw rows of the page the session is currently on, in display order
    async fn rows_of_current_page(&mut self) -> SurfaceResult<Vec<RawRow>>;

    /// Opens the detail view of `row`
    ///
    /// This may leave the session away from the listing page. `None` means
    /// the row has no detail view.
    async fn open_detail(&mut self, row: &RawRow) -> SurfaceResult<Option<RowDetail>>;
}

/// A full navigation surface
pub trait Surface: PageNavigator + RowExtractor {}

impl<T: PageNavigator + RowExtractor> Surface for T {}
