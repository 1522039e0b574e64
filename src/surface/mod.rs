//! Navigation surface
//!
//! The traversal engine reaches the data only through `PageNavigator` and
//! `RowExtractor`. `HtmlSession` is the shipped implementation; tests drive
//! the engine with scripted surfaces.

mod html;
mod summarizer;
mod traits;

pub use html::HtmlSession;
pub use summarizer::{PlainTextSummarizer, Summarizer};
pub use traits::{ActualPage, PageNavigator, RowExtractor, Surface, SurfaceError, SurfaceResult};
