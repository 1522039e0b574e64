//! Record model
//!
//! This module defines the records gathered by a sweep and the raw rows they
//! are built from:
//! - `RawRow`: positional cell texts of one listing row plus its links
//! - `RowDetail`: what the per-row detail view yielded
//! - `Record`: the validated, immutable entity kept in the accumulator
//!
//! Records serialize under the dataset's historical keys (`ID`, `Name`, ...)
//! so snapshots written by earlier tooling stay loadable.

use crate::config::{ColumnLayout, Field};
use crate::surface::Summarizer;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Whether a record is flagged as featured in the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Featured {
    Yes,
    #[default]
    No,
}

impl Featured {
    /// Interprets a cell value; anything not clearly affirmative is `No`
    pub fn from_cell(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "checked" | "on" | "1" => Self::Yes,
            _ => Self::No,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl fmt::Display for Featured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One admitted entity of the dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "ID")]
    pub identity: String,

    #[serde(rename = "Name", default)]
    pub name: String,

    #[serde(rename = "Category", default)]
    pub category: String,

    #[serde(rename = "Pictures", default)]
    pub pictures: String,

    #[serde(rename = "Price", default)]
    pub price: String,

    #[serde(rename = "Featured", default)]
    pub featured: Featured,

    #[serde(rename = "Status", default)]
    pub status: String,

    #[serde(rename = "Updated", default)]
    pub updated: String,

    #[serde(rename = "ImageLinks", default)]
    pub image_links: Vec<String>,

    #[serde(
        rename = "DescriptionSummary",
        default,
        deserialize_with = "empty_as_none"
    )]
    pub description_summary: Option<String>,
}

impl Record {
    /// Column names of the flattened form, in output order
    pub const FIELD_NAMES: [&'static str; 10] = [
        "ID",
        "Name",
        "Category",
        "Pictures",
        "Price",
        "Featured",
        "Status",
        "Updated",
        "ImageLinks",
        "DescriptionSummary",
    ];

    /// Separator used when image links are flattened into one cell
    pub const IMAGE_LINK_SEPARATOR: &'static str = " | ";

    /// Creates a record with only an identity; used by tests and tooling
    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            name: String::new(),
            category: String::new(),
            pictures: String::new(),
            price: String::new(),
            featured: Featured::No,
            status: String::new(),
            updated: String::new(),
            image_links: Vec::new(),
            description_summary: None,
        }
    }

    /// Checks that a row can become a record and returns its identity
    ///
    /// A row is structurally incomplete when it has fewer cells than the
    /// layout requires; a complete row still needs a non-empty identity.
    pub fn inspect_row<'r>(
        row: &'r RawRow,
        layout: &ColumnLayout,
        page: u32,
    ) -> Result<&'r str, RowIssue> {
        if !row.is_complete(layout) {
            return Err(RowIssue::Malformed {
                page,
                position: row.position,
                found: row.cells.len(),
                required: layout.required_cells,
            });
        }

        match row.named(layout, Field::Identity) {
            Some(identity) if !identity.is_empty() => Ok(identity),
            _ => Err(RowIssue::MissingIdentity {
                page,
                position: row.position,
            }),
        }
    }

    /// Builds a record from a row that passed `inspect_row`
    ///
    /// Media references are forced to https; the description markup, if
    /// any, goes through the summarizer and an empty summary is dropped.
    pub fn from_row(
        row: &RawRow,
        layout: &ColumnLayout,
        detail: Option<RowDetail>,
        summarizer: &dyn Summarizer,
    ) -> Self {
        let text = |field| row.named(layout, field).unwrap_or_default().to_string();
        let detail = detail.unwrap_or_default();

        let description_summary = detail
            .description_markup
            .as_deref()
            .map(|markup| summarizer.summarize(markup))
            .filter(|summary| !summary.is_empty());

        let identity = text(Field::Identity);
        let name = clean_name(&text(Field::Name), &identity);

        Self {
            identity,
            name,
            category: text(Field::Category),
            pictures: text(Field::Pictures),
            price: text(Field::Price),
            featured: Featured::from_cell(row.named(layout, Field::Featured).unwrap_or_default()),
            status: text(Field::Status),
            updated: text(Field::Updated),
            image_links: detail.media.iter().map(|link| force_https(link)).collect(),
            description_summary,
        }
    }

    /// Returns the record as flat cell values, aligned with `FIELD_NAMES`
    pub fn flat_values(&self) -> [String; 10] {
        [
            self.identity.clone(),
            self.name.clone(),
            self.category.clone(),
            self.pictures.clone(),
            self.price.clone(),
            self.featured.to_string(),
            self.status.clone(),
            self.updated.clone(),
            self.image_links.join(Self::IMAGE_LINK_SEPARATOR),
            self.description_summary.clone().unwrap_or_default(),
        ]
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Removes a leading copy of `identity` from a listing name
///
/// Listings often prefix the name with the item ID (`"M178 Pair of chairs"`).
/// The prefix may be quoted and followed by spaces, commas or dashes; it is
/// only removed when it ends on a word boundary.
pub fn clean_name(name: &str, identity: &str) -> String {
    let name = name.trim();
    if identity.is_empty() {
        return name.to_string();
    }

    let unquoted = name.strip_prefix('"').unwrap_or(name);
    let Some(rest) = unquoted.strip_prefix(identity) else {
        return name.to_string();
    };
    if rest.chars().next().is_some_and(char::is_alphanumeric) {
        return name.to_string();
    }

    rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .trim()
        .to_string()
}

/// Copies `records` with every name passed through `clean_name`
///
/// Used when re-exporting snapshots written before names were cleaned.
pub fn with_clean_names(records: &[Record]) -> Vec<Record> {
    records
        .iter()
        .map(|record| Record {
            name: clean_name(&record.name, &record.identity),
            ..record.clone()
        })
        .collect()
}

/// Rewrites a plain-http media reference to https
pub fn force_https(link: &str) -> String {
    match link.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => link.to_string(),
    }
}

/// Cell texts and links of one listing row, as read from the surface
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    /// 1-based position of the row on its page
    pub position: usize,
    pub cells: Vec<String>,
    /// Link to the row's detail view (description)
    pub detail_link: Option<String>,
    /// Link to the row's media view (images)
    pub media_link: Option<String>,
}

impl RawRow {
    pub fn new(position: usize, cells: Vec<String>) -> Self {
        Self {
            position,
            cells,
            detail_link: None,
            media_link: None,
        }
    }

    pub fn with_detail_link(mut self, link: impl Into<String>) -> Self {
        self.detail_link = Some(link.into());
        self
    }

    pub fn with_media_link(mut self, link: impl Into<String>) -> Self {
        self.media_link = Some(link.into());
        self
    }

    /// Trimmed text of the cell at `index`
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(|c| c.trim())
    }

    /// Trimmed text of the cell holding `field` under `layout`
    pub fn named(&self, layout: &ColumnLayout, field: Field) -> Option<&str> {
        self.cell(layout.index_of(field))
    }

    /// True when the row carries every required cell
    pub fn is_complete(&self, layout: &ColumnLayout) -> bool {
        self.cells.len() >= layout.required_cells
    }

    /// True when reading the row needs a secondary operation
    pub fn has_detail(&self) -> bool {
        self.detail_link.is_some() || self.media_link.is_some()
    }
}

/// What a row's detail view yielded
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowDetail {
    pub media: Vec<String>,
    pub description_markup: Option<String>,
}

/// Why a row was not turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowIssue {
    #[error("row {position} on page {page} has {found} cells, {required} required")]
    Malformed {
        page: u32,
        position: usize,
        found: usize,
        required: usize,
    },

    #[error("row {position} on page {page} has no identity")]
    MissingIdentity { page: u32, position: usize },
}
