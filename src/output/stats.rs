//! Statistics of a gathered dataset
//!
//! This module summarizes the records of a snapshot: counts by status and
//! category, featured items, media coverage and description coverage.

use crate::record::{Featured, Record};
use std::collections::BTreeMap;

/// Dataset statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetStatistics {
    /// Number of records
    pub total_records: usize,

    /// Records flagged as featured
    pub featured: usize,

    /// Count of records per status value
    pub by_status: BTreeMap<String, usize>,

    /// Count of records per category
    pub by_category: BTreeMap<String, usize>,

    /// Records with at least one image link
    pub with_images: usize,

    /// Image links across all records
    pub total_images: usize,

    /// Records carrying a description summary
    pub with_summary: usize,
}

impl DatasetStatistics {
    /// Computes statistics over `records`
    ///
    /// Blank status or category values are counted under "(none)".
    pub fn from_records(records: &[Record]) -> Self {
        let mut stats = Self {
            total_records: records.len(),
            ..Self::default()
        };

        for record in records {
            if record.featured == Featured::Yes {
                stats.featured += 1;
            }
            if !record.image_links.is_empty() {
                stats.with_images += 1;
            }
            stats.total_images += record.image_links.len();
            if record.description_summary.is_some() {
                stats.with_summary += 1;
            }

            *stats.by_status.entry(label(&record.status)).or_insert(0) += 1;
            *stats.by_category.entry(label(&record.category)).or_insert(0) += 1;
        }

        stats
    }

    fn percentage(&self, count: usize) -> f64 {
        if self.total_records > 0 {
            (count as f64 / self.total_records as f64) * 100.0
        } else {
            0.0
        }
    }
}

fn label(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        "(none)".to_string()
    } else {
        value.to_string()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `source` - Name of the snapshot the records came from
/// * `stats` - The statistics to display
pub fn print_statistics(source: &str, stats: &DatasetStatistics) {
    println!("=== Dataset Statistics ({}) ===\n", source);

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!(
        "  Featured: {} ({:.1}%)",
        stats.featured,
        stats.percentage(stats.featured)
    );
    println!(
        "  With images: {} ({:.1}%), {} image links",
        stats.with_images,
        stats.percentage(stats.with_images),
        stats.total_images
    );
    println!(
        "  With description summary: {} ({:.1}%)",
        stats.with_summary,
        stats.percentage(stats.with_summary)
    );
    println!();

    println!("Records by Status:");
    let mut statuses: Vec<_> = stats.by_status.iter().collect();
    statuses.sort_by(|a, b| b.1.cmp(a.1));
    for (status, count) in statuses {
        println!("  {}: {} ({:.1}%)", status, count, stats.percentage(*count));
    }
    println!();

    println!("Records by Category ({}):", stats.by_category.len());
    let mut categories: Vec<_> = stats.by_category.iter().collect();
    categories.sort_by(|a, b| b.1.cmp(a.1));
    for (category, count) in categories.into_iter().take(20) {
        println!("  {}: {}", category, count);
    }
}
