//! Dataset validation
//!
//! Checks an exported dataset for records without an ID or a Name and for
//! IDs that appear more than once.

use crate::record::Record;
use std::collections::HashMap;
use std::fmt;

/// What is wrong with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    MissingId,
    MissingName,
    DuplicateId,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingId => "missing ID",
            Self::MissingName => "missing Name",
            Self::DuplicateId => "duplicate ID",
        };
        f.write_str(text)
    }
}

/// One problem found in a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Position of the record in the dataset (0-based)
    pub index: usize,
    pub identity: String,
    pub kind: IssueKind,
}

/// Finds every record missing an ID or Name, and every repeated ID
///
/// The first occurrence of an ID is not reported; later ones are.
pub fn validate_records(records: &[Record]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let identity = record.identity.trim();
        let issue = |kind| ValidationIssue {
            index,
            identity: identity.to_string(),
            kind,
        };

        if identity.is_empty() {
            issues.push(issue(IssueKind::MissingId));
        } else if first_seen.insert(identity, index).is_some() {
            issues.push(issue(IssueKind::DuplicateId));
        }

        if record.name.trim().is_empty() {
            issues.push(issue(IssueKind::MissingName));
        }
    }

    issues
}

/// Prints validation results to stdout
pub fn print_validation(source: &str, total: usize, issues: &[ValidationIssue]) {
    println!("=== Validation of {} ===\n", source);

    if issues.is_empty() {
        println!("All {} records have a valid ID and Name.", total);
        return;
    }

    println!("Found {} issues in {} records:", issues.len(), total);
    for issue in issues {
        let shown = if issue.identity.is_empty() {
            "-"
        } else {
            issue.identity.as_str()
        };
        println!("  - row {}: {} (ID: {})", issue.index, issue.kind, shown);
    }
}
