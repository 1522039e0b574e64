//! Markdown run summary
//!
//! This module renders a finished run's report as a human-readable markdown
//! document: outcome, timing, counters, checkpoints and persistence failures.

use crate::output::OutputResult;
use crate::traversal::RunReport;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of `report` to `output_path`
///
/// # Arguments
///
/// * `report` - The finished run's report
/// * `config_hash` - Hash of the configuration the run used
/// * `output_path` - Path where the markdown file should be written
pub fn write_run_summary(report: &RunReport, config_hash: &str, output_path: &Path) -> OutputResult<()> {
    let markdown = format_run_summary(report, config_hash);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run report as markdown
pub fn format_run_summary(report: &RunReport, config_hash: &str) -> String {
    let mut md = String::new();

    md.push_str("# page-sweep Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Outcome**: {}\n", report.outcome));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    let seconds = report.duration().num_seconds();
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        seconds,
        seconds as f64 / 60.0
    ));
    md.push_str(&format!("- **Start Page**: {}\n", report.start_page));
    match report.last_page {
        Some(page) => md.push_str(&format!("- **Last Page Processed**: {}\n", page)),
        None => md.push_str("- **Last Page Processed**: none\n"),
    }
    md.push_str(&format!("- **Config Hash**: {}\n\n", config_hash));

    // Records
    md.push_str("## Records\n\n");
    md.push_str(&format!("- **Recovered From Earlier Runs**: {}\n", report.recovered));
    md.push_str(&format!("- **Admitted This Run**: {}\n", report.stats.admitted));
    md.push_str(&format!("- **Total In Dataset**: {}\n\n", report.total_records));

    // Counters
    let stats = &report.stats;
    md.push_str("## Traversal Counters\n\n");
    md.push_str("| Counter | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Pages Visited | {} |\n", stats.pages_visited));
    md.push_str(&format!("| Duplicate IDs | {} |\n", stats.duplicates));
    md.push_str(&format!("| Malformed Rows | {} |\n", stats.malformed_rows));
    md.push_str(&format!("| Rows Without ID | {} |\n", stats.missing_identity));
    md.push_str(&format!("| Detail Views Failed | {} |\n", stats.detail_failures));
    md.push_str(&format!("| Pages Unreadable | {} |\n", stats.extraction_failures));
    md.push_str(&format!("| Navigation Mismatches | {} |\n", stats.nav_mismatches));
    md.push_str(&format!("| Drift Corrections | {} |\n\n", stats.drift_corrections));

    // Checkpoints
    if !report.checkpoints.is_empty() {
        md.push_str("## Snapshots Written\n\n");
        md.push_str("| File | Kind | Records | Written |\n");
        md.push_str("|------|------|---------|---------|\n");
        for info in &report.checkpoints {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                info.name,
                info.kind,
                info.records,
                info.modified.format("%Y-%m-%d %H:%M:%S")
            ));
        }
        md.push('\n');
    }

    // Persistence failures
    if !report.persistence_failures.is_empty() {
        md.push_str("## Persistence Failures\n\n");
        for failure in &report.persistence_failures {
            md.push_str(&format!("- {}\n", failure));
        }
        md.push('\n');
    }

    md
}
