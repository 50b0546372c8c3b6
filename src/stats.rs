//! Processing statistics report.
//!
//! Renders a [`ProcessingStatistics`] summary as the plain-text entry that
//! ships inside every output archive, so whoever opens the zip can see how
//! many contacts survived and how they were split.

use chrono::SecondsFormat;

use crate::models::ProcessingStatistics;

/// Archive entry name of the statistics report.
pub const REPORT_FILE_NAME: &str = "estatisticas.txt";

/// Renders the report as UTF-8 text, one `label: value` per line.
pub fn render_report(stats: &ProcessingStatistics) -> String {
    let mut out = String::new();
    out.push_str("Phone List: Processing Statistics\n");
    out.push_str("=================================\n\n");

    let chunk_size = match stats.chunk_size {
        Some(size) => size.to_string(),
        None => "n/a (grouped)".to_string(),
    };

    let lines: [(&str, String); 9] = [
        ("Total contacts", stats.total_contacts.to_string()),
        ("Generated files", stats.file_count.to_string()),
        ("Chunk size", chunk_size),
        ("Download type", stats.download_type.to_string()),
        ("Duplicates removed", yes_no(stats.duplicates_removed).to_string()),
        ("Rows read", stats.rows_read.to_string()),
        ("Rows discarded", stats.rows_discarded.to_string()),
        ("Duplicate rows skipped", stats.duplicates_skipped.to_string()),
        (
            "Processed at",
            stats
                .processed_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    ];

    for (label, value) in lines {
        out.push_str(&format!("  {:<24} {}\n", format!("{}:", label), value));
    }
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
