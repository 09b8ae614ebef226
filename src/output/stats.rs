//! Statistics rendering for a finished or running crawl
//!
//! This module turns a [`CrawlStatus`] snapshot into the human-readable
//! summary printed by the CLI.

use crate::crawler::CrawlStatus;
use std::fmt::Write;

/// Formats statistics as a multi-line report
pub fn format_statistics(status: &CrawlStatus) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Run:");
    let _ = writeln!(out, "  State: {}", status.state);
    let _ = writeln!(
        out,
        "  Started: {}",
        status.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "  Elapsed: {:.1}s", status.elapsed.as_secs_f64());
    let _ = writeln!(out);

    let _ = writeln!(out, "URLs:");
    let _ = writeln!(out, "  Discovered: {}", status.discovered);
    let _ = writeln!(out, "  Fetched: {}", status.fetched);
    let _ = writeln!(out, "  Not parsed (filtered): {}", status.filtered);
    let _ = writeln!(out, "  Fetch errors: {}", status.errors);
    let _ = writeln!(out, "  Pending in frontier: {}", status.pending);
    let _ = writeln!(out);

    let _ = writeln!(out, "Rejected links:");
    let _ = writeln!(out, "  Out of scope: {}", status.out_of_scope);
    let _ = writeln!(out, "  Excluded by skip pattern: {}", status.excluded);
    let _ = writeln!(out, "  Beyond max depth: {}", status.depth_limited);
    let _ = writeln!(out);

    // Fetch attempts are fetched + errors
    let attempts = status.fetched + status.errors;
    let success_rate = if attempts > 0 {
        (status.fetched as f64 / attempts as f64) * 100.0
    } else {
        0.0
    };
    let _ = write!(
        out,
        "Success Rate: {:.1}% ({} / {} fetches succeeded)",
        success_rate, status.fetched, attempts
    );

    out
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `status` - The status snapshot to display
pub fn print_statistics(status: &CrawlStatus) {
    println!("{}", format_statistics(status));
}
