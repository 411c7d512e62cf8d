//! End-of-run summary printing

use crate::crawler::CrawlSummary;
use std::fmt::Write;

/// Renders a run summary as plain text
pub fn render_run_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Run Summary ===\n");
    let _ = writeln!(out, "Outcome: {}", summary.outcome);
    let _ = writeln!(out, "Duration: {:.1}s", summary.elapsed.as_secs_f64());
    let _ = writeln!(out);
    let _ = writeln!(out, "Pages:");
    let _ = writeln!(out, "  Attempted: {}", summary.attempts);
    let _ = writeln!(out, "  Visited: {}", summary.visited);
    let _ = writeln!(out, "  Saved: {}", summary.saved);
    let _ = writeln!(out, "  Offline: {}", summary.offline);
    let _ = writeln!(out, "  Still pending: {}", summary.pending);
    let _ = writeln!(out);
    let _ = writeln!(out, "Identity rotations: {}", summary.rotations);
    let _ = writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} attempts saved)",
        summary.success_rate(),
        summary.saved,
        summary.attempts
    );

    out
}

/// Prints a run summary to stdout
pub fn print_run_summary(summary: &CrawlSummary) {
    print!("{}", render_run_summary(summary));
}
