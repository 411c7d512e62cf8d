//! Output module for crawl summaries and store reports
//!
//! This module handles:
//! - Printing the end-of-run summary after every crawl cycle
//! - Loading and printing the read-only store report for `--stats`

pub mod stats;
mod summary;

pub use stats::{load_store_report, print_store_report, StoreReport};
pub use summary::{print_run_summary, render_run_summary};
