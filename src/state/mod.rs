//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: where a URL sits in the frontier (pending, in flight, visited, offline)
//! - `RunCounters`: attempt/success/offline tallies for a single crawl run

mod run_counters;
mod url_state;

// Re-export main types
pub use run_counters::RunCounters;
pub use url_state::UrlState;
