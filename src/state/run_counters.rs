//! Per-run counters used for progress logging and the end-of-run summary.

/// Counters for one crawl run; reset by constructing a new value each run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Fetch attempts made, successful or not
    pub attempts: u64,

    /// Fetches that returned HTTP 200
    pub fetched: u64,

    /// Pages committed to the page store
    pub saved: u64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&mut self) -> u64 {
        self.attempts += 1;
        self.attempts
    }

    pub fn record_fetched(&mut self) {
        self.fetched += 1;
    }

    pub fn record_saved(&mut self) {
        self.saved += 1;
    }
}
