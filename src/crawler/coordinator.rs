//! Crawl coordinator - one crawl run from seeds to summary
//!
//! This module contains the crawl loop that ties the pieces together:
//! - Popping URLs from a fresh frontier in FIFO order
//! - Fetching through the rotator's current session
//! - Archiving successful pages and offering the onion links they contain
//! - Rotating the proxy identity on the configured cadence
//!
//! A run moves `Idle -> Running -> Finished(outcome)` exactly once. Looping,
//! sleeping between runs and seed collection belong to the supervisor.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{SessionFactory, Transport};
use crate::crawler::frontier::Frontier;
use crate::crawler::identity::IdentityRotator;
use crate::crawler::parser::extract_onion_links;
use crate::state::RunCounters;
use crate::storage::PageStore;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// How a crawl run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The page budget was spent with URLs still pending
    Completed,
    /// The pending queue ran dry
    Exhausted,
    /// A shutdown was requested between iterations
    Interrupted,
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Lifecycle of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    Running,
    Finished(CrawlOutcome),
}

/// End-of-run report
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    pub outcome: CrawlOutcome,
    pub attempts: u64,
    pub fetched: u64,
    pub saved: u64,
    pub visited: usize,
    pub offline: usize,
    pub pending: usize,
    /// Successful identity rotations during the run
    pub rotations: u64,
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Fraction of attempts that produced a saved page, in percent
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        (self.saved as f64 / self.attempts as f64) * 100.0
    }
}

/// Drives a single crawl run
pub struct Coordinator<'a, F: SessionFactory, S: PageStore> {
    config: &'a CrawlerConfig,
    rotator: &'a mut IdentityRotator<F>,
    store: &'a mut S,
    frontier: Frontier,
    counters: RunCounters,
    phase: EnginePhase,
    shutdown: Option<watch::Receiver<bool>>,
    rotations_at_start: u64,
}

impl<'a, F: SessionFactory, S: PageStore> Coordinator<'a, F, S> {
    /// Creates a coordinator whose frontier holds the given seeds
    ///
    /// # Arguments
    ///
    /// * `config` - Crawl budget, timeouts and delays
    /// * `seeds` - Initial URLs, deduplicated in iteration order
    /// * `rotator` - Owner of the live transport session
    /// * `store` - Where fetched pages are archived
    pub fn new<I, U>(
        config: &'a CrawlerConfig,
        seeds: I,
        rotator: &'a mut IdentityRotator<F>,
        store: &'a mut S,
    ) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        let rotations_at_start = rotator.rotations();
        Self {
            config,
            rotator,
            store,
            frontier: Frontier::seed(seeds),
            counters: RunCounters::new(),
            phase: EnginePhase::Idle,
            shutdown: None,
            rotations_at_start,
        }
    }

    /// Stops the run at the next iteration boundary once `shutdown` reads true
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Runs the crawl loop to completion
    ///
    /// Per-URL failures never escape: they become offline transitions and a
    /// log line. Calling `run` again after the run finished returns the same
    /// summary without fetching anything.
    pub async fn run(&mut self) -> CrawlSummary {
        let started = Instant::now();

        if let EnginePhase::Finished(outcome) = self.phase {
            tracing::warn!("Crawl run already finished ({}), not restarting", outcome);
            return self.summarize(outcome, Duration::ZERO);
        }

        self.phase = EnginePhase::Running;
        tracing::info!(
            "Starting crawl run: {} seeds, budget {} pages",
            self.frontier.pending_len(),
            self.config.max_pages
        );

        let outcome = loop {
            if self.shutdown_requested() {
                tracing::info!("Shutdown requested, stopping crawl run");
                break CrawlOutcome::Interrupted;
            }
            if self.frontier.is_empty() {
                break CrawlOutcome::Exhausted;
            }
            if self.counters.attempts >= self.config.max_pages {
                break CrawlOutcome::Completed;
            }

            let Some(url) = self.frontier.next() else {
                break CrawlOutcome::Exhausted;
            };

            self.process_url(&url).await;
            self.rotator.maybe_rotate(self.counters.attempts).await;

            if self.counters.attempts % 10 == 0 {
                tracing::info!(
                    "Progress: {} attempts, {} saved, {} offline, {} pending",
                    self.counters.attempts,
                    self.counters.saved,
                    self.frontier.offline_len(),
                    self.frontier.pending_len()
                );
            }

            let delay = self.config.politeness_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        };

        self.phase = EnginePhase::Finished(outcome);
        let summary = self.summarize(outcome, started.elapsed());
        tracing::info!(
            "Crawl run {}: {} attempts, {} saved, {} offline, {} pending in {:?}",
            outcome,
            summary.attempts,
            summary.saved,
            summary.offline,
            summary.pending,
            summary.elapsed
        );
        summary
    }

    /// Fetches one URL and records the result
    async fn process_url(&mut self, url: &str) {
        let attempt = self.counters.record_attempt();
        tracing::debug!("Fetching {} (attempt {})", url, attempt);

        let session = self.rotator.session();
        match session.fetch(url, self.config.fetch_timeout()).await {
            Ok(response) if response.is_ok() => self.archive(url, &response.body),
            Ok(response) => {
                tracing::warn!("Offline: {} returned HTTP {}", url, response.status);
                self.frontier.mark_offline(url);
            }
            Err(e) => {
                tracing::warn!("Offline: {}", e);
                self.frontier.mark_offline(url);
            }
        }
    }

    /// Marks a fetched page visited, queues its links and saves it
    fn archive(&mut self, url: &str, body: &str) {
        self.counters.record_fetched();
        self.frontier.mark_visited(url);

        let mut discovered = 0;
        for link in extract_onion_links(body) {
            if self.frontier.offer(link) {
                discovered += 1;
            }
        }

        match self.store.save(url, body) {
            Ok(_) => {
                self.counters.record_saved();
                tracing::info!("Archived {} ({} new links)", url, discovered);
            }
            Err(e) => {
                tracing::error!("Failed to save {}: {}", url, e);
                self.frontier.mark_offline(url);
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }

    fn summarize(&self, outcome: CrawlOutcome, elapsed: Duration) -> CrawlSummary {
        CrawlSummary {
            outcome,
            attempts: self.counters.attempts,
            fetched: self.counters.fetched,
            saved: self.counters.saved,
            visited: self.frontier.visited_len(),
            offline: self.frontier.offline_len(),
            pending: self.frontier.pending_len(),
            rotations: self.rotator.rotations() - self.rotations_at_start,
            elapsed,
        }
    }
}

/// Runs one crawl from a fresh frontier and fresh counters
///
/// # Arguments
///
/// * `config` - Crawl budget, timeouts and delays
/// * `seeds` - Initial URLs for the frontier
/// * `rotator` - Owner of the live transport session
/// * `store` - Where fetched pages are archived
///
/// # Returns
///
/// The run summary. A run never fails as a whole.
///
/// # Example
///
/// ```no_run
/// use onion_archive::config::default_config;
/// use onion_archive::crawler::{run_once, HttpSessionFactory, IdentityRotator};
/// use onion_archive::storage::SqlitePageStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = default_config()?;
/// let factory = HttpSessionFactory::new(config.transport.clone());
/// let mut rotator = IdentityRotator::new(factory, &config.identity)?;
/// let mut store = SqlitePageStore::open(&config.storage)?;
///
/// let summary = run_once(
///     &config.crawler,
///     config.seeds.static_seeds.clone(),
///     &mut rotator,
///     &mut store,
/// )
/// .await;
/// println!("{} pages saved", summary.saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_once<F, S, I, U>(
    config: &CrawlerConfig,
    seeds: I,
    rotator: &mut IdentityRotator<F>,
    store: &mut S,
) -> CrawlSummary
where
    F: SessionFactory,
    S: PageStore,
    I: IntoIterator<Item = U>,
    U: Into<String>,
{
    Coordinator::new(config, seeds, rotator, store).run().await
}
