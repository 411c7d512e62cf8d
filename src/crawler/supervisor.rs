//! Run-forever loop around single crawl runs
//!
//! Each cycle collects seeds, runs one crawl, prints its summary and sleeps
//! for the configured interval. A shutdown request ends the loop at the next
//! iteration boundary or during the sleep, never in the middle of a fetch.

use crate::config::Config;
use crate::crawler::coordinator::{CrawlOutcome, CrawlSummary, Coordinator};
use crate::crawler::fetcher::{SessionFactory, Transport};
use crate::crawler::identity::IdentityRotator;
use crate::crawler::seeds::SeedProvider;
use crate::output::print_run_summary;
use crate::storage::PageStore;
use tokio::sync::watch;

/// Owns the long-lived pieces and repeats crawl runs
pub struct Supervisor<F: SessionFactory, S: PageStore> {
    config: Config,
    rotator: IdentityRotator<F>,
    store: S,
    seeds: SeedProvider,
    clearnet: Box<dyn Transport>,
    max_cycles: Option<u64>,
}

impl<F: SessionFactory, S: PageStore> Supervisor<F, S> {
    /// Creates a supervisor
    ///
    /// # Arguments
    ///
    /// * `config` - Full configuration
    /// * `rotator` - Identity rotator for onion traffic
    /// * `store` - Page store, closed when the loop ends
    /// * `clearnet` - Direct transport for the search engine
    pub fn new(
        config: Config,
        rotator: IdentityRotator<F>,
        store: S,
        clearnet: Box<dyn Transport>,
    ) -> Self {
        let seeds = SeedProvider::new(config.seeds.clone(), config.crawler.fetch_timeout());
        Self {
            config,
            rotator,
            store,
            seeds,
            clearnet,
            max_cycles: None,
        }
    }

    /// Limits the number of cycles; `None` loops until shutdown
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rotator(&self) -> &IdentityRotator<F> {
        &self.rotator
    }

    /// Runs cycles until the cycle limit or a shutdown request
    ///
    /// Returns the number of cycles started. The store is closed on return.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut cycles = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            cycles += 1;
            tracing::info!("Starting crawl cycle {}", cycles);
            let summary = self.run_cycle(&shutdown).await;

            if summary.outcome == CrawlOutcome::Interrupted {
                break;
            }
            if self.max_cycles.is_some_and(|max| cycles >= max) {
                tracing::info!("Reached cycle limit of {}", cycles);
                break;
            }

            let interval = self.config.crawler.cycle_interval();
            tracing::info!("Next crawl cycle in {:?}", interval);
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = wait_for_shutdown(&mut shutdown) => {
                    tracing::info!("Shutdown requested while idle");
                    break;
                }
            }
        }

        self.store.close();
        cycles
    }

    /// Collects seeds, runs one crawl and prints its summary
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> CrawlSummary {
        let onion = self.rotator.session();
        let seeds = self.seeds.get_seeds(self.clearnet.as_ref(), onion.as_ref()).await;
        drop(onion);

        let summary = Coordinator::new(
            &self.config.crawler,
            seeds,
            &mut self.rotator,
            &mut self.store,
        )
        .with_shutdown(shutdown.clone())
        .run()
        .await;

        print_run_summary(&summary);
        let stats = self.store.stats();
        tracing::info!("Page store: {} pages ({})", stats.total_pages, stats.health);
        summary
    }
}

/// Creates a shutdown channel that flips to true on Ctrl-C
pub fn ctrl_c_shutdown() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl-C, stopping after the current fetch");
                let _ = tx.send(true);
            }
            Err(e) => {
                tracing::warn!("Could not listen for Ctrl-C: {}", e);
                // Keep the sender alive so receivers never see a closed channel
                std::future::pending::<()>().await;
            }
        }
    });
    rx
}

/// Resolves once the channel reads true
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            if *rx.borrow() {
                return;
            }
            std::future::pending::<()>().await;
        }
    }
}
