//! Seed collection for each crawl run
//!
//! Seeds come from three places:
//! - the static list in the configuration (always included)
//! - search engine result pages, fetched over the clearnet transport
//! - directory pages; `.onion` hosts over the proxy transport, anything
//!   else over the clearnet transport
//!
//! Collection never fails. A source that errors is logged and skipped, so in
//! the worst case the run starts from the static list alone.

use crate::config::SeedConfig;
use crate::crawler::fetcher::Transport;
use crate::crawler::parser::{extract_anchor_onion_links, extract_onion_links};
use std::collections::BTreeSet;
use std::time::Duration;
use url::{form_urlencoded, Url};

/// Gathers the deduplicated seed set for a crawl run
#[derive(Debug, Clone)]
pub struct SeedProvider {
    config: SeedConfig,
    timeout: Duration,
}

impl SeedProvider {
    pub fn new(config: SeedConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    /// Returns the static seeds plus whatever the dynamic sources yield
    ///
    /// # Arguments
    ///
    /// * `clearnet` - Transport used for the search engine and clearnet directories
    /// * `onion` - Transport used for onion directories
    pub async fn get_seeds<C, O>(&self, clearnet: &C, onion: &O) -> BTreeSet<String>
    where
        C: Transport + ?Sized,
        O: Transport + ?Sized,
    {
        let mut seeds: BTreeSet<String> = self.config.static_seeds.iter().cloned().collect();
        let static_count = seeds.len();

        if self.config.search_enabled {
            seeds.extend(self.search_seeds(clearnet).await);
        }
        seeds.extend(self.directory_seeds(clearnet, onion).await);

        tracing::info!(
            "Collected {} seeds ({} static, {} discovered)",
            seeds.len(),
            static_count,
            seeds.len() - static_count
        );
        seeds
    }

    /// Scrapes onion links from the search engine for every configured query
    pub async fn search_seeds<T: Transport + ?Sized>(&self, transport: &T) -> BTreeSet<String> {
        let mut seeds = BTreeSet::new();

        for query in &self.config.search_queries {
            let url = search_url(&self.config.search_url, query);
            match transport.fetch(&url, self.timeout).await {
                Ok(response) if response.is_ok() => {
                    let found = extract_anchor_onion_links(&response.body);
                    tracing::debug!("Search '{}' yielded {} onion links", query, found.len());
                    seeds.extend(found);
                }
                Ok(response) => {
                    tracing::debug!("Search '{}' returned HTTP {}", query, response.status);
                }
                Err(e) => {
                    tracing::warn!("Search '{}' failed: {}", query, e);
                }
            }
        }

        seeds
    }

    /// Scrapes onion links from the configured directory pages
    pub async fn directory_seeds<C, O>(&self, clearnet: &C, onion: &O) -> BTreeSet<String>
    where
        C: Transport + ?Sized,
        O: Transport + ?Sized,
    {
        let mut seeds = BTreeSet::new();

        for directory in &self.config.directories {
            let result = if is_onion_host(directory) {
                onion.fetch(directory, self.timeout).await
            } else {
                clearnet.fetch(directory, self.timeout).await
            };
            match result {
                Ok(response) if response.is_ok() => {
                    seeds.extend(extract_onion_links(&response.body));
                }
                Ok(response) => {
                    tracing::debug!("Directory {} returned HTTP {}", directory, response.status);
                }
                Err(e) => {
                    tracing::warn!("Directory {} failed: {}", directory, e);
                }
            }
        }

        seeds
    }
}

fn is_onion_host(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.ends_with(".onion")))
        .unwrap_or(false)
}

/// Appends a URL-encoded query to the search endpoint
fn search_url(base: &str, query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("{}{}", base, encoded)
}
