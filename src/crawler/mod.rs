//! Crawler module for hidden-service discovery and archiving
//!
//! This module contains the core crawling logic, including:
//! - The per-run frontier of pending, visited and offline URLs
//! - HTTP transport over the SOCKS proxy and identity rotation
//! - Onion link extraction and seed collection
//! - Single-run coordination and the run-forever supervisor

mod coordinator;
mod fetcher;
mod frontier;
mod identity;
mod parser;
mod seeds;
mod supervisor;

pub use coordinator::{run_once, Coordinator, CrawlOutcome, CrawlSummary, EnginePhase};
pub use fetcher::{
    build_http_client, session_proxy_url, FetchError, FetchResponse, HttpSession,
    HttpSessionFactory, SessionFactory, Transport,
};
pub use frontier::Frontier;
pub use identity::IdentityRotator;
pub use parser::{extract_anchor_onion_links, extract_onion_links};
pub use seeds::SeedProvider;
pub use supervisor::{ctrl_c_shutdown, Supervisor};

use crate::config::Config;
use crate::storage::SqlitePageStore;
use crate::ArchiveError;

/// Runs the archiver with the production transport and store
///
/// This is the main entry point for crawling. It will:
/// 1. Open the page store
/// 2. Connect the first proxy session
/// 3. Loop crawl cycles until `max_cycles` or Ctrl-C
///
/// # Arguments
///
/// * `config` - The archiver configuration
/// * `max_cycles` - Cycle limit; `None` runs until interrupted
///
/// # Returns
///
/// * `Ok(u64)` - Number of cycles started
/// * `Err(ArchiveError)` - The store or the first session could not be opened
pub async fn crawl(config: Config, max_cycles: Option<u64>) -> Result<u64, ArchiveError> {
    let store = SqlitePageStore::open(&config.storage)?;
    let rotator = IdentityRotator::new(
        HttpSessionFactory::new(config.transport.clone()),
        &config.identity,
    )?;
    let clearnet = HttpSession::direct(&config.transport)?;

    let mut supervisor =
        Supervisor::new(config, rotator, store, Box::new(clearnet)).with_max_cycles(max_cycles);
    Ok(supervisor.run(ctrl_c_shutdown()).await)
}
