//! Onion-Archive: a checkpointed hidden-service crawler
//!
//! This crate discovers onion pages through an anonymizing SOCKS proxy, keeps a
//! deduplicated crawl frontier, rotates the proxy identity on a fixed cadence and
//! archives every fetched page into a crash-safe SQLite store with rolling
//! checkpoint backups.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Onion-Archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Transport error: {0}")]
    Fetch(#[from] crawler::FetchError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_once, CrawlOutcome, CrawlSummary, Frontier};
pub use state::UrlState;
pub use storage::{PageStore, SqlitePageStore};
