use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Onion-Archive
///
/// Every section and key is optional; missing values take the documented
/// defaults, so an empty file (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub identity: IdentityConfig,
    pub transport: TransportConfig,
    pub storage: StorageConfig,
    pub seeds: SeedConfig,
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of fetch attempts per run
    pub max_pages: u64,

    /// Pause between consecutive fetch attempts (milliseconds)
    pub politeness_delay_ms: u64,

    /// Per-request network timeout (seconds)
    pub fetch_timeout_secs: u64,

    /// Sleep between two crawl runs when running as a long-lived process (seconds)
    pub cycle_interval_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 200,
            politeness_delay_ms: 1000,
            fetch_timeout_secs: 30,
            cycle_interval_secs: 300,
        }
    }
}

impl CrawlerConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }
}

/// Proxy identity rotation
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IdentityConfig {
    /// Rotate after every N fetch attempts
    pub rotate_every: u64,

    /// Time to let the new circuit settle before it is used (milliseconds)
    pub settle_delay_ms: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            rotate_every: 20,
            settle_delay_ms: 2000,
        }
    }
}

impl IdentityConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TransportConfig {
    /// Proxy endpoint; an empty string disables the proxy
    pub proxy_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Skip certificate validation (onion services are usually self-signed)
    pub accept_invalid_certs: bool,

    /// Give each session its own SOCKS credentials so Tor builds a new circuit
    pub isolate_circuits: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            proxy_url: "socks5h://127.0.0.1:9150".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            accept_invalid_certs: true,
            isolate_circuits: true,
        }
    }
}

impl TransportConfig {
    /// A transport config that talks to the network directly
    pub fn direct() -> Self {
        Self {
            proxy_url: String::new(),
            isolate_circuits: false,
            ..Self::default()
        }
    }
}

/// Page store and backup configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Directory holding checkpoint copies of the database
    pub backup_dir: PathBuf,

    /// Take a checkpoint backup after every N successful writes
    pub checkpoint_every: u64,

    /// Number of checkpoint backups to retain
    pub keep_backups: usize,

    /// SQLite page cache size (PRAGMA cache_size)
    pub cache_size: i64,

    /// How long a write waits on a locked database before failing (milliseconds)
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/onions.db"),
            backup_dir: PathBuf::from("data/backups"),
            checkpoint_every: 10,
            keep_backups: 10,
            cache_size: 10_000,
            busy_timeout_ms: 10_000,
        }
    }
}

/// Seed sources for each crawl run
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SeedConfig {
    /// Hand-picked onion URLs, always included
    #[serde(rename = "static")]
    pub static_seeds: Vec<String>,

    /// Whether to scrape the search engine for more seeds
    pub search_enabled: bool,

    /// Search endpoint; the query is appended URL-encoded
    pub search_url: String,

    /// Queries sent to the search endpoint
    pub search_queries: Vec<String>,

    /// Directory pages scraped for onion links; `.onion` hosts go through
    /// the proxy, others are fetched directly
    pub directories: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            static_seeds: vec![
                "https://duckduckgogg42xjoc72x3sjasowoarfbgcmvfimaftt6twagswzczad.onion/"
                    .to_string(),
                "http://darkfailenbsdla5mal2mxn2uz66od5vtzd5qozslagrfzachha3f3id.onion/"
                    .to_string(),
            ],
            search_enabled: true,
            search_url: "https://ahmia.fi/search/?q=".to_string(),
            search_queries: [
                "forum",
                "market",
                "wiki",
                "news",
                "chat",
                "blog",
                "hidden service",
                "test",
                "mirror",
            ]
            .iter()
            .map(|q| q.to_string())
            .collect(),
            directories: vec!["https://onions.danwin1210.de/".to_string()],
        }
    }
}
