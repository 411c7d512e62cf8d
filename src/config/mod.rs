//! Configuration module for Onion-Archive
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a documented default, so running without a file is supported.
//!
//! # Example
//!
//! ```no_run
//! use onion_archive::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will fetch at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, IdentityConfig, SeedConfig, StorageConfig, TransportConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, apply_proxy_override, compute_config_hash, default_config, load_config,
    load_config_with_hash, parse_config, PROXY_ENV_VAR,
};
pub use validation::validate;
