use crate::config::types::{
    Config, CrawlerConfig, IdentityConfig, SeedConfig, StorageConfig, TransportConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_identity_config(&config.identity)?;
    validate_transport_config(&config.transport)?;
    validate_storage_config(&config.storage)?;
    validate_seed_config(&config.seeds)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be >= 1, got {}",
            config.fetch_timeout_secs
        )));
    }

    Ok(())
}

/// Validates identity rotation configuration
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.rotate_every < 1 {
        return Err(ConfigError::Validation(format!(
            "rotate_every must be >= 1, got {}",
            config.rotate_every
        )));
    }

    Ok(())
}

/// Validates transport configuration
fn validate_transport_config(config: &TransportConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    // An empty proxy means direct connections
    if config.proxy_url.is_empty() {
        return Ok(());
    }

    let proxy = Url::parse(&config.proxy_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy_url: {}", e)))?;

    match proxy.scheme() {
        "socks5" | "socks5h" | "http" | "https" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "proxy_url scheme must be socks5, socks5h, http or https, got '{}'",
                other
            )))
        }
    }

    if proxy.host_str().is_none() || proxy.port_or_known_default().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "proxy_url '{}' must include a host and port",
            config.proxy_url
        )));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.backup_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "backup_dir cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_every < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_every must be >= 1, got {}",
            config.checkpoint_every
        )));
    }

    if config.keep_backups < 1 {
        return Err(ConfigError::Validation(format!(
            "keep_backups must be >= 1, got {}",
            config.keep_backups
        )));
    }

    Ok(())
}

/// Validates seed configuration
fn validate_seed_config(config: &SeedConfig) -> Result<(), ConfigError> {
    for seed in &config.static_seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use http or https",
                seed
            )));
        }
    }

    if config.search_enabled {
        Url::parse(&config.search_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search_url: {}", e)))?;
    }

    for directory in &config.directories {
        Url::parse(directory).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid directory URL '{}': {}", directory, e))
        })?;
    }

    Ok(())
}
