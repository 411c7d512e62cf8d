//! Onion-Archive main entry point
//!
//! This is the command-line interface for the Onion-Archive hidden-service crawler.

use anyhow::Context;
use clap::Parser;
use onion_archive::config::{default_config, load_config_with_hash, Config};
use onion_archive::crawler::crawl;
use onion_archive::output::{load_store_report, print_store_report};
use onion_archive::storage::SqlitePageStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Onion-Archive: a checkpointed hidden-service crawler
///
/// Onion-Archive discovers onion pages through a SOCKS proxy, rotates the
/// proxy identity on a fixed cadence and archives every fetched page into a
/// SQLite store with rolling checkpoint backups.
#[derive(Parser, Debug)]
#[command(name = "onion-archive")]
#[command(version)]
#[command(about = "A checkpointed hidden-service crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (compiled-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single crawl cycle and exit
    #[arg(long, conflicts_with_all = ["stats", "recover", "dry_run"])]
    once: bool,

    /// Show page store statistics and exit
    #[arg(long, conflicts_with_all = ["once", "recover", "dry_run"])]
    stats: bool,

    /// Restore the page store from the latest backup and exit
    #[arg(long, conflicts_with_all = ["once", "stats", "dry_run"])]
    recover: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["once", "stats", "recover"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_ref())?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config);
    } else if cli.recover {
        handle_recover(&config)?;
    } else {
        handle_crawl(config, cli.once).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("onion_archive=info,warn"),
            1 => EnvFilter::new("onion_archive=debug,info"),
            2 => EnvFilter::new("onion_archive=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(default_config()?);
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Onion-Archive Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max pages per run: {}", config.crawler.max_pages);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Cycle interval: {}s", config.crawler.cycle_interval_secs);

    println!("\nIdentity:");
    println!("  Rotate every: {} fetches", config.identity.rotate_every);
    println!("  Settle delay: {}ms", config.identity.settle_delay_ms);

    println!("\nTransport:");
    if config.transport.proxy_url.is_empty() {
        println!("  Proxy: none (direct)");
    } else {
        println!("  Proxy: {}", config.transport.proxy_url);
    }
    println!("  Circuit isolation: {}", config.transport.isolate_circuits);
    println!("  Accept invalid certs: {}", config.transport.accept_invalid_certs);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path.display());
    println!("  Backups: {}", config.storage.backup_dir.display());
    println!("  Checkpoint every: {} writes", config.storage.checkpoint_every);
    println!("  Keep backups: {}", config.storage.keep_backups);

    println!("\nStatic Seeds ({}):", config.seeds.static_seeds.len());
    for seed in &config.seeds.static_seeds {
        println!("  - {}", seed);
    }
    if config.seeds.search_enabled {
        println!(
            "\nSearch: {} ({} queries)",
            config.seeds.search_url,
            config.seeds.search_queries.len()
        );
    } else {
        println!("\nSearch: disabled");
    }
    println!("Directories: {}", config.seeds.directories.len());

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: prints store statistics, degraded or not
fn handle_stats(config: &Config) {
    let report = load_store_report(&config.storage);
    print_store_report(&report);
}

/// Handles the --recover mode: restores the latest backup over the store
fn handle_recover(config: &Config) -> anyhow::Result<()> {
    let backup = SqlitePageStore::restore_latest_backup(&config.storage)
        .context("recovery failed")?;
    println!("✓ Restored {}", backup.display());

    let store = SqlitePageStore::open(&config.storage)
        .context("restored store could not be opened")?;
    println!("✓ Store contains {} pages", store.pages_at_open());
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, once: bool) -> anyhow::Result<()> {
    let max_cycles = once.then_some(1);
    tracing::info!(
        "Starting archiver: {} static seeds, {} pages per run, {}",
        config.seeds.static_seeds.len(),
        config.crawler.max_pages,
        if once { "single cycle" } else { "looping until Ctrl-C" }
    );

    match crawl(config, max_cycles).await {
        Ok(cycles) => {
            tracing::info!("Archiver stopped after {} cycles", cycles);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Archiver failed: {}", e);
            Err(e.into())
        }
    }
}
