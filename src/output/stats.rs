//! Store statistics for the `--stats` mode
//!
//! This module provides a read-only report over the page store and its
//! backup directory. Loading a report never fails and never writes: a store
//! that is missing or cannot be queried shows up as `corrupted` with the
//! error text.

use crate::config::StorageConfig;
use crate::storage::{BackupManager, SqlitePageStore, StoreStats};
use std::path::PathBuf;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct StoreReport {
    /// Path of the primary database file
    pub database: PathBuf,

    /// Page count and health
    pub stats: StoreStats,

    /// Pages written since the last checkpoint
    pub active_pages: Option<u64>,

    /// Pages covered by a checkpoint
    pub backed_up_pages: Option<u64>,

    /// Backup files, oldest first
    pub backups: Vec<PathBuf>,
}

/// Loads a store report
///
/// # Arguments
///
/// * `config` - Storage configuration naming the database and backup dir
pub fn load_store_report(config: &StorageConfig) -> StoreReport {
    let (stats, active_pages, backed_up_pages) = match SqlitePageStore::inspect(config) {
        Ok(snapshot) => (
            StoreStats::healthy(snapshot.total_pages),
            Some(snapshot.active_pages),
            Some(snapshot.backed_up_pages),
        ),
        Err(e) => {
            tracing::warn!("Could not read page store: {}", e);
            (StoreStats::corrupted(e.to_string()), None, None)
        }
    };

    let backups = BackupManager::new(&config.backup_dir, config.keep_backups)
        .list()
        .unwrap_or_else(|e| {
            tracing::warn!("Could not list backups: {}", e);
            Vec::new()
        });

    StoreReport {
        database: config.database_path.clone(),
        stats,
        active_pages,
        backed_up_pages,
        backups,
    }
}

/// Prints a store report to stdout in a formatted manner
pub fn print_store_report(report: &StoreReport) {
    println!("=== Page Store Statistics ===\n");

    println!("Database: {}", report.database.display());
    println!("  Status: {}", report.stats.health);
    if let Some(error) = &report.stats.error {
        println!("  Error: {}", error);
    }
    println!("  Total pages: {}", report.stats.total_pages);
    if let (Some(active), Some(backed_up)) = (report.active_pages, report.backed_up_pages) {
        println!("  Since last checkpoint: {}", active);
        println!("  Covered by a checkpoint: {}", backed_up);
    }
    println!();

    println!("Backups ({}):", report.backups.len());
    for backup in &report.backups {
        let name = backup
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| backup.display().to_string());
        println!("  - {}", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{PageStore, StoreHealth};
    use std::fs;
    use tempfile::TempDir;

    fn storage_config(dir: &TempDir) -> StorageConfig {
        StorageConfig {
            database_path: dir.path().join("onions.db"),
            backup_dir: dir.path().join("backups"),
            checkpoint_every: 2,
            keep_backups: 5,
            cache_size: 2000,
            busy_timeout_ms: 1000,
        }
    }

    #[test]
    fn test_report_for_healthy_store() {
        let dir = TempDir::new().unwrap();
        let config = storage_config(&dir);
        {
            let mut store = SqlitePageStore::open(&config).unwrap();
            for i in 0..3 {
                store.save(&format!("http://page{}", i), "x").unwrap();
            }
        }

        let report = load_store_report(&config);

        assert_eq!(report.stats.health, StoreHealth::Healthy);
        assert_eq!(report.stats.total_pages, 3);
        assert_eq!(report.backed_up_pages, Some(2));
        assert_eq!(report.active_pages, Some(1));
        assert_eq!(report.backups.len(), 1);
    }

    #[test]
    fn test_report_for_corrupted_store() {
        let dir = TempDir::new().unwrap();
        let config = storage_config(&dir);
        fs::write(&config.database_path, vec![0x5a; 4096]).unwrap();

        let report = load_store_report(&config);

        assert_eq!(report.stats.health, StoreHealth::Corrupted);
        assert!(report.stats.error.is_some());
        assert!(report.backups.is_empty());
    }

    #[test]
    fn test_report_for_missing_store_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let mut config = storage_config(&dir);
        config.database_path = dir.path().join("typo").join("onions.db");

        let report = load_store_report(&config);

        assert_eq!(report.stats.health, StoreHealth::Corrupted);
        assert_eq!(report.active_pages, None);
        assert!(!config.database_path.exists());
        assert!(!dir.path().join("typo").exists());
        assert!(!config.backup_dir.exists());
    }

    #[test]
    fn test_report_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let config = storage_config(&dir);
        {
            let mut store = SqlitePageStore::open(&config).unwrap();
            store.save("http://page0", "x").unwrap();
        }
        let before = fs::read(&config.database_path).unwrap();

        let report = load_store_report(&config);

        assert_eq!(report.stats.total_pages, 1);
        assert_eq!(fs::read(&config.database_path).unwrap(), before);
    }
}
