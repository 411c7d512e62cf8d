//! Integration tests for checkpoint recovery
//!
//! These tests damage the primary database file on disk and check that the
//! newest backup brings the store back.

use onion_archive::config::StorageConfig;
use onion_archive::storage::{PageStore, SqlitePageStore, StorageError};
use std::fs;
use tempfile::TempDir;

fn storage_config(dir: &TempDir) -> StorageConfig {
    StorageConfig {
        database_path: dir.path().join("data").join("onions.db"),
        backup_dir: dir.path().join("data").join("backups"),
        checkpoint_every: 5,
        keep_backups: 2,
        cache_size: 2000,
        busy_timeout_ms: 1000,
    }
}

fn fill(store: &mut SqlitePageStore, count: usize) {
    for i in 0..count {
        store
            .save(&format!("http://page{}.onion/", i), &format!("body {}", i))
            .unwrap();
    }
}

#[test]
fn test_recovery_after_corruption() {
    let temp_dir = TempDir::new().unwrap();
    let config = storage_config(&temp_dir);

    {
        let mut store = SqlitePageStore::open(&config).unwrap();
        // Checkpoints at 5 and 10; the last three rows are not backed up
        fill(&mut store, 13);
        assert_eq!(store.count_pages().unwrap(), 13);
    }

    fs::write(&config.database_path, vec![0xA5; 8192]).unwrap();
    assert!(SqlitePageStore::open(&config).is_err());

    let restored = SqlitePageStore::restore_latest_backup(&config).unwrap();
    assert!(restored.starts_with(&config.backup_dir));

    let store = SqlitePageStore::open(&config).unwrap();
    assert_eq!(store.count_pages().unwrap(), 10);
    assert_eq!(
        store.get_page("http://page9.onion/").unwrap().unwrap().content,
        "body 9"
    );
    assert!(store.get_page("http://page12.onion/").unwrap().is_none());
}

#[test]
fn test_recovery_after_deletion() {
    let temp_dir = TempDir::new().unwrap();
    let config = storage_config(&temp_dir);

    {
        let mut store = SqlitePageStore::open(&config).unwrap();
        fill(&mut store, 5);
    }
    fs::remove_file(&config.database_path).unwrap();

    SqlitePageStore::restore_latest_backup(&config).unwrap();

    let store = SqlitePageStore::open(&config).unwrap();
    assert_eq!(store.pages_at_open(), 5);
}

#[test]
fn test_retention_holds_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = storage_config(&temp_dir);

    for _ in 0..3 {
        let mut store = SqlitePageStore::open(&config).unwrap();
        fill(&mut store, 5);
    }

    let store = SqlitePageStore::open(&config).unwrap();
    assert_eq!(store.backups().list().unwrap().len(), 2);
}

#[test]
fn test_restore_without_backups_leaves_store_alone() {
    let temp_dir = TempDir::new().unwrap();
    let config = storage_config(&temp_dir);

    {
        let mut store = SqlitePageStore::open(&config).unwrap();
        fill(&mut store, 3);
    }

    assert!(matches!(
        SqlitePageStore::restore_latest_backup(&config),
        Err(StorageError::NoBackups(_))
    ));

    let store = SqlitePageStore::open(&config).unwrap();
    assert_eq!(store.count_pages().unwrap(), 3);
}
