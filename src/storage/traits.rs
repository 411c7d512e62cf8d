//! Storage traits and error types
//!
//! This module defines the trait interface for page stores and
//! associated error types.

use crate::storage::{PageRecord, SaveOutcome, StoreStats};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store is closed")]
    Closed,

    #[error("No backups found in {0}")]
    NoBackups(PathBuf),

    #[error("No usable backup in {0}")]
    NoValidBackup(PathBuf),

    #[error("Backup {path} failed verification: {reason}")]
    InvalidBackup { path: PathBuf, reason: String },

    #[error("WAL checkpoint blocked by a reader ({remaining} frames not copied)")]
    CheckpointBusy { remaining: i64 },

    #[error("Database not found at {0}")]
    Missing(PathBuf),
}

impl StorageError {
    /// True for lock contention that a single retry may clear
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sqlite(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
            ),
            _ => false,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for page store implementations
///
/// A store has a single owner; every mutating call takes `&mut self`, so
/// writes are serialized by the borrow checker rather than a lock.
pub trait PageStore {
    /// Durably records a page, replacing any earlier copy of the same URL
    ///
    /// Every `checkpoint_every`-th successful save also takes a checkpoint;
    /// a failed checkpoint never fails the save itself.
    fn save(&mut self, url: &str, content: &str) -> StorageResult<SaveOutcome>;

    /// Gets a stored page by URL
    fn get_page(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Number of stored pages
    fn count_pages(&self) -> StorageResult<u64>;

    /// Health snapshot; query failures are reported, never raised
    fn stats(&self) -> StoreStats;

    /// Flushes and releases the store. Safe to call more than once.
    fn close(&mut self);
}
