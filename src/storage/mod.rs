//! Storage module for persisting archived pages
//!
//! This module handles all database operations for the archive, including:
//! - SQLite database initialization and schema management
//! - Page persistence with write-ahead logging
//! - Periodic checkpoints into timestamped backup files
//! - Backup retention and verified restore-from-latest recovery
//! - Read-only inspection for reporting

mod backup;
mod schema;
mod sqlite;
mod traits;

pub use backup::{is_backup_file_name, BackupManager, BACKUP_PREFIX, BACKUP_SUFFIX};
pub use sqlite::{SqlitePageStore, StoreSnapshot};
pub use traits::{PageStore, StorageError, StorageResult};

use std::fmt;
use std::path::PathBuf;

/// Represents a page in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub url: String,
    pub content: String,
    pub crawled_at: String,
    pub status: RecordStatus,
}

/// Backup status of a stored page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordStatus {
    /// Written since the last checkpoint
    Active,
    /// Included in at least one checkpoint backup
    BackedUp,
}

impl RecordStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::BackedUp => "backed_up",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "backed_up" => Some(Self::BackedUp),
            _ => None,
        }
    }
}

/// What a successful save did besides writing the row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The row was committed
    Saved,
    /// The row was committed and a checkpoint was attempted; `None` means
    /// the backup copy failed and was logged
    Checkpoint(Option<PathBuf>),
}

impl SaveOutcome {
    pub fn backup_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Checkpoint(path) => path.as_ref(),
            Self::Saved => None,
        }
    }
}

/// Store health as seen by the last statistics query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreHealth {
    Healthy,
    Corrupted,
}

impl fmt::Display for StoreHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Corrupted => write!(f, "corrupted"),
        }
    }
}

/// Health snapshot returned by [`PageStore::stats`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub total_pages: u64,
    pub health: StoreHealth,
    pub error: Option<String>,
}

impl StoreStats {
    pub fn healthy(total_pages: u64) -> Self {
        Self {
            total_pages,
            health: StoreHealth::Healthy,
            error: None,
        }
    }

    pub fn corrupted(error: impl Into<String>) -> Self {
        Self {
            total_pages: 0,
            health: StoreHealth::Corrupted,
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.health == StoreHealth::Healthy
    }
}
