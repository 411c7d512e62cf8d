//! SQLite page store
//!
//! This module provides the SQLite implementation of the [`PageStore`] trait.
//! The database runs in WAL mode; every `checkpoint_every`-th write folds the
//! WAL back into the main file and snapshots the store into the backup
//! directory.

use crate::config::StorageConfig;
use crate::storage::backup::{remove_if_exists, BackupManager};
use crate::storage::schema::{initialize_schema, UPSERT_PAGE_SQL};
use crate::storage::traits::{PageStore, StorageError, StorageResult};
use crate::storage::{PageRecord, RecordStatus, SaveOutcome, StoreStats};
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// SQLite page store backend
pub struct SqlitePageStore {
    conn: Option<Connection>,
    config: StorageConfig,
    backups: BackupManager,
    writes: u64,
    pages_at_open: u64,
}

impl SqlitePageStore {
    /// Opens (or creates) the store at `config.database_path`
    ///
    /// # Arguments
    ///
    /// * `config` - Storage configuration
    ///
    /// # Returns
    ///
    /// * `Ok(SqlitePageStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        let conn = Self::open_connection(config)?;
        let pages_at_open = count_rows(&conn)?;
        tracing::info!(
            "Opened page store {} ({} pages)",
            config.database_path.display(),
            pages_at_open
        );

        Ok(Self {
            conn: Some(conn),
            config: config.clone(),
            backups: BackupManager::new(&config.backup_dir, config.keep_backups),
            writes: 0,
            pages_at_open,
        })
    }

    fn open_connection(config: &StorageConfig) -> StorageResult<Connection> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&config.database_path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        // Configure SQLite for crash safety with reasonable write throughput
        conn.execute_batch(&format!(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = {};
            PRAGMA temp_store = MEMORY;
        ",
            config.cache_size
        ))?;

        initialize_schema(&conn)?;
        Ok(conn)
    }

    fn conn(&self) -> StorageResult<&Connection> {
        self.conn.as_ref().ok_or(StorageError::Closed)
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.config.database_path
    }

    /// Rows present when the store was opened
    pub fn pages_at_open(&self) -> u64 {
        self.pages_at_open
    }

    /// Successful writes since the store was opened
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Counts pages with the given backup status
    pub fn count_by_status(&self, status: RecordStatus) -> StorageResult<u64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM pages WHERE backup_status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn write_page(&mut self, url: &str, content: &str) -> StorageResult<()> {
        let conn = self.conn.as_mut().ok_or(StorageError::Closed)?;
        // Dropping an uncommitted transaction rolls it back
        let tx = conn.transaction()?;
        tx.execute(
            UPSERT_PAGE_SQL,
            params![
                url,
                content,
                Utc::now().to_rfc3339(),
                RecordStatus::Active.to_db_string()
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Folds the WAL into the main file and snapshots the store as a backup
    ///
    /// A checkpoint blocked by another reader is an error: no backup is
    /// written and no rows change status. On success, rows written since the
    /// previous checkpoint are marked `backed_up` and the oldest backups
    /// beyond the retention limit are deleted.
    pub fn create_checkpoint(&mut self) -> StorageResult<PathBuf> {
        let conn = self.conn.as_ref().ok_or(StorageError::Closed)?;
        let (busy, log, checkpointed): (i64, i64, i64) = conn.query_row(
            "PRAGMA wal_checkpoint(TRUNCATE)",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        if busy != 0 {
            return Err(StorageError::CheckpointBusy {
                remaining: (log - checkpointed).max(0),
            });
        }

        let backup = self.backups.snapshot(conn)?;

        if let Err(e) = conn.execute(
            "UPDATE pages SET backup_status = ?1 WHERE backup_status = ?2",
            params![
                RecordStatus::BackedUp.to_db_string(),
                RecordStatus::Active.to_db_string()
            ],
        ) {
            tracing::warn!("Failed to mark pages as backed up: {}", e);
        }

        match self.backups.enforce_retention() {
            Ok(removed) if !removed.is_empty() => {
                tracing::debug!("Retention removed {} old backups", removed.len());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to enforce backup retention: {}", e),
        }

        Ok(backup)
    }

    /// Replaces the primary database with the newest usable backup
    ///
    /// Closes the connection, restores, and reopens. Returns whether a backup
    /// was restored. A failed restore leaves the primary file untouched and
    /// the store is reopened on it.
    pub fn recover_from_latest_backup(&mut self) -> bool {
        self.close();
        let restored = Self::restore_latest_backup(&self.config);

        match Self::open_connection(&self.config) {
            Ok(conn) => {
                self.conn = Some(conn);
                self.writes = 0;
            }
            Err(e) => {
                tracing::error!("Failed to reopen store after recovery: {}", e);
                return false;
            }
        }

        match restored {
            Ok(backup) => {
                tracing::info!("Recovered store from {}", backup.display());
                true
            }
            Err(e) => {
                tracing::error!("Recovery failed: {}", e);
                false
            }
        }
    }

    /// Restores the newest usable backup over a store that is not open
    ///
    /// Backups are tried newest first. Each candidate is copied next to the
    /// primary and checked with `PRAGMA integrity_check`; one that fails is
    /// logged and skipped. The primary is only replaced, by rename, once a
    /// copy has passed. Stale `-wal` and `-shm` sidecars are removed just
    /// before the rename so SQLite does not replay a log that belongs to the
    /// discarded file.
    pub fn restore_latest_backup(config: &StorageConfig) -> StorageResult<PathBuf> {
        let backups = BackupManager::new(&config.backup_dir, config.keep_backups).list()?;
        if backups.is_empty() {
            return Err(StorageError::NoBackups(config.backup_dir.clone()));
        }

        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let staging = sidecar_path(&config.database_path, ".restore");

        for candidate in backups.iter().rev() {
            remove_if_exists(&staging)?;
            fs::copy(candidate, &staging)?;

            if let Err(e) = verify_database(&staging) {
                tracing::warn!("Skipping backup {}: {}", candidate.display(), e);
                remove_if_exists(&staging)?;
                for sidecar in ["-wal", "-shm"] {
                    remove_if_exists(&sidecar_path(&staging, sidecar))?;
                }
                continue;
            }

            for sidecar in ["-wal", "-shm"] {
                let path = sidecar_path(&config.database_path, sidecar);
                if path.exists() {
                    fs::remove_file(&path)?;
                    tracing::debug!("Removed {}", path.display());
                }
            }
            fs::rename(&staging, &config.database_path)?;
            return Ok(candidate.clone());
        }

        Err(StorageError::NoValidBackup(config.backup_dir.clone()))
    }

    /// Reads page counts from an existing store without changing anything
    ///
    /// Opens read-only and never creates the file, its directory or the
    /// schema. A missing file is reported as [`StorageError::Missing`].
    pub fn inspect(config: &StorageConfig) -> StorageResult<StoreSnapshot> {
        if !config.database_path.is_file() {
            return Err(StorageError::Missing(config.database_path.clone()));
        }

        let conn = Connection::open_with_flags(
            &config.database_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        let by_status = |status: RecordStatus| -> StorageResult<u64> {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM pages WHERE backup_status = ?1",
                params![status.to_db_string()],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        };

        Ok(StoreSnapshot {
            total_pages: count_rows(&conn)?,
            active_pages: by_status(RecordStatus::Active)?,
            backed_up_pages: by_status(RecordStatus::BackedUp)?,
        })
    }
}

/// Page counts read by [`SqlitePageStore::inspect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub total_pages: u64,
    pub active_pages: u64,
    pub backed_up_pages: u64,
}

impl PageStore for SqlitePageStore {
    fn save(&mut self, url: &str, content: &str) -> StorageResult<SaveOutcome> {
        if let Err(e) = self.write_page(url, content) {
            if !e.is_transient() {
                return Err(e);
            }
            tracing::warn!("Database busy while saving {}, retrying once: {}", url, e);
            self.write_page(url, content)?;
        }

        self.writes += 1;
        if self.writes % self.config.checkpoint_every.max(1) != 0 {
            return Ok(SaveOutcome::Saved);
        }

        match self.create_checkpoint() {
            Ok(backup) => {
                tracing::info!("Checkpoint after {} writes: {}", self.writes, backup.display());
                Ok(SaveOutcome::Checkpoint(Some(backup)))
            }
            Err(e) => {
                tracing::warn!("Checkpoint after {} writes failed: {}", self.writes, e);
                Ok(SaveOutcome::Checkpoint(None))
            }
        }
    }

    fn get_page(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let mut stmt = self.conn()?.prepare(
            "SELECT url, content, crawled_at, backup_status FROM pages WHERE url = ?1",
        )?;

        let page = stmt
            .query_row(params![url], |row| {
                Ok(PageRecord {
                    url: row.get(0)?,
                    content: row.get(1)?,
                    crawled_at: row.get(2)?,
                    status: RecordStatus::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(RecordStatus::Active),
                })
            })
            .optional()?;

        Ok(page)
    }

    fn count_pages(&self) -> StorageResult<u64> {
        count_rows(self.conn()?)
    }

    fn stats(&self) -> StoreStats {
        match self.count_pages() {
            Ok(total) => StoreStats::healthy(total),
            Err(e) => StoreStats::corrupted(e.to_string()),
        }
    }

    fn close(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        if let Err(e) = conn.execute_batch("PRAGMA optimize;") {
            tracing::debug!("PRAGMA optimize failed on close: {}", e);
        }
        match conn.close() {
            Ok(()) => tracing::info!("Closed page store {}", self.config.database_path.display()),
            Err((_, e)) => tracing::warn!("Error while closing page store: {}", e),
        }
    }
}

impl Drop for SqlitePageStore {
    fn drop(&mut self) {
        self.close();
    }
}

fn count_rows(conn: &Connection) -> StorageResult<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
    Ok(count as u64)
}

/// Checks that `path` is an intact page store
fn verify_database(path: &Path) -> StorageResult<()> {
    let invalid = |reason: String| StorageError::InvalidBackup {
        path: path.to_path_buf(),
        reason,
    };

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
        .map_err(|e| invalid(e.to_string()))?;
    let result: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .map_err(|e| invalid(e.to_string()))?;
    if result != "ok" {
        return Err(invalid(result));
    }
    count_rows(&conn).map_err(|e| invalid(e.to_string()))?;

    conn.close().map_err(|(_, e)| invalid(e.to_string()))
}

fn sidecar_path(database: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(database.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
