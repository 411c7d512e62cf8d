//! Checkpoint backup files
//!
//! Backups are consistent snapshots of the store named
//! `onions_backup_<YYYYmmdd_HHMMSS_micros>_<seq>.db` in UTC, so sorting the
//! names sorts them by creation time. Only files matching that pattern are
//! ever listed, pruned or restored.
//!
//! A snapshot is written under a `.partial` name and renamed into place once
//! complete, so an interrupted snapshot never shows up as a backup.

use crate::storage::traits::StorageResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name prefix shared by every checkpoint backup
pub const BACKUP_PREFIX: &str = "onions_backup_";

/// File name suffix shared by every checkpoint backup
pub const BACKUP_SUFFIX: &str = ".db";

/// Manages the checkpoint backup directory
#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
    keep: usize,
    sequence: u64,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            dir: dir.into(),
            keep: keep.max(1),
            sequence: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a snapshot of `conn` into a new timestamped backup file
    ///
    /// Uses `VACUUM INTO`, which reads through the WAL, so the snapshot holds
    /// every row committed on `conn` regardless of what the main file holds.
    pub fn snapshot(&mut self, conn: &Connection) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let name = self.next_file_name(Utc::now());
        let target = self.dir.join(name);
        let partial = partial_path(&target);
        remove_if_exists(&partial)?;

        if let Err(e) = conn.execute("VACUUM INTO ?1", params![partial.to_string_lossy()]) {
            let _ = remove_if_exists(&partial);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&partial, &target) {
            let _ = remove_if_exists(&partial);
            return Err(e.into());
        }
        Ok(target)
    }

    /// Builds the next backup file name for the given instant
    ///
    /// The sequence suffix keeps names unique and ordered when two snapshots
    /// land in the same microsecond.
    pub fn next_file_name(&mut self, now: DateTime<Utc>) -> String {
        self.sequence = (self.sequence + 1) % 10_000;
        format!(
            "{}{}_{:04}{}",
            BACKUP_PREFIX,
            now.format("%Y%m%d_%H%M%S_%6f"),
            self.sequence,
            BACKUP_SUFFIX
        )
    }

    /// Lists backup files, oldest first
    ///
    /// A missing backup directory is treated as empty.
    pub fn list(&self) -> io::Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry?;
            let is_backup = entry
                .file_name()
                .to_str()
                .map(is_backup_file_name)
                .unwrap_or(false);
            if is_backup && entry.file_type()?.is_file() {
                backups.push(entry.path());
            }
        }

        backups.sort();
        Ok(backups)
    }

    /// Returns the newest backup, if any
    pub fn latest(&self) -> io::Result<Option<PathBuf>> {
        Ok(self.list()?.pop())
    }

    /// Deletes the oldest backups until at most `keep` remain
    ///
    /// Individual deletion failures are logged and skipped. Returns the files
    /// that were removed.
    pub fn enforce_retention(&self) -> io::Result<Vec<PathBuf>> {
        let backups = self.list()?;
        if backups.len() <= self.keep {
            return Ok(Vec::new());
        }

        let excess = backups.len() - self.keep;
        let mut removed = Vec::with_capacity(excess);
        for old in backups.into_iter().take(excess) {
            match fs::remove_file(&old) {
                Ok(()) => {
                    tracing::debug!("Cleaned old backup: {}", old.display());
                    removed.push(old);
                }
                Err(e) => {
                    tracing::warn!("Failed to remove old backup {}: {}", old.display(), e);
                }
            }
        }

        Ok(removed)
    }
}

/// Returns true if a file name looks like a checkpoint backup
pub fn is_backup_file_name(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX)
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

pub(crate) fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn source_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE pages (url TEXT PRIMARY KEY);
             INSERT INTO pages VALUES ('http://a.onion'), ('http://b.onion');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_file_names_sort_by_creation() {
        let mut manager = BackupManager::new("/unused", 3);
        let t1 = Utc.with_ymd_and_hms(2026, 1, 9, 23, 59, 59).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap();

        let a = manager.next_file_name(t1);
        let b = manager.next_file_name(t1);
        let c = manager.next_file_name(t2);

        assert!(a < b, "{} should sort before {}", a, b);
        assert!(b < c, "{} should sort before {}", b, c);
        assert!(is_backup_file_name(&a));
        assert!(a.starts_with("onions_backup_20260109_235959_000000_"));
    }

    #[test]
    fn test_snapshot_is_a_readable_database() {
        let dir = TempDir::new().unwrap();
        let mut manager = BackupManager::new(dir.path().join("backups"), 3);

        let backup = manager.snapshot(&source_db()).unwrap();

        let copy = Connection::open(&backup).unwrap();
        let rows: i64 = copy
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 2);
        assert_eq!(manager.latest().unwrap(), Some(backup.clone()));
        assert!(!partial_path(&backup).exists());
    }

    #[test]
    fn test_list_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let backups_dir = dir.path().join("backups");
        let mut manager = BackupManager::new(&backups_dir, 3);

        let backup = manager.snapshot(&source_db()).unwrap();
        fs::write(backups_dir.join("notes.txt"), "keep me").unwrap();
        fs::write(partial_path(&backup.with_file_name("onions_backup_x.db")), "torn").unwrap();

        assert_eq!(manager.list().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let manager = BackupManager::new("/definitely/not/here", 3);
        assert!(manager.list().unwrap().is_empty());
        assert_eq!(manager.latest().unwrap(), None);
    }

    #[test]
    fn test_retention_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let source = source_db();
        let mut manager = BackupManager::new(dir.path().join("backups"), 2);

        let created: Vec<PathBuf> = (0..5).map(|_| manager.snapshot(&source).unwrap()).collect();
        let removed = manager.enforce_retention().unwrap();

        assert_eq!(removed, created[..3].to_vec());
        assert_eq!(manager.list().unwrap(), created[3..].to_vec());
    }
}
