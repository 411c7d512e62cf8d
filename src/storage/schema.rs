//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Onion-Archive database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Archived pages, one row per URL
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    crawled_at TEXT NOT NULL,
    backup_status TEXT NOT NULL DEFAULT 'active'
);

CREATE INDEX IF NOT EXISTS idx_pages_backup_status ON pages(backup_status);
CREATE INDEX IF NOT EXISTS idx_pages_crawled_at ON pages(crawled_at);
"#;

/// Replace-on-conflict write of a single page
pub const UPSERT_PAGE_SQL: &str = "INSERT OR REPLACE INTO pages (url, content, crawled_at, backup_status)
     VALUES (?1, ?2, ?3, ?4)";

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", get_schema_version())?;
    Ok(())
}

/// Gets the current schema version
///
/// Stored in `PRAGMA user_version` for future migrations.
pub fn get_schema_version() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_pages_table_and_version() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='pages'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);

        let version: u32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, get_schema_version());
    }

    #[test]
    fn test_upsert_replaces_row() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute(UPSERT_PAGE_SQL, ["u", "first", "t1", "active"])
            .unwrap();
        conn.execute(UPSERT_PAGE_SQL, ["u", "second", "t2", "active"])
            .unwrap();

        let (rows, content): (i64, String) = conn
            .query_row("SELECT COUNT(*), MAX(content) FROM pages", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(content, "second");
    }
}
