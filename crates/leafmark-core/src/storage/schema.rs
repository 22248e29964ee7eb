//! SQLite schema for the bookmark store
//!
//! One table of per-page bookmarks plus a `schema_info` table for version
//! tracking. Column names match the layout older databases were written with.

use rusqlite::{Connection, Result};
use tracing::warn;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Bookmarks table (no foreign key: a bookmark may outlive its file)
        CREATE TABLE IF NOT EXISTS bookmarks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            pdfUri TEXT NOT NULL,
            pageIndex INTEGER NOT NULL,
            title TEXT NOT NULL,
            summary TEXT NOT NULL,
            creationDate INTEGER NOT NULL
        );

        -- Per-document listing, newest first
        CREATE INDEX IF NOT EXISTS idx_bookmarks_pdf_uri
            ON bookmarks(pdfUri, creationDate);
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v != SCHEMA_VERSION,
        _ => true,
    }
}

/// Bring the database to the current schema
///
/// A database written by another schema version is dropped and recreated.
/// Bookmarks are not migrated across versions.
pub fn migrate(conn: &Connection) -> Result<()> {
    if !needs_init(conn) {
        return Ok(());
    }

    let has_schema_info = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")?
        .exists([])?;

    if has_schema_info {
        let found = get_schema_version(conn).ok().flatten();
        warn!(
            "Bookmark schema version {:?} does not match {}, recreating database",
            found, SCHEMA_VERSION
        );
        conn.execute_batch(
            r#"
            DROP INDEX IF EXISTS idx_bookmarks_pdf_uri;
            DROP TABLE IF EXISTS bookmarks;
            DROP TABLE IF EXISTS schema_info;
            "#,
        )?;
    }

    init_schema(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"bookmarks".to_string()));
        assert!(tables.contains(&"schema_info".to_string()));
    }

    #[test]
    fn test_schema_version() {
        let conn = Connection::open_in_memory().unwrap();

        assert!(needs_init(&conn));

        init_schema(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
        assert!(!needs_init(&conn));
    }

    #[test]
    fn test_index_exists() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let exists = conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type='index' AND name='idx_bookmarks_pdf_uri'")
            .unwrap()
            .exists([])
            .unwrap();
        assert!(exists);
    }

    #[test]
    fn test_migrate_recreates_foreign_version() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO bookmarks (pdfUri, pageIndex, title, summary, creationDate) VALUES ('a', 0, 't', '', 1)",
            [],
        )
        .unwrap();
        conn.execute(
            "UPDATE schema_info SET value = '0' WHERE key = 'version'",
            [],
        )
        .unwrap();

        assert!(needs_init(&conn));
        migrate(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM bookmarks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn test_migrate_keeps_current_data() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn.execute(
            "INSERT INTO bookmarks (pdfUri, pageIndex, title, summary, creationDate) VALUES ('a', 0, 't', '', 1)",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM bookmarks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
