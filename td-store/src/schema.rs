//! Database schema definitions and table creation.
//!
//! The document store keeps every document in a single `documents` table:
//! schemaless JSON bodies addressed by slash-separated paths, with the
//! parent collection denormalized for query performance.

use rusqlite::Connection;
use td_core::error::{TdError, TdResult};
use tracing::info;

/// Create all database tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> TdResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| TdError::Database(format!("failed to create schema: {e}")))?;
    info!("database schema verified");
    Ok(())
}

/// Drop all tables (used for database reset).
pub fn drop_tables(conn: &Connection) -> TdResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS documents;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| TdError::Database(format!("failed to drop tables: {e}")))?;
    Ok(())
}

/// Complete SQL schema for all tables.
const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Documents: one row per document, addressed by path.
-- `collection` is the full parent collection path (e.g. "users" or
-- "users/u1/logs") so collection scans and field queries stay indexed.
-- The rowid is monotonically increasing, which the watcher relies on to
-- pick up newly created documents.
CREATE TABLE IF NOT EXISTS documents (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    path            TEXT NOT NULL UNIQUE,
    collection      TEXT NOT NULL,
    doc_id          TEXT NOT NULL,
    body            TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL,
    updated_at      TEXT
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
CREATE INDEX IF NOT EXISTS idx_documents_collection_id ON documents(collection, doc_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        // Creating again is a no-op
        create_tables(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_drop_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        drop_tables(&conn).unwrap();

        let result: Result<i64, _> =
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0));
        assert!(result.is_err());
    }
}
