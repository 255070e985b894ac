use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use super::SqliteInitError;

/// Applies schema versions that are not yet recorded in `schema_migrations`.
pub fn run_migrations(conn: &mut Connection) -> Result<(), SqliteInitError> {
    fn is_applied(conn: &Connection, version: i64) -> Result<bool, rusqlite::Error> {
        let row = conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE version = ?1",
                params![version],
                |_| Ok(()),
            )
            .optional()?;
        Ok(row.is_some())
    }

    conn.execute(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
        [],
    )?;

    // Version 1: key-value table.
    if !is_applied(conn, 1)? {
        let tx = conn.transaction()?;

        tx.execute(
            r"
                CREATE TABLE IF NOT EXISTS kv_entries (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
            ",
            [],
        )?;

        tx.execute(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
            params![1_i64, Utc::now().to_rfc3339()],
        )?;

        tx.commit()?;
        tracing::debug!(version = 1, "applied schema migration");
    }

    Ok(())
}
