use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use crate::repository::{KeyValueStore, StorageError};

mod migrate;

/// Key-value store backed by a single `SQLite` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection lock poisoned")]
    Poisoned,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path` and migrate it.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the parent directory cannot be created, the
    /// file cannot be opened, or migrations fail.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SqliteInitError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migrations fail.
    pub fn open_in_memory() -> Result<Self, SqliteInitError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, SqliteInitError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration statements fail.
    pub fn migrate(&self) -> Result<(), SqliteInitError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| SqliteInitError::Poisoned)?;
        migrate::run_migrations(&mut conn)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT value FROM kv_entries WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|err| StorageError::Connection(err.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.connection()?;
        conn.execute(
            r"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .map_err(|err| StorageError::Connection(err.to_string()))?;
        tracing::debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteStore>();
    }

    #[test]
    fn upsert_replaces_value() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn migrate_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("k", "v").unwrap();
        store.migrate().unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
