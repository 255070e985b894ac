#![forbid(unsafe_code)]

//! Synchronous key-value persistence used by the session services.

pub mod repository;
pub mod sqlite;

pub use repository::{InMemoryStore, KeyValueStore, StorageError};
pub use sqlite::{SqliteInitError, SqliteStore};
