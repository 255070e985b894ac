use std::sync::Arc;

use mnemo_core::model::Session;
use storage::{KeyValueStore, StorageError};

/// Key the session list is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "elaborative_interrogation_sessions";

/// Reads and writes the whole session list as one JSON array under one key.
///
/// There are no partial updates: every save rewrites the full list.
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl SessionStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load every persisted session.
    ///
    /// A missing key, an unreadable backend, or a payload that is not a valid
    /// session array all read as an empty list; failures are logged.
    #[must_use]
    pub fn load(&self) -> Vec<Session> {
        self.load_for_write().unwrap_or_else(|err| {
            tracing::warn!(key = %self.key, error = %err, "failed to read sessions");
            Vec::new()
        })
    }

    /// Load the list a mutation will rewrite.
    ///
    /// A corrupt payload still reads as empty so the next save replaces it,
    /// but a backend failure is returned: saving on top of an unread list
    /// would discard every stored session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub fn load_for_write(&self) -> Result<Vec<Session>, StorageError> {
        let Some(raw) = self.kv.get(&self.key)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<Session>>(&raw) {
            Ok(sessions) => Ok(sessions),
            Err(err) => {
                tracing::warn!(
                    key = %self.key,
                    error = %err,
                    "stored sessions are not valid JSON, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Replace the persisted list with `sessions`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the backend write fails.
    pub fn save(&self, sessions: &[Session]) -> Result<(), StorageError> {
        let payload = serde_json::to_string(sessions)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(&self.key, &payload)
    }
}
