use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use mnemo_core::model::{
    Evaluation, Question, QuestionId, Session, SessionId, SessionModelError, Statistics,
};
use storage::KeyValueStore;

use super::listeners::{ListenerId, Listeners};
use super::progress::SessionProgress;
use super::repository::SessionStore;
use crate::Clock;
use crate::error::SessionError;

/// Counter half of generated session ids, shared by every manager in the
/// process so that managers over one store never mint the same id.
static NEXT_SESSION: AtomicU64 = AtomicU64::new(0);

/// Owns the persisted session list and mediates every change to it.
///
/// Each mutating call loads the full list, applies one change, writes the
/// list back and then notifies listeners synchronously, in registration
/// order. Queries never fail: an unreadable store reads as empty. Mutations
/// fail instead, so a backend error never overwrites the stored list.
///
/// Clones share the store and the listener list.
#[derive(Clone)]
pub struct SessionManager {
    clock: Clock,
    store: SessionStore,
    listeners: Listeners,
    write_lock: Arc<Mutex<()>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        Self {
            clock,
            store: SessionStore::new(kv),
            listeners: Listeners::default(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Use `key` instead of [`super::DEFAULT_STORAGE_KEY`] for the session list.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.store = self.store.with_key(key);
        self
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        self.store.key()
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    /// Create and persist a session with freshly generated questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the session list cannot be read or
    /// written.
    pub fn start_session(&self, word: &str, explanation: &str) -> Result<Session, SessionError> {
        let session = {
            let _guard = self.lock_writes();
            let mut sessions = self.store.load_for_write()?;
            let session = Session::start(self.next_id(), word, explanation, self.clock.now());
            sessions.push(session.clone());
            self.store.save(&sessions)?;
            session
        };
        tracing::info!(session_id = %session.id(), word, "started interrogation session");
        self.listeners.notify();
        Ok(session)
    }

    /// Evaluate `text` as the answer to one question, replacing any earlier answer.
    ///
    /// Completed sessions still accept answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionNotFound` for an unknown session,
    /// `SessionError::QuestionNotFound` if the question is not part of it, or
    /// `SessionError::Storage` if the store cannot be read or written.
    pub fn submit_response(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
        text: &str,
    ) -> Result<Evaluation, SessionError> {
        let evaluation = {
            let _guard = self.lock_writes();
            let mut sessions = self.store.load_for_write()?;
            let session = find_mut(&mut sessions, session_id)?;
            let evaluation = session
                .record_answer(question_id, text)
                .map_err(|err| match err {
                    SessionModelError::UnknownQuestion(question_id) => {
                        SessionError::QuestionNotFound {
                            session_id: session_id.clone(),
                            question_id,
                        }
                    }
                    other => SessionError::Model(other.into()),
                })?
                .clone();
            self.store.save(&sessions)?;
            evaluation
        };
        tracing::debug!(
            session_id = %session_id,
            question_id = %question_id,
            score = evaluation.score,
            "recorded response"
        );
        self.listeners.notify();
        Ok(evaluation)
    }

    /// Mark a session completed and compute its overall score.
    ///
    /// Unanswered questions do not block completion.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionNotFound` for an unknown session or
    /// `SessionError::Storage` if the store cannot be read or written.
    pub fn complete_session(&self, session_id: &SessionId) -> Result<Session, SessionError> {
        let session = {
            let _guard = self.lock_writes();
            let mut sessions = self.store.load_for_write()?;
            let session = find_mut(&mut sessions, session_id)?;
            session.complete(self.clock.now());
            let completed = session.clone();
            self.store.save(&sessions)?;
            completed
        };
        tracing::info!(
            session_id = %session_id,
            overall_score = session.overall_score(),
            answered = session.answered_count(),
            "completed interrogation session"
        );
        self.listeners.notify();
        Ok(session)
    }

    /// Remove a session. Deleting an unknown id does nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be read or written.
    pub fn delete_session(&self, session_id: &SessionId) -> Result<(), SessionError> {
        {
            let _guard = self.lock_writes();
            let mut sessions = self.store.load_for_write()?;
            let before = sessions.len();
            sessions.retain(|s| s.id() != session_id);
            if sessions.len() == before {
                tracing::debug!(session_id = %session_id, "delete of unknown session ignored");
                return Ok(());
            }
            self.store.save(&sessions)?;
        }
        tracing::info!(session_id = %session_id, "deleted interrogation session");
        self.listeners.notify();
        Ok(())
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn get_session(&self, session_id: &SessionId) -> Option<Session> {
        self.store
            .load()
            .into_iter()
            .find(|s| s.id() == session_id)
    }

    #[must_use]
    pub fn get_all_sessions(&self) -> Vec<Session> {
        self.store.load()
    }

    /// Sessions whose word equals `word`, ignoring case.
    #[must_use]
    pub fn get_sessions_for_word(&self, word: &str) -> Vec<Session> {
        self.store
            .load()
            .into_iter()
            .filter(|s| s.matches_word(word))
            .collect()
    }

    /// First question without a response, in the session's fixed order.
    #[must_use]
    pub fn get_next_unanswered_question(&self, session_id: &SessionId) -> Option<Question> {
        self.get_session(session_id)
            .and_then(|s| s.next_unanswered().cloned())
    }

    /// Percentage of answered questions; `0` for an unknown session.
    #[must_use]
    pub fn get_session_progress(&self, session_id: &SessionId) -> u32 {
        self.get_session(session_id)
            .map_or(0, |s| s.progress_percent())
    }

    /// Detailed progress, `None` for an unknown session.
    #[must_use]
    pub fn progress(&self, session_id: &SessionId) -> Option<SessionProgress> {
        self.get_session(session_id)
            .map(|s| SessionProgress::of(&s))
    }

    /// Cross-session statistics over completed sessions.
    #[must_use]
    pub fn get_statistics(&self) -> Statistics {
        mnemo_core::aggregate(&self.store.load())
    }

    //
    // ─── LISTENERS ─────────────────────────────────────────────────────────────
    //

    /// Register a callback run after every successful mutation.
    ///
    /// Callbacks run on the mutating caller's stack. A callback may call back
    /// into the manager; changes it makes to the listener list apply from the
    /// next notification on.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.add(Arc::new(listener))
    }

    /// Unregister a callback. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    //
    // ─── HELPERS ───────────────────────────────────────────────────────────────
    //

    fn next_id(&self) -> SessionId {
        let counter = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        SessionId::from_parts(self.clock.now_millis(), counter)
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_mut<'a>(
    sessions: &'a mut [Session],
    session_id: &SessionId,
) -> Result<&'a mut Session, SessionError> {
    sessions
        .iter_mut()
        .find(|s| s.id() == session_id)
        .ok_or_else(|| SessionError::SessionNotFound(session_id.clone()))
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("clock", &self.clock)
            .field("storage_key", &self.store.key())
            .finish_non_exhaustive()
    }
}
