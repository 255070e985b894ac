//! Shared error types for the services crate.

use thiserror::Error;

use mnemo_core::model::{QuestionId, SessionId};
use storage::StorageError;

/// Errors emitted by `SessionManager`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("question {question_id} not found in session {session_id}")]
    QuestionNotFound {
        session_id: SessionId,
        question_id: QuestionId,
    },
    /// A domain rule rejected the change.
    #[error(transparent)]
    Model(#[from] mnemo_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
