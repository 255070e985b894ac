use mnemo_core::model::{Session, SessionState};
use serde::Serialize;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    /// `round(answered / total * 100)`.
    pub percent: u32,
    pub state: SessionState,
}

impl SessionProgress {
    #[must_use]
    pub fn of(session: &Session) -> Self {
        let total = session.total_questions();
        let answered = session.answered_count();
        Self {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            percent: session.progress_percent(),
            state: session.state(),
        }
    }
}
