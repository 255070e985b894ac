use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evaluator::evaluate_response;
use crate::generator::generate_questions;
use crate::model::{Evaluation, Question, QuestionId, SessionId};
use crate::scoring::{percent, rounded_mean};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionModelError {
    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle position of a session, derived from its answers and completion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    /// No question answered yet.
    Created,
    /// Some, but not all, questions answered.
    InProgress,
    /// Every question answered, not yet completed.
    AllAnswered,
    /// Terminal. Only deletion removes a completed session.
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Created => "created",
            SessionState::InProgress => "in-progress",
            SessionState::AllAnswered => "all-answered",
            SessionState::Completed => "completed",
        };
        f.write_str(name)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One interrogation attempt about a single word/explanation pair.
///
/// The serialized shape is the persisted record format; field names are
/// camelCase and `endTime` is omitted until the session is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    word: String,
    explanation: String,
    start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<DateTime<Utc>>,
    questions: Vec<Question>,
    #[serde(default)]
    responses: BTreeMap<QuestionId, String>,
    #[serde(default)]
    evaluations: BTreeMap<QuestionId, Evaluation>,
    #[serde(default)]
    overall_score: u32,
    #[serde(default)]
    completed: bool,
}

impl Session {
    /// Start a fresh session with the five generated questions and no answers.
    #[must_use]
    pub fn start(
        id: SessionId,
        word: impl Into<String>,
        explanation: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let word = word.into();
        let explanation = explanation.into();
        let questions = generate_questions(&word, &explanation).to_vec();
        Self {
            id,
            word,
            explanation,
            start_time: started_at,
            end_time: None,
            questions,
            responses: BTreeMap::new(),
            evaluations: BTreeMap::new(),
            overall_score: 0,
            completed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn responses(&self) -> &BTreeMap<QuestionId, String> {
        &self.responses
    }

    #[must_use]
    pub fn evaluations(&self) -> &BTreeMap<QuestionId, Evaluation> {
        &self.evaluations
    }

    /// Rounded mean of the evaluation scores; meaningful once completed.
    #[must_use]
    pub fn overall_score(&self) -> u32 {
        self.overall_score
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn response(&self, id: &QuestionId) -> Option<&str> {
        self.responses.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn evaluation(&self, id: &QuestionId) -> Option<&Evaluation> {
        self.evaluations.get(id)
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Number of questions with a recorded response.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.responses.contains_key(q.id()))
            .count()
    }

    /// First question, in session order, that has no response yet.
    #[must_use]
    pub fn next_unanswered(&self) -> Option<&Question> {
        self.questions
            .iter()
            .find(|q| !self.responses.contains_key(q.id()))
    }

    /// `round(answered / total * 100)`, `0` for a session without questions.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        percent(self.answered_count(), self.total_questions())
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.completed {
            return SessionState::Completed;
        }
        let answered = self.answered_count();
        if answered == 0 {
            SessionState::Created
        } else if answered < self.total_questions() {
            SessionState::InProgress
        } else {
            SessionState::AllAnswered
        }
    }

    /// Case-insensitive exact match against this session's word.
    #[must_use]
    pub fn matches_word(&self, word: &str) -> bool {
        self.word.to_lowercase() == word.to_lowercase()
    }

    /// Score `response` for the given question and store both, replacing any
    /// earlier answer to that question.
    ///
    /// Completed sessions accept answers too; their overall score is left as is.
    ///
    /// # Errors
    ///
    /// Returns `SessionModelError::UnknownQuestion` if the id is not one of this
    /// session's questions.
    pub fn record_answer(
        &mut self,
        question_id: &QuestionId,
        response: impl Into<String>,
    ) -> Result<&Evaluation, SessionModelError> {
        let response = response.into();
        let evaluation = {
            let question = self
                .question(question_id)
                .ok_or_else(|| SessionModelError::UnknownQuestion(question_id.clone()))?;
            evaluate_response(&response, question)
        };

        self.responses.insert(question_id.clone(), response);
        let slot = match self.evaluations.entry(question_id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.insert(evaluation);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(evaluation),
        };
        Ok(slot)
    }

    /// Mark the session completed and compute its overall score.
    ///
    /// Unanswered questions are allowed; with no evaluations the score is `0`.
    pub fn complete(&mut self, completed_at: DateTime<Utc>) {
        self.end_time = Some(completed_at);
        self.completed = true;
        self.overall_score = rounded_mean(self.evaluations.values().map(|e| e.score));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionType;
    use crate::time::fixed_now;

    fn session() -> Session {
        Session::start(
            SessionId::from_parts(1, 0),
            "Photosynthese",
            "Pflanzen wandeln Licht in chemische Energie um.",
            fixed_now(),
        )
    }

    #[test]
    fn new_session_is_created_and_empty() {
        let session = session();
        assert_eq!(session.state(), SessionState::Created);
        assert_eq!(session.total_questions(), 5);
        assert!(session.responses().is_empty());
        assert!(session.evaluations().is_empty());
        assert!(!session.is_completed());
        assert_eq!(session.progress_percent(), 0);
    }

    #[test]
    fn answering_walks_through_states() {
        let mut session = session();
        let ids: Vec<_> = session.questions().iter().map(|q| q.id().clone()).collect();

        session.record_answer(&ids[0], "Weil Licht Energie liefert.").unwrap();
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(
            session.next_unanswered().unwrap().question_type(),
            QuestionType::Explain
        );

        for id in &ids[1..] {
            session.record_answer(id, "Eine Antwort.").unwrap();
        }
        assert_eq!(session.state(), SessionState::AllAnswered);
        assert!(session.next_unanswered().is_none());
        assert_eq!(session.progress_percent(), 100);

        session.complete(fixed_now());
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.end_time(), Some(fixed_now()));
    }

    #[test]
    fn resubmitting_overwrites_previous_answer() {
        let mut session = session();
        let id = session.questions()[2].id().clone();

        session.record_answer(&id, "kurz").unwrap();
        session.record_answer(&id, "etwas länger").unwrap();

        assert_eq!(session.responses().len(), 1);
        assert_eq!(session.evaluations().len(), 1);
        assert_eq!(session.response(&id), Some("etwas länger"));
    }

    #[test]
    fn unknown_question_is_rejected_without_mutation() {
        let mut session = session();
        let err = session
            .record_answer(&QuestionId::new("nope"), "text")
            .unwrap_err();
        assert_eq!(err, SessionModelError::UnknownQuestion(QuestionId::new("nope")));
        assert!(session.responses().is_empty());
    }

    #[test]
    fn completing_without_answers_scores_zero() {
        let mut session = session();
        session.complete(fixed_now());
        assert!(session.is_completed());
        assert_eq!(session.overall_score(), 0);
    }

    #[test]
    fn word_matching_ignores_case() {
        let session = session();
        assert!(session.matches_word("photosynthese"));
        assert!(session.matches_word("PHOTOSYNTHESE"));
        assert!(!session.matches_word("Photo"));
    }

    #[test]
    fn persisted_shape_uses_camel_case_and_omits_missing_end_time() {
        let session = session();
        let value = serde_json::to_value(&session).unwrap();
        assert!(value.get("startTime").is_some());
        assert!(value.get("endTime").is_none());
        assert_eq!(value["overallScore"], 0);
        assert_eq!(value["questions"][3]["type"], "what-if");
        assert!(value["questions"][0]["questionText"].is_string());
        assert!(value["questions"][0]["evaluationCriteria"][0].is_string());

        let restored: Session = serde_json::from_value(value).unwrap();
        assert_eq!(restored, session);
    }
}
