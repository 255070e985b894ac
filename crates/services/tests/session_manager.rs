use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use mnemo_core::model::{QuestionId, QuestionType, SessionId, SessionState};
use mnemo_core::time::fixed_clock;
use services::{DEFAULT_STORAGE_KEY, SessionError, SessionManager};
use storage::{InMemoryStore, KeyValueStore, SqliteStore, StorageError};

const WORD: &str = "Photosynthese";
const EXPLANATION: &str = "Pflanzen wandeln Lichtenergie in chemische Energie um.";

const DETAILED_ANSWER: &str = "Pflanzen brauchen Energie, weil sie wachsen müssen. \
    Zum Beispiel nutzt ein Baum das Sonnenlicht, deshalb bildet er Zucker. \
    Außerdem entsteht dabei Sauerstoff, den wir atmen.";

fn manager() -> (SessionManager, InMemoryStore) {
    let kv = InMemoryStore::new();
    (SessionManager::new(Arc::new(kv.clone()), fixed_clock()), kv)
}

fn question_ids(manager: &SessionManager, id: &SessionId) -> Vec<QuestionId> {
    manager
        .get_session(id)
        .unwrap()
        .questions()
        .iter()
        .map(|q| q.id().clone())
        .collect()
}

/// Store whose writes always fail.
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }
}

/// Store whose next read fails, as a locked database would.
#[derive(Clone, Default)]
struct FlakyReadStore {
    inner: InMemoryStore,
    fail_next_get: Arc<AtomicBool>,
}

impl FlakyReadStore {
    fn fail_next_read(&self) {
        self.fail_next_get.store(true, Ordering::SeqCst);
    }
}

impl KeyValueStore for FlakyReadStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_next_get.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Connection("database is locked".into()));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value)
    }
}

#[test]
fn start_session_persists_five_questions() {
    let (manager, kv) = manager();
    let session = manager.start_session(WORD, EXPLANATION).unwrap();

    assert_eq!(session.word(), WORD);
    assert_eq!(session.explanation(), EXPLANATION);
    assert_eq!(session.questions().len(), 5);
    assert!(!session.is_completed());
    assert_eq!(session.overall_score(), 0);
    assert!(session.end_time().is_none());

    let stored = kv.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    assert!(stored.contains(session.id().as_str()));
    assert_eq!(manager.get_session(session.id()), Some(session));
}

#[test]
fn progress_counts_answered_questions() {
    let (manager, _) = manager();
    let session = manager.start_session(WORD, EXPLANATION).unwrap();
    let ids = question_ids(&manager, session.id());

    manager.submit_response(session.id(), &ids[0], "Weil Licht Energie liefert.").unwrap();
    manager.submit_response(session.id(), &ids[1], "Pflanzen essen Licht.").unwrap();

    assert_eq!(manager.get_session_progress(session.id()), 40);
    let progress = manager.progress(session.id()).unwrap();
    assert_eq!(progress.answered, 2);
    assert_eq!(progress.remaining, 3);
    assert_eq!(progress.state, SessionState::InProgress);

    let next = manager.get_next_unanswered_question(session.id()).unwrap();
    assert_eq!(next.question_type(), QuestionType::Connection);
}

#[test]
fn submit_response_returns_stored_evaluation() {
    let (manager, _) = manager();
    let session = manager.start_session(WORD, EXPLANATION).unwrap();
    let ids = question_ids(&manager, session.id());

    let evaluation = manager
        .submit_response(session.id(), &ids[0], DETAILED_ANSWER)
        .unwrap();
    assert!(evaluation.score <= 100);
    assert!(!evaluation.feedback.is_empty());

    let stored = manager.get_session(session.id()).unwrap();
    assert_eq!(stored.response(&ids[0]), Some(DETAILED_ANSWER));
    assert_eq!(stored.evaluation(&ids[0]), Some(&evaluation));
}

#[test]
fn resubmitting_replaces_the_previous_answer() {
    let (manager, _) = manager();
    let session = manager.start_session(WORD, EXPLANATION).unwrap();
    let ids = question_ids(&manager, session.id());

    let first = manager.submit_response(session.id(), &ids[0], "kurz").unwrap();
    let second = manager.submit_response(session.id(), &ids[0], "kurz").unwrap();
    assert_eq!(first, second);

    manager.submit_response(session.id(), &ids[0], DETAILED_ANSWER).unwrap();
    let stored = manager.get_session(session.id()).unwrap();
    assert_eq!(stored.responses().len(), 1);
    assert_eq!(stored.response(&ids[0]), Some(DETAILED_ANSWER));
    assert_eq!(manager.get_session_progress(session.id()), 20);
}

#[test]
fn unknown_session_and_question_are_reported() {
    let (manager, _) = manager();
    let session = manager.start_session(WORD, EXPLANATION).unwrap();
    let missing = SessionId::new("missing");

    let err = manager
        .submit_response(&missing, &QuestionId::new("1-why"), "text")
        .unwrap_err();
    assert!(matches!(err, SessionError::SessionNotFound(id) if id == missing));

    let err = manager
        .submit_response(session.id(), &QuestionId::new("9-nope"), "text")
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::QuestionNotFound { ref question_id, .. } if question_id.as_str() == "9-nope"
    ));

    let err = manager.complete_session(&missing).unwrap_err();
    assert!(matches!(err, SessionError::SessionNotFound(_)));

    assert!(manager.get_session(&missing).is_none());
    assert!(manager.get_next_unanswered_question(&missing).is_none());
    assert_eq!(manager.get_session_progress(&missing), 0);
    assert!(manager.progress(&missing).is_none());
}

#[test]
fn completing_averages_the_evaluations() {
    let (manager, _) = manager();
    let session = manager.start_session(WORD, EXPLANATION).unwrap();
    let ids = question_ids(&manager, session.id());

    let scores: Vec<u32> = [DETAILED_ANSWER, "kurz", "Weil es so ist, zum Beispiel heute."]
        .iter()
        .zip(&ids)
        .map(|(text, id)| manager.submit_response(session.id(), id, text).unwrap().score)
        .collect();
    let sum: u32 = scores.iter().sum();
    let expected = (f64::from(sum) / 3.0 + 0.5).floor() as u32;

    let completed = manager.complete_session(session.id()).unwrap();
    assert!(completed.is_completed());
    assert!(completed.end_time().is_some());
    assert_eq!(completed.overall_score(), expected);
    assert_eq!(completed.state(), SessionState::Completed);
    assert_eq!(manager.get_session(session.id()), Some(completed));
}

#[test]
fn completing_without_answers_scores_zero() {
    let (manager, _) = manager();
    let session = manager.start_session(WORD, EXPLANATION).unwrap();
    let completed = manager.complete_session(session.id()).unwrap();
    assert!(completed.is_completed());
    assert_eq!(completed.overall_score(), 0);
}

#[test]
fn completed_sessions_still_accept_answers() {
    let (manager, _) = manager();
    let session = manager.start_session(WORD, EXPLANATION).unwrap();
    let ids = question_ids(&manager, session.id());
    manager.complete_session(session.id()).unwrap();

    manager.submit_response(session.id(), &ids[0], DETAILED_ANSWER).unwrap();
    let stored = manager.get_session(session.id()).unwrap();
    assert!(stored.is_completed());
    assert_eq!(stored.answered_count(), 1);
    assert_eq!(stored.overall_score(), 0);
}

#[test]
fn delete_removes_only_the_target() {
    let (manager, _) = manager();
    let keep = manager.start_session("Eins", "a").unwrap();
    let gone = manager.start_session("Zwei", "b").unwrap();

    manager.delete_session(gone.id()).unwrap();
    assert!(manager.get_session(gone.id()).is_none());
    assert_eq!(manager.get_all_sessions(), vec![keep]);
}

#[test]
fn words_match_case_insensitively() {
    let (manager, _) = manager();
    manager.start_session("Osmose", "a").unwrap();
    manager.start_session("osmose", "b").unwrap();
    manager.start_session("Diffusion", "c").unwrap();

    assert_eq!(manager.get_sessions_for_word("OSMOSE").len(), 2);
    assert_eq!(manager.get_sessions_for_word("diffusion").len(), 1);
    assert!(manager.get_sessions_for_word("Osmo").is_empty());
}

#[test]
fn sessions_keep_insertion_order() {
    let (manager, _) = manager();
    let words = ["Eins", "Zwei", "Drei"];
    for word in words {
        manager.start_session(word, "Erklärung").unwrap();
    }
    let stored: Vec<_> = manager
        .get_all_sessions()
        .iter()
        .map(|s| s.word().to_string())
        .collect();
    assert_eq!(stored, words);
}

#[test]
fn listeners_fire_once_per_successful_mutation() {
    let (manager, _) = manager();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = manager.add_listener(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let session = manager.start_session(WORD, EXPLANATION).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let ids = question_ids(&manager, session.id());
    manager.submit_response(session.id(), &ids[0], "Antwort").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    manager.complete_session(session.id()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    manager.delete_session(session.id()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    // failures and no-ops stay silent
    let _ = manager.complete_session(session.id());
    manager.delete_session(session.id()).unwrap();
    let _ = manager.get_statistics();
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    assert!(manager.remove_listener(id));
    assert!(!manager.remove_listener(id));
    manager.start_session(WORD, EXPLANATION).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn corrupt_payload_reads_as_empty() {
    let kv = InMemoryStore::new().with_entry(DEFAULT_STORAGE_KEY, "invalid json");
    let manager = SessionManager::new(Arc::new(kv), fixed_clock());

    assert!(manager.get_all_sessions().is_empty());
    assert!(manager.get_session(&SessionId::new("x")).is_none());
    assert_eq!(manager.get_statistics().total_sessions, 0);

    // the next write replaces the corrupt payload
    manager.start_session(WORD, EXPLANATION).unwrap();
    assert_eq!(manager.get_all_sessions().len(), 1);
}

#[test]
fn failed_writes_surface_and_do_not_notify() {
    let manager = SessionManager::new(Arc::new(ReadOnlyStore), fixed_clock());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    manager.add_listener(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let err = manager.start_session(WORD, EXPLANATION).unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn sqlite_backend_shares_state_between_managers() {
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let writer = SessionManager::new(Arc::clone(&store), fixed_clock());
    let reader = SessionManager::new(store, fixed_clock());

    let session = writer.start_session(WORD, EXPLANATION).unwrap();
    let ids = question_ids(&writer, session.id());
    writer.submit_response(session.id(), &ids[0], DETAILED_ANSWER).unwrap();
    writer.complete_session(session.id()).unwrap();

    let loaded = reader.get_session(session.id()).unwrap();
    assert!(loaded.is_completed());
    assert_eq!(loaded.answered_count(), 1);
    assert_eq!(reader.get_statistics().total_sessions, 1);
}

#[test]
fn failed_reads_abort_mutations_without_losing_sessions() {
    let kv = FlakyReadStore::default();
    let manager = SessionManager::new(Arc::new(kv.clone()), fixed_clock());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    manager.add_listener(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let first = manager.start_session("Eins", "a").unwrap();
    manager.start_session("Zwei", "b").unwrap();
    manager.start_session("Drei", "c").unwrap();
    let before = manager.get_all_sessions();
    let ids = question_ids(&manager, first.id());
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    kv.fail_next_read();
    let err = manager.start_session("Vier", "d").unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));

    kv.fail_next_read();
    let err = manager.submit_response(first.id(), &ids[0], "Antwort").unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));

    kv.fail_next_read();
    let err = manager.complete_session(first.id()).unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));

    kv.fail_next_read();
    let err = manager.delete_session(first.id()).unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));

    assert_eq!(manager.get_all_sessions(), before);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    manager.start_session("Vier", "d").unwrap();
    assert_eq!(manager.get_all_sessions().len(), 4);
}

#[test]
fn managers_sharing_a_store_never_reuse_ids() {
    let kv = InMemoryStore::new();
    let first = SessionManager::new(Arc::new(kv.clone()), fixed_clock());
    let second = SessionManager::new(Arc::new(kv), fixed_clock());

    let a = first.start_session("Eins", "a").unwrap();
    let b = second.start_session("Zwei", "b").unwrap();
    assert_eq!(a.start_time(), b.start_time());
    assert_ne!(a.id(), b.id());

    first.delete_session(a.id()).unwrap();
    assert_eq!(second.get_all_sessions(), vec![b]);
}
