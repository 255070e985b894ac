//! Cross-session statistics over completed sessions.

use crate::model::{QuestionType, QuestionTypeStats, Session, Statistics};
use crate::scoring::{mean, round_half_up, rounded_mean};

/// Upper bound on the size of each improvement cohort.
pub const MAX_COHORT_SIZE: usize = 5;

/// Compute statistics from every session with `completed = true`.
///
/// Incomplete sessions are ignored entirely.
#[must_use]
pub fn aggregate(sessions: &[Session]) -> Statistics {
    let completed: Vec<&Session> = sessions.iter().filter(|s| s.is_completed()).collect();
    if completed.is_empty() {
        return Statistics::empty();
    }

    let average_score = rounded_mean(completed.iter().map(|s| s.overall_score()));
    let questions_answered = completed.iter().map(|s| s.responses().len()).sum();

    let question_types = question_type_stats(&completed);
    let mut ranked = question_types.clone();
    // stable: ties keep archetype order
    ranked.sort_by(|a, b| b.average_score.cmp(&a.average_score));

    Statistics {
        total_sessions: completed.len(),
        average_score,
        questions_answered,
        strongest_question_type: ranked.first().map(|s| s.question_type),
        weakest_question_type: ranked.last().map(|s| s.question_type),
        improvement_rate: improvement_rate(&completed),
        question_types,
    }
}

/// Per-archetype averages over all evaluated questions, empty buckets dropped.
fn question_type_stats(completed: &[&Session]) -> Vec<QuestionTypeStats> {
    let mut buckets: [Vec<u32>; 5] = Default::default();
    for session in completed {
        for question in session.questions() {
            if let Some(evaluation) = session.evaluation(question.id()) {
                buckets[question.question_type().position()].push(evaluation.score);
            }
        }
    }

    QuestionType::ALL
        .into_iter()
        .zip(buckets)
        .filter(|(_, scores)| !scores.is_empty())
        .map(|(question_type, scores)| QuestionTypeStats {
            question_type,
            count: scores.len(),
            average_score: rounded_mean(scores),
        })
        .collect()
}

/// Percent change of mean overall score from the earliest to the latest cohort.
///
/// Cohorts hold `min(ceil(total / 2), 5)` sessions each and overlap when the
/// total is odd and small; that overlap is part of the metric's definition.
fn improvement_rate(completed: &[&Session]) -> i64 {
    let mut chronological = completed.to_vec();
    chronological.sort_by_key(|s| s.start_time());

    let total = chronological.len();
    let cohort = total.div_ceil(2).min(MAX_COHORT_SIZE);
    let first = &chronological[..cohort];
    let last = &chronological[total - cohort..];

    let first_avg = mean(first.iter().map(|s| s.overall_score())).unwrap_or(0.0);
    let last_avg = mean(last.iter().map(|s| s.overall_score())).unwrap_or(0.0);

    if first_avg == 0.0 {
        return if last_avg > 0.0 { 100 } else { 0 };
    }
    round_half_up((last_avg - first_avg) / first_avg * 100.0)
}
