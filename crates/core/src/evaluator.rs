//! Heuristic scoring of free-text responses.
//!
//! Each rubric criterion is checked with a length, keyword or clause-count
//! heuristic selected by its [`CriterionKind`]. There is no language
//! understanding here: the checks look at surface patterns only.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Criterion, CriterionKind, Evaluation, Question};
use crate::scoring::percent;

pub const FEEDBACK_EXCELLENT: &str =
    "Ausgezeichnet! Du hast den Begriff gründlich durchdacht und sehr gut erklärt.";
pub const FEEDBACK_GOOD: &str =
    "Gut gemacht! Deine Antwort zeigt ein solides Verständnis des Begriffs.";
pub const FEEDBACK_SOLID_BASIS: &str =
    "Eine solide Basis. Mit etwas mehr Tiefe wird deine Antwort noch stärker.";
pub const FEEDBACK_BRIEF: &str =
    "Ein guter Anfang! Versuche, ausführlicher und genauer zu antworten.";

/// Suggestions used when a weak response produced no targeted advice.
pub const FALLBACK_IMPROVEMENTS: [&str; 3] = [
    "Nimm dir mehr Zeit für deine Antwort.",
    "Versuche, tiefer in das Thema einzusteigen.",
    "Nutze die Hinweise als Denkanstoß.",
];

/// Longest average word length still counted as simple language.
const SIMPLE_LANGUAGE_MAX_AVG_WORD_LEN: f64 = 7.0;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("evaluator pattern is valid")
}

static EXAMPLE_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)beispiel|\bz\.\s?b\.|\bzb\b|\betwa\b|\bwie bei\b|\bstell dir vor\b|\bnehmen wir an\b",
    )
});

static CONNECTIVES: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)\b(?:weil|da|denn|deshalb|daher|dadurch|darum|somit|folglich|sodass)\b|zusammenh|verbind|beeinfluss|führt zu|hängt",
    )
});

static PRACTICAL_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)anwend|praxis|praktisch|alltag|\bnutz|benutz|verwend|einsetz|\bnützlich",
    )
});

static CONSEQUENCE_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)\b(?:würde|würden|wäre|wären|könnte|könnten|hätte|hätten|ohne)\b|folge|konsequenz|auswirk",
    )
});

static STEP_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?i)\b(?:zuerst|erstens|zweitens|drittens|dann|danach|anschließend|schließlich|zuletzt)\b|schritt",
    )
});

/// Number of whitespace-delimited tokens; `0` for blank input.
#[must_use]
pub fn word_count(response: &str) -> usize {
    response.split_whitespace().count()
}

/// Clauses left after splitting on `.`, `,` and `;` and dropping blanks.
#[must_use]
pub fn clause_count(response: &str) -> usize {
    response
        .split(['.', ',', ';'])
        .filter(|clause| !clause.trim().is_empty())
        .count()
}

#[allow(clippy::cast_precision_loss)]
fn average_word_length(response: &str) -> Option<f64> {
    let lengths: Vec<usize> = response
        .split_whitespace()
        .map(|token| token.chars().filter(|c| c.is_alphanumeric()).count())
        .filter(|len| *len > 0)
        .collect();
    if lengths.is_empty() {
        return None;
    }
    Some(lengths.iter().sum::<usize>() as f64 / lengths.len() as f64)
}

/// What a single criterion check contributed.
enum Outcome {
    Matched(String),
    Missed(String),
    Silent,
}

fn check(criterion: &Criterion, response: &str, words: usize) -> Outcome {
    match criterion.kind() {
        CriterionKind::MinimumWords { words: required } => {
            if words >= required {
                Outcome::Matched(format!("Ausführliche Antwort mit {words} Wörtern"))
            } else {
                Outcome::Missed(format!(
                    "Schreibe ausführlicher: mindestens {required} Wörter (bisher {words})."
                ))
            }
        }
        CriterionKind::ContainsExample => {
            if EXAMPLE_MARKERS.is_match(response) {
                Outcome::Matched("Konkretes Beispiel genannt".to_string())
            } else {
                Outcome::Missed(
                    "Füge ein konkretes Beispiel hinzu, z. B. aus deinem Alltag.".to_string(),
                )
            }
        }
        CriterionKind::MultiplePoints => {
            if clause_count(response) >= 2 {
                Outcome::Matched("Mehrere Aspekte berücksichtigt".to_string())
            } else {
                Outcome::Missed("Nenne mindestens zwei verschiedene Aspekte.".to_string())
            }
        }
        CriterionKind::ExplainsConnections => {
            if CONNECTIVES.is_match(response) {
                Outcome::Matched("Zusammenhänge gut erklärt".to_string())
            } else {
                Outcome::Missed(
                    "Erkläre, wie die Dinge zusammenhängen (z. B. mit „weil“ oder „deshalb“)."
                        .to_string(),
                )
            }
        }
        CriterionKind::PracticalApplication => {
            if PRACTICAL_MARKERS.is_match(response) {
                Outcome::Matched("Praktische Anwendung beschrieben".to_string())
            } else {
                Outcome::Missed(
                    "Beschreibe, wie du das Wissen praktisch anwenden kannst.".to_string(),
                )
            }
        }
        CriterionKind::SimpleLanguage => match average_word_length(response) {
            Some(avg) if avg <= SIMPLE_LANGUAGE_MAX_AVG_WORD_LEN => {
                Outcome::Matched("Verständliche, einfache Sprache".to_string())
            }
            _ => Outcome::Missed("Verwende kürzere, einfachere Wörter.".to_string()),
        },
        CriterionKind::DescribesConsequences => {
            if CONSEQUENCE_MARKERS.is_match(response) {
                Outcome::Matched("Mögliche Konsequenzen durchdacht".to_string())
            } else {
                Outcome::Missed("Überlege, welche Folgen sich ergeben würden.".to_string())
            }
        }
        CriterionKind::DescribesSteps => {
            if STEP_MARKERS.is_match(response) {
                Outcome::Matched("Klare Schritte beschrieben".to_string())
            } else {
                Outcome::Missed(
                    "Beschreibe die einzelnen Schritte (zuerst, dann, danach).".to_string(),
                )
            }
        }
        CriterionKind::Unrecognized => Outcome::Silent,
    }
}

/// The fixed feedback message for a score band.
#[must_use]
pub fn feedback_for(score: u32) -> &'static str {
    match score {
        80.. => FEEDBACK_EXCELLENT,
        60..=79 => FEEDBACK_GOOD,
        40..=59 => FEEDBACK_SOLID_BASIS,
        _ => FEEDBACK_BRIEF,
    }
}

/// Score `response` against `question`'s rubric.
///
/// `score = round(matched / criteria * 100)`. Scores below 60 without any
/// targeted improvement get the generic [`FALLBACK_IMPROVEMENTS`].
#[must_use]
pub fn evaluate_response(response: &str, question: &Question) -> Evaluation {
    let words = word_count(response);
    let criteria = question.evaluation_criteria();

    let mut criteria_matched = Vec::new();
    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    for criterion in criteria {
        match check(criterion, response, words) {
            Outcome::Matched(strength) => {
                criteria_matched.push(criterion.label().to_string());
                strengths.push(strength);
            }
            Outcome::Missed(advice) => improvements.push(advice),
            Outcome::Silent => {}
        }
    }

    let score = percent(criteria_matched.len(), criteria.len());
    if score < 60 && improvements.is_empty() {
        improvements.extend(FALLBACK_IMPROVEMENTS.iter().map(ToString::to_string));
    }

    Evaluation {
        score,
        feedback: feedback_for(score).to_string(),
        strengths,
        improvements,
        criteria_matched,
    }
}
