//! Question generation: five fixed archetypes per word.

use crate::model::{Criterion, CriterionKind, Question, QuestionId, QuestionType};

/// Word count the length criterion asks for.
pub const MIN_RESPONSE_WORDS: usize = 20;

/// Build the five questions for `word`, one per archetype, in session order.
///
/// Deterministic: the same inputs always give the same questions and ids.
#[must_use]
pub fn generate_questions(word: &str, explanation: &str) -> [Question; 5] {
    QuestionType::ALL.map(|kind| build_question(kind, word, explanation))
}

fn build_question(kind: QuestionType, word: &str, explanation: &str) -> Question {
    let id = QuestionId::new(format!("{}-{}", kind.position() + 1, kind.as_str()));
    let context = format!("{word}: {explanation}");
    let min_words = Criterion::of(CriterionKind::MinimumWords {
        words: MIN_RESPONSE_WORDS,
    });

    let (text, hints, criteria) = match kind {
        QuestionType::Why => (
            format!("Warum ist „{word}“ so, wie es ist? Welche Gründe stecken dahinter?"),
            vec![
                "Denke an Ursachen und Auslöser.".to_string(),
                "Was wäre die Begründung für einen Laien?".to_string(),
                "Verbinde die Erklärung mit deinem Vorwissen.".to_string(),
            ],
            vec![
                min_words,
                Criterion::new(CriterionKind::MultiplePoints, "Nennt mindestens zwei Gründe"),
                Criterion::of(CriterionKind::ExplainsConnections),
            ],
        ),
        QuestionType::Explain => (
            format!("Wie würdest du „{word}“ einem zehnjährigen Kind erklären?"),
            vec![
                "Verzichte auf Fachbegriffe.".to_string(),
                "Ein Vergleich aus dem Alltag hilft oft.".to_string(),
            ],
            vec![
                Criterion::of(CriterionKind::SimpleLanguage),
                Criterion::new(
                    CriterionKind::ContainsExample,
                    "Enthält ein anschauliches Beispiel",
                ),
                min_words,
            ],
        ),
        QuestionType::Connection => (
            format!(
                "Womit hängt „{word}“ zusammen? Welche Verbindungen zu anderem Wissen siehst du?"
            ),
            vec![
                "Welche verwandten Begriffe kennst du?".to_string(),
                "Wo bist du dem Begriff schon begegnet?".to_string(),
                "Gibt es Gegensätze oder Oberbegriffe?".to_string(),
            ],
            vec![
                Criterion::new(CriterionKind::MultiplePoints, "Nennt mindestens zwei Verbindungen"),
                Criterion::of(CriterionKind::ExplainsConnections),
                Criterion::of(CriterionKind::ContainsExample),
                min_words,
            ],
        ),
        QuestionType::WhatIf => (
            format!("Was wäre, wenn es „{word}“ nicht gäbe oder es anders funktionieren würde?"),
            vec![
                "Spiele ein Szenario gedanklich durch.".to_string(),
                "Wer oder was wäre davon betroffen?".to_string(),
            ],
            vec![
                Criterion::of(CriterionKind::DescribesConsequences),
                Criterion::of(CriterionKind::ExplainsConnections),
                min_words,
            ],
        ),
        QuestionType::How => (
            format!("Wie kannst du „{word}“ in der Praxis anwenden?"),
            vec![
                "Denke an eine konkrete Situation aus deinem Alltag.".to_string(),
                "Beschreibe, was du Schritt für Schritt tun würdest.".to_string(),
            ],
            vec![
                Criterion::of(CriterionKind::PracticalApplication),
                Criterion::of(CriterionKind::ContainsExample),
                Criterion::of(CriterionKind::DescribesSteps),
                min_words,
            ],
        ),
    };

    Question::new(id, kind, text, context, hints, criteria)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_one_question_per_archetype_in_order() {
        let questions = generate_questions("Osmose", "Diffusion durch eine Membran.");
        let kinds: Vec<_> = questions.iter().map(Question::question_type).collect();
        assert_eq!(kinds, QuestionType::ALL.to_vec());
    }

    #[test]
    fn every_question_mentions_the_word() {
        for word in ["Osmose", "Entropie", "x"] {
            for question in generate_questions(word, "Erklärung") {
                assert!(question.question_text().contains(word));
                assert!(question.context().contains("Erklärung"));
            }
        }
    }

    #[test]
    fn rubric_sizes_stay_within_bounds() {
        for question in generate_questions("Osmose", "Diffusion") {
            let hints = question.hints().len();
            let criteria = question.evaluation_criteria().len();
            assert!((2..=3).contains(&hints), "{hints} hints");
            assert!((3..=4).contains(&criteria), "{criteria} criteria");
        }
    }

    #[test]
    fn question_ids_are_unique_and_stable() {
        let first = generate_questions("Osmose", "Diffusion");
        let second = generate_questions("Osmose", "Diffusion");
        let ids: Vec<_> = first.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, ["1-why", "2-explain", "3-connection", "4-what-if", "5-how"]);
        assert_eq!(first, second);
    }

    #[test]
    fn labels_reclassify_to_the_generated_kind() {
        for question in generate_questions("Osmose", "Diffusion") {
            for criterion in question.evaluation_criteria() {
                assert_eq!(
                    CriterionKind::classify(criterion.label()),
                    criterion.kind(),
                    "{}",
                    criterion.label()
                );
            }
        }
    }
}
