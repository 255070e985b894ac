use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionTypeError {
    #[error("unknown question type: {0}")]
    Unknown(String),
}

//
// ─── QUESTION TYPE ─────────────────────────────────────────────────────────────
//

/// The five question archetypes, in the order every session asks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    /// Asks for the reasons behind the term.
    Why,
    /// Asks for a plain-language explanation.
    Explain,
    /// Asks how the term relates to other knowledge.
    Connection,
    /// Asks for consequences of a counterfactual.
    WhatIf,
    /// Asks for practical application.
    How,
}

impl QuestionType {
    /// All archetypes in session order.
    pub const ALL: [QuestionType; 5] = [
        QuestionType::Why,
        QuestionType::Explain,
        QuestionType::Connection,
        QuestionType::WhatIf,
        QuestionType::How,
    ];

    /// Wire name, as persisted.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Why => "why",
            QuestionType::Explain => "explain",
            QuestionType::Connection => "connection",
            QuestionType::WhatIf => "what-if",
            QuestionType::How => "how",
        }
    }

    /// Human-readable name for display.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            QuestionType::Why => "Warum?",
            QuestionType::Explain => "Erklären",
            QuestionType::Connection => "Verbindungen",
            QuestionType::WhatIf => "Was wäre, wenn?",
            QuestionType::How => "Wie anwenden?",
        }
    }

    /// Position within a session's fixed question order.
    #[must_use]
    pub fn position(self) -> usize {
        match self {
            QuestionType::Why => 0,
            QuestionType::Explain => 1,
            QuestionType::Connection => 2,
            QuestionType::WhatIf => 3,
            QuestionType::How => 4,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = QuestionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| QuestionTypeError::Unknown(s.to_string()))
    }
}

//
// ─── CRITERIA ──────────────────────────────────────────────────────────────────
//

/// The heuristic a rubric criterion is scored with.
///
/// Evaluation dispatches on this tag, never on the display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriterionKind {
    /// Response has at least `words` whitespace-delimited tokens.
    MinimumWords { words: usize },
    /// Response contains an example marker ("zum Beispiel", "z. B.", ...).
    ContainsExample,
    /// Response has at least two clauses when split on `.`, `,` and `;`.
    MultiplePoints,
    /// Response uses causal or relational connectives.
    ExplainsConnections,
    /// Response mentions practical use.
    PracticalApplication,
    /// Response uses short words on average.
    SimpleLanguage,
    /// Response talks about outcomes of a hypothetical.
    DescribesConsequences,
    /// Response walks through ordered steps.
    DescribesSteps,
    /// Label that matches no known heuristic. Never passes, never advises.
    Unrecognized,
}

static MINIMUM_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)mindestens\s+(\d+)\s+wörter").expect("minimum-words pattern is valid")
});

impl CriterionKind {
    /// Recovers the kind from a persisted rubric label.
    ///
    /// Only used when loading stored sessions, whose criteria are plain strings.
    #[must_use]
    pub fn classify(label: &str) -> Self {
        if let Some(words) = MINIMUM_WORDS
            .captures(label)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
        {
            return CriterionKind::MinimumWords { words };
        }

        let lower = label.to_lowercase();
        if lower.contains("mindestens zwei") {
            CriterionKind::MultiplePoints
        } else if lower.contains("beispiel") {
            CriterionKind::ContainsExample
        } else if lower.contains("zusammenhänge") {
            CriterionKind::ExplainsConnections
        } else if lower.contains("praktische") {
            CriterionKind::PracticalApplication
        } else if lower.contains("einfache sprache") {
            CriterionKind::SimpleLanguage
        } else if lower.contains("konsequenzen") || lower.contains("folgen") {
            CriterionKind::DescribesConsequences
        } else if lower.contains("schritte") {
            CriterionKind::DescribesSteps
        } else {
            CriterionKind::Unrecognized
        }
    }

    /// Default rubric label; `None` for `Unrecognized`.
    #[must_use]
    pub fn default_label(self) -> Option<String> {
        let label = match self {
            CriterionKind::MinimumWords { words } => format!("Mindestens {words} Wörter"),
            CriterionKind::ContainsExample => "Enthält ein konkretes Beispiel".to_string(),
            CriterionKind::MultiplePoints => "Nennt mindestens zwei Aspekte".to_string(),
            CriterionKind::ExplainsConnections => "Erklärt Zusammenhänge".to_string(),
            CriterionKind::PracticalApplication => {
                "Beschreibt eine praktische Anwendung".to_string()
            }
            CriterionKind::SimpleLanguage => "Verwendet einfache Sprache".to_string(),
            CriterionKind::DescribesConsequences => {
                "Beschreibt mögliche Konsequenzen".to_string()
            }
            CriterionKind::DescribesSteps => "Beschreibt konkrete Schritte".to_string(),
            CriterionKind::Unrecognized => return None,
        };
        Some(label)
    }
}

/// One rubric entry: a scoring heuristic plus the label shown to the learner.
///
/// Persisted as the bare label string; the kind is re-derived on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    kind: CriterionKind,
    label: String,
}

impl Criterion {
    #[must_use]
    pub fn new(kind: CriterionKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }

    /// Criterion with the kind's default label.
    #[must_use]
    pub fn of(kind: CriterionKind) -> Self {
        let label = kind.default_label().unwrap_or_default();
        Self { kind, label }
    }

    /// Rebuilds a criterion from its stored label.
    #[must_use]
    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            kind: CriterionKind::classify(&label),
            label,
        }
    }

    #[must_use]
    pub fn kind(&self) -> CriterionKind {
        self.kind
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Serialize for Criterion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for Criterion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Criterion::from_label(label))
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A generated probing question. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    #[serde(rename = "type")]
    question_type: QuestionType,
    question_text: String,
    context: String,
    hints: Vec<String>,
    evaluation_criteria: Vec<Criterion>,
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        question_type: QuestionType,
        question_text: impl Into<String>,
        context: impl Into<String>,
        hints: Vec<String>,
        evaluation_criteria: Vec<Criterion>,
    ) -> Self {
        Self {
            id,
            question_type,
            question_text: question_text.into(),
            context: context.into(),
            hints,
            evaluation_criteria,
        }
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    #[must_use]
    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    #[must_use]
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    #[must_use]
    pub fn evaluation_criteria(&self) -> &[Criterion] {
        &self.evaluation_criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_wire_names_round_trip() {
        for kind in QuestionType::ALL {
            assert_eq!(kind.as_str().parse::<QuestionType>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("whatif".parse::<QuestionType>().is_err());
    }

    #[test]
    fn positions_follow_session_order() {
        for (index, kind) in QuestionType::ALL.iter().enumerate() {
            assert_eq!(kind.position(), index);
        }
    }

    #[test]
    fn classify_recognizes_substrings() {
        assert_eq!(
            CriterionKind::classify("Mindestens 20 Wörter"),
            CriterionKind::MinimumWords { words: 20 }
        );
        assert_eq!(
            CriterionKind::classify("Enthält ein Beispiel"),
            CriterionKind::ContainsExample
        );
        assert_eq!(
            CriterionKind::classify("Nennt mindestens zwei Gründe"),
            CriterionKind::MultiplePoints
        );
        assert_eq!(
            CriterionKind::classify("Erklärt Zusammenhänge"),
            CriterionKind::ExplainsConnections
        );
        assert_eq!(
            CriterionKind::classify("Zeigt praktische Relevanz"),
            CriterionKind::PracticalApplication
        );
        assert_eq!(
            CriterionKind::classify("Verwendet einfache Sprache"),
            CriterionKind::SimpleLanguage
        );
        assert_eq!(
            CriterionKind::classify("Bewertet die Qualität"),
            CriterionKind::Unrecognized
        );
    }

    #[test]
    fn default_labels_classify_back_to_their_kind() {
        let kinds = [
            CriterionKind::MinimumWords { words: 30 },
            CriterionKind::ContainsExample,
            CriterionKind::MultiplePoints,
            CriterionKind::ExplainsConnections,
            CriterionKind::PracticalApplication,
            CriterionKind::SimpleLanguage,
            CriterionKind::DescribesConsequences,
            CriterionKind::DescribesSteps,
        ];
        for kind in kinds {
            let label = kind.default_label().unwrap();
            assert_eq!(CriterionKind::classify(&label), kind, "{label}");
        }
        assert_eq!(CriterionKind::Unrecognized.default_label(), None);
    }

    #[test]
    fn criterion_persists_as_label() {
        let criterion = Criterion::of(CriterionKind::SimpleLanguage);
        let json = serde_json::to_string(&criterion).unwrap();
        assert_eq!(json, "\"Verwendet einfache Sprache\"");

        let restored: Criterion = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, criterion);
    }
}
