use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::QuestionType;

/// Average evaluation score for one question archetype across completed sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTypeStats {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub average_score: u32,
    pub count: usize,
}

/// Cross-session metrics over completed sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_sessions: usize,
    pub average_score: u32,
    pub questions_answered: usize,
    /// `None` (serialized as `"none"`) when nothing has been evaluated.
    #[serde(with = "type_or_none")]
    pub strongest_question_type: Option<QuestionType>,
    #[serde(with = "type_or_none")]
    pub weakest_question_type: Option<QuestionType>,
    /// Percent change between the earliest and latest cohorts; may be negative.
    pub improvement_rate: i64,
    /// Non-empty archetype buckets, in archetype order.
    #[serde(default)]
    pub question_types: Vec<QuestionTypeStats>,
}

impl Statistics {
    /// The result for a store without completed sessions.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_sessions: 0,
            average_score: 0,
            questions_answered: 0,
            strongest_question_type: None,
            weakest_question_type: None,
            improvement_rate: 0,
            question_types: Vec::new(),
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::empty()
    }
}

mod type_or_none {
    use super::{Deserialize, Deserializer, QuestionType, Serializer};

    const NONE: &str = "none";

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<QuestionType>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.map_or(NONE, QuestionType::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<QuestionType>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == NONE {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(serde::de::Error::custom)
    }
}
