use serde::{Deserialize, Serialize};

/// Result of scoring one free-text response against one question's rubric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Share of matched criteria, `0..=100`.
    pub score: u32,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    /// Labels of the criteria the response satisfied.
    pub criteria_matched: Vec<String>,
}
