//! Success payloads returned by the orchestrator's entry points.

use pipeline::{GenerationResult, QuestionSet};
use serde::Serialize;

/// `{ "success": true, "content": ..., "usageCount": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Always `true`.
    pub success: bool,
    /// The generated description.
    pub content: String,
    /// The user's counter after this generation.
    pub usage_count: u64,
}

impl GenerateResponse {
    pub(crate) fn new(result: GenerationResult, usage_count: u64) -> Self {
        Self {
            success: true,
            content: result.content,
            usage_count,
        }
    }
}

/// `{ "success": true, "questions": [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionsResponse {
    /// Always `true`.
    pub success: bool,
    /// Clarifying questions, never empty.
    pub questions: Vec<String>,
}

/// Result of the questions entry point.
///
/// When the model has no questions the pipeline skips straight to advanced
/// generation, so the caller receives a description instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QuestionsOutcome {
    /// Questions the caller should answer before generating.
    Questions(QuestionsResponse),
    /// A description generated without a questions step.
    Generated(GenerateResponse),
}

impl QuestionsOutcome {
    pub(crate) fn questions(set: QuestionSet) -> Self {
        Self::Questions(QuestionsResponse {
            success: true,
            questions: set.into_vec(),
        })
    }
}

/// `{ "aiUsageCount": ... }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    /// Successful generations so far.
    pub ai_usage_count: u64,
}
