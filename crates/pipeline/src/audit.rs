//! Audit log entries written by the usage ledger.
//!
//! Entries are append-only. One is created per moderation check and one per
//! successful description generation; nothing ever mutates or deletes them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    AuditLogId, CardId, GenerationMode, GenerationRequest, GenerationResult, ModerationVerdict,
    Timestamp, UserId,
};

/// What kind of attempt an [`AuditLogEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// A moderation check, approved or rejected.
    Moderation,
    /// A successful description generation.
    Generation,
}

/// One audited moderation or generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// Unique entry identifier.
    pub id: AuditLogId,
    /// User who made the request.
    pub user_id: UserId,
    /// Card the request was for, if any.
    pub card_id: Option<CardId>,
    /// Moderation or generation.
    #[serde(rename = "type")]
    pub kind: AuditKind,
    /// Generation strategy; set only for generation entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<GenerationMode>,
    /// Snapshot of the request text.
    pub input: Value,
    /// Snapshot of the verdict or generated content.
    pub output: Value,
    /// When the entry was created.
    pub timestamp: Timestamp,
}

impl AuditLogEntry {
    /// Builds the entry for a moderation check.
    pub fn moderation(request: &GenerationRequest, verdict: &ModerationVerdict) -> Self {
        Self {
            id: AuditLogId::new_random(),
            user_id: request.user_id.clone(),
            card_id: request.card_id.clone(),
            kind: AuditKind::Moderation,
            mode: None,
            input: input_snapshot(request, false),
            output: json!(verdict),
            timestamp: Timestamp::now(),
        }
    }

    /// Builds the entry for a successful generation.
    pub fn generation(
        request: &GenerationRequest,
        mode: GenerationMode,
        result: &GenerationResult,
    ) -> Self {
        Self {
            id: AuditLogId::new_random(),
            user_id: request.user_id.clone(),
            card_id: request.card_id.clone(),
            kind: AuditKind::Generation,
            mode: Some(mode),
            input: input_snapshot(request, mode == GenerationMode::Advanced),
            output: json!({ "content": result.content }),
            timestamp: Timestamp::now(),
        }
    }
}

fn input_snapshot(request: &GenerationRequest, with_answers: bool) -> Value {
    let mut snapshot = json!({
        "title": request.title(),
        "description": request.description(),
        "userPrompt": request.free_prompt(),
    });
    if with_answers {
        let answers: Vec<Value> = request
            .answered_questions()
            .into_iter()
            .map(|(question, answer)| json!({ "question": question, "answer": answer }))
            .collect();
        snapshot["answers"] = Value::Array(answers);
    }
    snapshot
}
