//! Moderation gate: classifies a candidate task as approved or rejected.
//!
//! The gate fails open. A reply with no JSON object, a JSON object that does
//! not parse, or a failed model call all yield an approving verdict, so a flaky
//! classifier never blocks a user.

use pipeline::{CompletionRequest, ModerationVerdict, Temperature};
use serde::Deserialize;
use tracing::{info, warn};

use crate::parsing::first_balanced;
use crate::{prompts, ModelGateway};

/// Reply budget for a verdict; only a short JSON object is expected.
const MAX_TOKENS: u32 = 150;

#[derive(Debug, Deserialize)]
struct RawVerdict {
    approved: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Runs the moderation policy against a candidate task.
#[derive(Debug, Clone)]
pub struct ModerationEvaluator {
    gateway: ModelGateway,
}

impl ModerationEvaluator {
    /// Creates an evaluator calling through `gateway`.
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    /// Classifies the task. Never fails; see the module docs.
    pub async fn evaluate(
        &self,
        title: &str,
        description: &str,
        free_prompt: &str,
    ) -> ModerationVerdict {
        let request = CompletionRequest {
            system: prompts::MODERATION_POLICY.to_string(),
            user: prompts::moderation_message(title, description, free_prompt),
            temperature: Temperature::DETERMINISTIC,
            max_tokens: MAX_TOKENS,
        };

        let verdict = match self.gateway.complete("moderation", request).await {
            Ok(reply) => parse_verdict(&reply),
            Err(e) => {
                warn!(error = %e, "moderation call failed; approving");
                ModerationVerdict::approved()
            }
        };

        info!(approved = verdict.approved, "moderation verdict");
        verdict
    }
}

/// Extracts a verdict from a raw model reply, approving when it cannot.
pub fn parse_verdict(reply: &str) -> ModerationVerdict {
    let Some(object) = first_balanced(reply, '{', '}') else {
        warn!("moderation reply has no JSON object; approving");
        return ModerationVerdict::approved();
    };

    match serde_json::from_str::<RawVerdict>(object) {
        Ok(RawVerdict { approved: true, .. }) => ModerationVerdict::approved(),
        Ok(RawVerdict {
            approved: false,
            reason,
        }) => ModerationVerdict::rejected(reason.filter(|r| !r.trim().is_empty())),
        Err(e) => {
            warn!(error = %e, "moderation reply did not parse; approving");
            ModerationVerdict::approved()
        }
    }
}
