//! Error types for the generation pipeline.
//!
//! [`PipelineError`] is what an entry point returns to the transport layer.
//! [`LlmError`] and [`StoreError`] are produced by the infrastructure behind
//! the [`crate::LanguageModel`] and [`crate::RecordStore`] ports; the
//! orchestrator converts them at its boundary so no infrastructure detail ever
//! reaches a caller.

use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// User-facing messages
// ---------------------------------------------------------------------------

/// Shown when the title is missing.
pub const MSG_TITLE_REQUIRED: &str = "A task title is required.";

/// Shown when the language model is not configured.
pub const MSG_SERVICE_UNAVAILABLE: &str =
    "AI content generation is not available. Please contact an administrator.";

/// Summary shown with every moderation rejection.
pub const MSG_CONTENT_REJECTED: &str = "Content not allowed";

/// Shown when content is rejected and the classifier gave no reason.
pub const MSG_POLICY_FALLBACK: &str =
    "The content does not comply with our usage policy. Please rephrase your task.";

/// Shown when credentials for the language model are wrong.
pub const MSG_MISCONFIGURED: &str =
    "The AI service is misconfigured. Please contact an administrator.";

/// Shown for every other failure.
pub const MSG_GENERATION_FAILED: &str = "Failed to generate content. Please try again later.";

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Terminal non-success outcomes of a pipeline entry point.
///
/// `Display` carries operator-facing detail; [`Self::to_body`] carries the only
/// text a caller ever sees.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The title is missing or blank. No side effects happened.
    #[error("title is required")]
    Validation,

    /// The language model is not configured. Returned before any store access.
    #[error("language model is not configured")]
    ServiceUnavailable,

    /// The moderation gate rejected the content.
    ///
    /// A normal terminal state rather than a fault; `reason` is always
    /// non-empty.
    #[error("content rejected by moderation: {reason}")]
    ModerationRejected {
        /// User-facing rejection reason.
        reason: String,
    },

    /// The language model rejected its credentials.
    #[error("language model credentials rejected: {0}")]
    Configuration(#[source] LlmError),

    /// Any other model failure: transport, non-success status, timeout,
    /// malformed reply.
    #[error("generation failed: {0}")]
    Generation(#[source] LlmError),

    /// The record store could not be read or written.
    #[error("record store failure: {0}")]
    Storage(#[from] StoreError),
}

impl PipelineError {
    /// Builds a rejection, substituting the policy fallback for a blank reason.
    pub fn rejected(reason: Option<String>) -> Self {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| MSG_POLICY_FALLBACK.to_string());
        Self::ModerationRejected { reason }
    }

    /// Maps a model failure to the configuration or generic generation error.
    pub fn from_llm(err: LlmError) -> Self {
        if err.is_configuration() {
            Self::Configuration(err)
        } else {
            Self::Generation(err)
        }
    }

    /// HTTP-equivalent status for the transport layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation | Self::ModerationRejected { .. } => 400,
            Self::ServiceUnavailable => 503,
            Self::Configuration(_) | Self::Generation(_) | Self::Storage(_) => 500,
        }
    }

    /// The response body shown to the caller.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            Self::Validation => ErrorBody::new(MSG_TITLE_REQUIRED),
            Self::ServiceUnavailable => ErrorBody::new(MSG_SERVICE_UNAVAILABLE),
            Self::ModerationRejected { reason } => ErrorBody {
                error: MSG_CONTENT_REJECTED.to_string(),
                reason: Some(reason.clone()),
            },
            Self::Configuration(_) => ErrorBody::new(MSG_MISCONFIGURED),
            Self::Generation(_) | Self::Storage(_) => ErrorBody::new(MSG_GENERATION_FAILED),
        }
    }
}

/// Failure payload: `{ "error": ..., "reason": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// User-facing summary.
    pub error: String,
    /// Moderation reason; present only for rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ErrorBody {
    fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            reason: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Failures of a single language-model call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API credential is configured.
    #[error("no API key configured")]
    MissingCredentials,

    /// The API refused the credential (401/403).
    #[error("API rejected credentials ({status})")]
    Unauthorized {
        /// HTTP status code returned.
        status: u16,
    },

    /// The call did not finish within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Network or connection failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// The reply could not be understood.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Returns `true` for credential problems an operator must fix.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::Unauthorized { .. })
    }
}

/// Failures of the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document is not valid.
    #[error("document error: {0}")]
    Document(#[from] serde_json::Error),
}
