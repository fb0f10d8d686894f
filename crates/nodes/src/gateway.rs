//! Language-model gateway: the single choke point for every model call.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{CompletionRequest, LanguageModel, LlmError};
use tracing::{debug, info_span, warn, Instrument};

/// Wraps a [`LanguageModel`] with a hard timeout and a tracing span per call.
///
/// The gateway adds no business logic and never retries.
#[derive(Clone)]
pub struct ModelGateway {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl ModelGateway {
    /// Default bound on one call, including connection setup.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

    /// Creates a gateway with [`Self::DEFAULT_TIMEOUT`].
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns `true` if the underlying model has credentials.
    pub fn is_configured(&self) -> bool {
        self.model.is_configured()
    }

    /// Sends one request and returns the raw reply text.
    ///
    /// # Errors
    ///
    /// Propagates the model's [`LlmError`]; a call that outlives the timeout
    /// becomes [`LlmError::Timeout`].
    pub async fn complete(
        &self,
        purpose: &'static str,
        request: CompletionRequest,
    ) -> Result<String, LlmError> {
        let span = info_span!(
            "model_call",
            purpose,
            temperature = request.temperature.as_f64(),
            max_tokens = request.max_tokens
        );

        async {
            match tokio::time::timeout(self.timeout, self.model.complete(request)).await {
                Ok(Ok(text)) => {
                    debug!(chars = text.len(), "model replied");
                    Ok(text)
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "model call failed");
                    Err(e)
                }
                Err(_) => {
                    warn!(timeout_secs = self.timeout.as_secs_f64(), "model call timed out");
                    Err(LlmError::Timeout)
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
