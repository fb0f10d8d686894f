//! HTTP adapter for the chat-completions API.

use async_trait::async_trait;
use pipeline::{CompletionRequest, LanguageModel, LlmError};
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use crate::wire::{ChatRequest, ChatResponse};
use crate::ProviderConfig;

/// [`LanguageModel`] over an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl OpenAiCompatibleProvider {
    /// Builds the provider and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Transport`] if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialise).
    pub fn new(config: ProviderConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Model name sent with every request.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleProvider {
    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    #[instrument(
        skip(self, request),
        fields(model = %self.config.model, temperature = %request.temperature, max_tokens = request.max_tokens)
    )]
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingCredentials)?;

        let body = ChatRequest::from_completion(&self.config.model, &request);
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_response(response).await?;
        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let text = reply.into_text()?;
        debug!(chars = text.len(), "completion received");
        Ok(text)
    }
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Transport(e.to_string())
    }
}

/// Maps credential rejections and non-success statuses to [`LlmError`].
///
/// Returns the response unchanged on success.
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        warn!(status = status.as_u16(), "language model rejected credentials");
        return Err(LlmError::Unauthorized {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(LlmError::Api {
            status: status.as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}
