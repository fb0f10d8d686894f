//! taskgen language-model infrastructure adapter.
//!
//! Implements the [`pipeline::LanguageModel`] trait for any API that speaks the
//! OpenAI chat-completions wire format (OpenAI itself, Groq, OpenRouter, a
//! local gateway). Other wire formats are added as new types in this crate
//! without any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, response parsing,
//! and status-code mapping live here. The [`pipeline`] crate sees only
//! [`pipeline::LanguageModel`] and [`pipeline::LlmError`].
//!
//! No retries happen here: one failed call is one pipeline failure.

mod config;
mod provider;
mod wire;

pub use config::{ProviderConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
pub use provider::OpenAiCompatibleProvider;
