//! Port traits implemented by infrastructure crates.
//!
//! The orchestration layer depends only on these traits. `llm` supplies a
//! [`LanguageModel`]; `store` supplies a [`RecordStore`].

use async_trait::async_trait;

use crate::{LlmError, StoreDocument, StoreError, Temperature};

/// One system-prompt / user-message / sampling-parameters triple.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Fixed instruction for the model.
    pub system: String,
    /// Request-specific content.
    pub user: String,
    /// Sampling temperature.
    pub temperature: Temperature,
    /// Upper bound on reply length.
    pub max_tokens: u32,
}

/// A remote language model that turns a [`CompletionRequest`] into free text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns `true` if the model has the credentials it needs.
    ///
    /// Checked by every entry point before anything else happens.
    fn is_configured(&self) -> bool;

    /// Performs one completion call. Implementations must not retry.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

/// The shared record store: load everything, persist everything.
///
/// There are no transactions and no partial writes; `persist` replaces the
/// whole document.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Loads the full document. A store that was never written is empty.
    async fn load(&self) -> Result<StoreDocument, StoreError>;

    /// Replaces the full document.
    async fn persist(&self, document: &StoreDocument) -> Result<(), StoreError>;
}
