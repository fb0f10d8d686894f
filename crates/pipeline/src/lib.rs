//! Core domain for taskgen's AI-assisted task description pipeline.
//!
//! This crate contains every domain concept, newtype identifier, value type,
//! policy, and error type used by the generation pipeline. Infrastructure
//! crates implement the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`UserId`, `CardId`, `AuditLogId`) |
//! | [`types`] | Value types (`Creativity`, `Temperature`, `ModerationVerdict`, etc.) |
//! | [`request`] | The inbound `GenerationRequest` and its invariants |
//! | [`audit`] | Append-only `AuditLogEntry` records |
//! | [`document`] | Schema of the shared record store document |
//! | [`temperature`] | Creativity → temperature policy |
//! | [`ports`] | `LanguageModel` and `RecordStore` traits |
//! | [`errors`] | Pipeline and port error types |

pub mod audit;
pub mod document;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod request;
pub mod temperature;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use audit::{AuditKind, AuditLogEntry};
pub use document::{RecordKey, StoreDocument, UserRecord};
pub use errors::{ErrorBody, LlmError, PipelineError, StoreError};
pub use identifiers::{AuditLogId, CardId, UserId};
pub use ports::{CompletionRequest, LanguageModel, RecordStore};
pub use request::{Answers, GenerationRequest};
pub use temperature::{creativity_to_temperature, temperature_for, Tone};
pub use types::{
    Creativity, GenerationMode, GenerationResult, ModerationVerdict, QuestionSet, Temperature,
    Timestamp,
};
