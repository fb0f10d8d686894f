//! taskgen pipeline orchestration and LLM gateway.
//!
//! This crate provides the moderation gate, the content generator (basic and
//! advanced strategies plus the clarifying-questions step), the usage and
//! audit ledger, the [`ModelGateway`] that bounds every model call, and the
//! [`Orchestrator`] that sequences them for each entry point.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Components here sequence calls between the domain
//! types of the [`pipeline`] crate and its port traits ([`pipeline::LanguageModel`],
//! [`pipeline::RecordStore`]). They never perform I/O of their own.
//!
//! ## Ordering guarantees
//!
//! For one request the moderation entry is persisted before any generation
//! call; the generation entry is persisted before the counter increment; both
//! are persisted before the response is returned.

pub mod gateway;
pub mod generator;
pub mod ledger;
pub mod moderation;
pub mod orchestrator;
pub mod parsing;
pub mod prompts;
pub mod response;

pub use gateway::ModelGateway;
pub use generator::{ContentGenerator, Sampling};
pub use ledger::UsageLedger;
pub use moderation::ModerationEvaluator;
pub use orchestrator::{Orchestrator, PipelineSettings};
pub use response::{GenerateResponse, QuestionsOutcome, QuestionsResponse, UsageStats};
