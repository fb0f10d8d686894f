//! Shared value types for the generation pipeline.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (creativity is in `[0, 100]`, temperature
//! is in `[0.0, 1.0]`) and participate in pipeline decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Creativity and sampling
// ---------------------------------------------------------------------------

/// A user's creativity preference in the range `[0, 100]`.
///
/// Stored on the user record. Out-of-range input is clamped on construction,
/// never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Creativity(u8);

impl Creativity {
    /// Lowest preference: near-deterministic phrasing.
    pub const MIN: Self = Self(0);

    /// Highest preference: most varied phrasing.
    pub const MAX: Self = Self(100);

    /// Preference assumed when the user never set one.
    pub const DEFAULT: Self = Self(50);

    /// Creates a [`Creativity`], clamping `value` into `[0, 100]`.
    pub fn clamped(value: i64) -> Self {
        // The clamp guarantees the cast is lossless.
        Self(value.clamp(0, 100) as u8)
    }

    /// Returns the preference as an integer in `[0, 100]`.
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl Default for Creativity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for Creativity {
    fn from(value: i64) -> Self {
        Self::clamped(value)
    }
}

impl From<Creativity> for i64 {
    fn from(value: Creativity) -> Self {
        i64::from(value.0)
    }
}

impl std::fmt::Display for Creativity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------

/// A sampling temperature accepted by the language model, in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Temperature(f64);

impl Temperature {
    /// Upper bound of the sampling range this crate targets.
    pub const MAX_VALUE: f64 = 1.0;

    /// Fully deterministic sampling. Used by the moderation check.
    pub const DETERMINISTIC: Self = Self(0.0);

    /// Creates a [`Temperature`], returning `None` if `value` is outside
    /// `[0.0, 1.0]` or not finite.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=Self::MAX_VALUE).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the temperature as an `f64`.
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Generation modes and outcomes
// ---------------------------------------------------------------------------

/// Which generation strategy an entry point dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Title and description only.
    Basic,
    /// Title, description, free instructions and clarifying answers.
    Advanced,
    /// Clarifying questions only; produces no description.
    Questions,
}

impl GenerationMode {
    /// Returns the mode name used in logs and spans.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
            Self::Questions => "questions",
        }
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------

/// Outcome of the moderation gate for one candidate task.
///
/// `reason` is only meaningful when `approved` is `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    /// Whether the content may proceed to generation.
    pub approved: bool,
    /// Why the content was rejected, if the classifier said.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ModerationVerdict {
    /// An approving verdict. Also the fail-open fallback.
    pub fn approved() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    /// A rejecting verdict with an optional reason.
    pub fn rejected(reason: Option<String>) -> Self {
        Self {
            approved: false,
            reason,
        }
    }
}

// ---------------------------------------------------------------------------

/// An improved task description produced by the basic or advanced strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// The generated description, cleaned of wrapping artefacts.
    pub content: String,
}

/// Ordered clarifying questions. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionSet(Vec<String>);

impl QuestionSet {
    /// Creates a question set, discarding blank entries.
    pub fn new(questions: impl IntoIterator<Item = String>) -> Self {
        Self(
            questions
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect(),
        )
    }

    /// Returns `true` if the model produced no questions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the questions in order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consumes the set, returning the questions.
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
