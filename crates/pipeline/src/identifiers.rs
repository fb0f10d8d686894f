//! Newtype domain identifiers.
//!
//! Every record that has an identity is represented as a distinct newtype so a
//! [`UserId`] can never be passed where a [`CardId`] is expected, even though
//! both are plain strings in the record store.
//!
//! Other collaborators write ids into the same store, sometimes as numbers, so
//! every identifier also deserializes from a JSON number (read as its decimal
//! text).

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Accepts a JSON string or number.
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Number(number) => number.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, and a
// Deserialize that accepts numbers.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                text_or_number(deserializer).map(Self)
            }
        }

        impl $name {
            /// Creates a new identifier, returning `None` if the value is blank.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers supplied by collaborators
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a user account.
    ///
    /// Supplied by the authentication layer and trusted as-is; the pipeline
    /// never validates it beyond non-emptiness.
    UserId
}

string_id! {
    /// Identifies a task card the generated description is meant for.
    ///
    /// Carried into audit entries only; the pipeline never reads the card.
    CardId
}

// ---------------------------------------------------------------------------
// Generated identifiers
// ---------------------------------------------------------------------------

/// Identifies a single audit log entry.
///
/// New entries get a random UUID. Entries written by other collaborators keep
/// whatever id they were stored with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AuditLogId(String);

impl AuditLogId {
    /// Generates a new random entry identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for AuditLogId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        text_or_number(deserializer).map(Self)
    }
}

impl std::fmt::Display for AuditLogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
