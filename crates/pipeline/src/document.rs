//! Schema of the shared record store document.
//!
//! The pipeline owns only a few fields of the document: the user's usage
//! counter and creativity preference, and the top-level `aiLogs` collection.
//! Everything else (cards, tags, notifications, other user fields) belongs to
//! other collaborators and is carried through untouched in flattened maps.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::{AuditLogEntry, Creativity, UserId};

/// The whole record store as loaded and persisted in one piece.
///
/// Audit entries are kept as raw JSON so entries written by other
/// collaborators, in whatever shape, survive a load/persist cycle. Use
/// [`StoreDocument::append_log`] and [`StoreDocument::audit_entries`] for the
/// typed view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    /// User records.
    #[serde(default)]
    pub users: Vec<UserRecord>,
    /// Append-only audit log.
    #[serde(default)]
    pub ai_logs: Vec<Value>,
    /// Collections owned by other collaborators.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl StoreDocument {
    /// Finds a user record.
    pub fn user(&self, user_id: &UserId) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id.matches(user_id))
    }

    /// Finds a user record, creating one with defaults if absent.
    pub fn user_mut(&mut self, user_id: &UserId) -> &mut UserRecord {
        let index = match self.users.iter().position(|u| u.id.matches(user_id)) {
            Some(index) => index,
            None => {
                self.users.push(UserRecord::new(user_id.clone()));
                self.users.len() - 1
            }
        };
        &mut self.users[index]
    }

    /// Usage count for a user; zero when the user has no record.
    pub fn usage_count(&self, user_id: &UserId) -> u64 {
        self.user(user_id).map_or(0, |u| u.ai_usage_count)
    }

    /// Creativity preference for a user; the default when unset.
    pub fn creativity(&self, user_id: &UserId) -> Creativity {
        self.user(user_id)
            .and_then(|u| u.creativity)
            .unwrap_or_default()
    }

    /// Appends an entry to the audit log.
    ///
    /// # Errors
    ///
    /// Fails only if the entry cannot be encoded as JSON.
    pub fn append_log(&mut self, entry: &AuditLogEntry) -> Result<(), serde_json::Error> {
        self.ai_logs.push(serde_json::to_value(entry)?);
        Ok(())
    }

    /// Audit entries that decode as [`AuditLogEntry`], in stored order.
    /// Foreign-shaped entries are skipped here but kept in the document.
    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.ai_logs
            .iter()
            .filter_map(|raw| AuditLogEntry::deserialize(raw).ok())
            .collect()
    }
}

/// A user record's `id` as stored: text or a number.
///
/// Kept in its original form so persisting never rewrites another
/// collaborator's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    /// A string id.
    Text(String),
    /// A numeric id.
    Number(Number),
}

impl RecordKey {
    /// Whether this key identifies `user_id`.
    pub fn matches(&self, user_id: &UserId) -> bool {
        match self {
            Self::Text(text) => text == user_id.as_str(),
            Self::Number(number) => number.to_string() == user_id.as_str(),
        }
    }
}

impl From<UserId> for RecordKey {
    fn from(user_id: UserId) -> Self {
        Self::Text(user_id.as_str().to_string())
    }
}

/// The pipeline's view of a user record.
///
/// The pipeline-owned fields are read leniently: a count that is not a
/// non-negative number reads as zero, and a creativity that is not a number or
/// numeric string reads as unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// User identifier.
    pub id: RecordKey,
    /// Successful generations so far.
    #[serde(default, deserialize_with = "lenient_count")]
    pub ai_usage_count: u64,
    /// Creativity preference; `None` means the default applies.
    #[serde(
        default,
        deserialize_with = "lenient_creativity",
        skip_serializing_if = "Option::is_none"
    )]
    pub creativity: Option<Creativity>,
    /// Fields owned by other collaborators (name, password hash, ...).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl UserRecord {
    /// A fresh record with default pipeline fields.
    pub fn new(id: UserId) -> Self {
        Self {
            id: id.into(),
            ai_usage_count: 0,
            creativity: None,
            other: Map::new(),
        }
    }
}

/// A number from a JSON number or numeric string, rounded to the nearest
/// integer.
fn rounded(value: &Value) -> Option<i64> {
    let float = match value {
        Value::Number(n) => match n.as_i64() {
            Some(int) => return Some(int),
            None => n.as_f64()?,
        },
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    // `as` saturates out-of-range floats.
    float.is_finite().then(|| float.round() as i64)
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(rounded(&value)
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or(0))
}

fn lenient_creativity<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Creativity>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(rounded(&value).map(Creativity::clamped))
}
