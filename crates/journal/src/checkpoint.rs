//! Checkpoint data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ulid::Ulid;

/// A checkpoint is a named snapshot of a session, truncated at one message
///
/// Everything except `parent_checkpoint_id` is fixed at creation; the parent
/// link is repointed when an ancestor is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Unique ID (ULID for new checkpoints; older indexes may hold UUIDs)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub checkpoint_id: String,
    /// Session the snapshot was taken from
    #[serde(default, deserialize_with = "null_as_empty")]
    pub session_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Creation time
    #[serde(default = "Utc::now", with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Last message included in the snapshot
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message_uuid: String,
    #[serde(default)]
    pub parent_checkpoint_id: Option<String>,
    /// Branch label; `None` is the unlabeled main line
    #[serde(default)]
    pub branch_name: Option<String>,
}

impl Checkpoint {
    /// Create a new checkpoint with a fresh ID and the current time
    pub fn new(
        session_id: impl Into<String>,
        name: impl Into<String>,
        message_uuid: impl Into<String>,
    ) -> Self {
        Self {
            checkpoint_id: Ulid::new().to_string(),
            session_id: session_id.into(),
            name: name.into(),
            description: String::new(),
            timestamp: Utc::now(),
            message_uuid: message_uuid.into(),
            parent_checkpoint_id: None,
            branch_name: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_checkpoint_id.is_none()
    }

    /// Branch label for display, `main` when unlabeled
    pub fn branch_or_main(&self) -> &str {
        self.branch_name.as_deref().unwrap_or("main")
    }

    /// First 8 characters of the ID
    pub fn short_id(&self) -> String {
        short_id(&self.checkpoint_id)
    }
}

/// First 8 characters of a checkpoint ID
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339 timestamps; offset-less ISO-8601 values are read as UTC
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(Utc::now());
        };
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}
