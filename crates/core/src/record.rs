//! Structured view over one session log line
//!
//! A session log line is a JSON object whose shape varies between record
//! types. `LogRecord` keeps the whole object plus the source text, so an
//! untouched record is written back byte for byte, and exposes the fields the checkpoint engine relies on through
//! typed accessors. Defaulting rules:
//!
//! | field             | accessor          | when absent or not the expected type |
//! |-------------------|-------------------|--------------------------------------|
//! | `uuid`            | `uuid()`          | `None`                               |
//! | `type`            | `kind()`          | `RecordKind::Untyped`                |
//! | `sessionId`       | `session_id()`    | `None`                               |
//! | `message.role`    | `ChatMessage`     | `""`                                 |
//! | `message.content` | `ChatMessage`     | `Content::Text("")`                  |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Field holding the record identifier
pub const UUID_FIELD: &str = "uuid";
/// Field holding the record type
pub const TYPE_FIELD: &str = "type";
/// Field holding the owning session identifier
pub const SESSION_ID_FIELD: &str = "sessionId";
/// Field holding the chat payload
pub const MESSAGE_FIELD: &str = "message";

/// Kind of a log record, taken from its `type` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// A user chat turn
    User,
    /// An assistant chat turn
    Assistant,
    /// Any other typed record (summaries, tool results, system events)
    Other(String),
    /// No string `type` field
    Untyped,
}

impl RecordKind {
    /// True for records that take part in message previews and diffs
    pub fn is_chat(&self) -> bool {
        matches!(self, RecordKind::User | RecordKind::Assistant)
    }
}

/// Content of a chat message
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Content<'a> {
    /// Plain string content
    Text(&'a str),
    /// Block lists and any other non-string content
    Structured(&'a Value),
}

impl<'a> Content<'a> {
    /// The text when the content is a plain string
    pub fn as_text(&self) -> Option<&'a str> {
        match *self {
            Content::Text(text) => Some(text),
            Content::Structured(_) => None,
        }
    }
}

/// Borrowed view of the chat payload of a user/assistant record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: Content<'a>,
}

/// One JSON object from a session log
#[derive(Debug, Clone)]
pub struct LogRecord {
    fields: Map<String, Value>,
    /// Source line, dropped once the record is modified
    raw: Option<String>,
}

impl PartialEq for LogRecord {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LogRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::from_map)
    }
}

impl LogRecord {
    /// Parse a single log line
    ///
    /// Returns `None` for lines that are not JSON objects.
    pub fn parse(line: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(fields)) => Some(Self {
                fields,
                raw: Some(line.to_string()),
            }),
            _ => None,
        }
    }

    /// Wrap an already-decoded JSON object
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields, raw: None }
    }

    /// Record identifier
    pub fn uuid(&self) -> Option<&str> {
        self.fields.get(UUID_FIELD).and_then(Value::as_str)
    }

    /// Record kind
    pub fn kind(&self) -> RecordKind {
        match self.fields.get(TYPE_FIELD).and_then(Value::as_str) {
            Some("user") => RecordKind::User,
            Some("assistant") => RecordKind::Assistant,
            Some(other) => RecordKind::Other(other.to_string()),
            None => RecordKind::Untyped,
        }
    }

    /// Owning session identifier
    pub fn session_id(&self) -> Option<&str> {
        self.fields.get(SESSION_ID_FIELD).and_then(Value::as_str)
    }

    /// Re-tag the record with another session identifier
    ///
    /// The field is inserted when the record did not carry one.
    pub fn set_session_id(&mut self, session_id: &str) {
        self.raw = None;
        self.fields.insert(
            SESSION_ID_FIELD.to_string(),
            Value::String(session_id.to_string()),
        );
    }

    /// Chat payload for user/assistant records
    pub fn chat_message(&self) -> Option<ChatMessage<'_>> {
        if !self.kind().is_chat() {
            return None;
        }

        let message = self.fields.get(MESSAGE_FIELD).and_then(Value::as_object);
        let role = message
            .and_then(|m| m.get("role"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let content = match message.and_then(|m| m.get("content")) {
            None => Content::Text(""),
            Some(Value::String(text)) => Content::Text(text),
            Some(other) => Content::Structured(other),
        };

        Some(ChatMessage { role, content })
    }

    /// Raw field access for fields without a typed accessor
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Encode as a single JSONL line (no trailing newline)
    ///
    /// Unmodified records return their source line.
    pub fn to_line(&self) -> serde_json::Result<String> {
        match &self.raw {
            Some(raw) => Ok(raw.clone()),
            None => serde_json::to_string(&self.fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(LogRecord::parse("not json").is_none());
        assert!(LogRecord::parse("[1, 2, 3]").is_none());
        assert!(LogRecord::parse("\"text\"").is_none());
        assert!(LogRecord::parse("{\"uuid\": \"a\"}").is_some());
    }

    #[test]
    fn test_accessor_defaults() {
        let record = LogRecord::parse(r#"{"uuid": 42, "type": ["user"]}"#).unwrap();
        assert_eq!(record.uuid(), None);
        assert_eq!(record.kind(), RecordKind::Untyped);
        assert_eq!(record.session_id(), None);
        assert!(record.chat_message().is_none());
    }

    #[test]
    fn test_kind() {
        let user = LogRecord::parse(r#"{"type": "user"}"#).unwrap();
        let summary = LogRecord::parse(r#"{"type": "summary"}"#).unwrap();
        assert_eq!(user.kind(), RecordKind::User);
        assert_eq!(summary.kind(), RecordKind::Other("summary".to_string()));
        assert!(!summary.kind().is_chat());
    }

    #[test]
    fn test_chat_message_text_and_structured() {
        let text = LogRecord::parse(
            r#"{"type": "user", "message": {"role": "user", "content": "hello"}}"#,
        )
        .unwrap();
        let msg = text.chat_message().unwrap();
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content.as_text(), Some("hello"));

        let blocks = LogRecord::parse(
            r#"{"type": "assistant", "message": {"role": "assistant", "content": [{"type": "tool_use"}]}}"#,
        )
        .unwrap();
        let msg = blocks.chat_message().unwrap();
        assert_eq!(msg.role, "assistant");
        assert!(msg.content.as_text().is_none());
    }

    #[test]
    fn test_chat_message_missing_payload() {
        let record = LogRecord::parse(r#"{"type": "assistant"}"#).unwrap();
        let msg = record.chat_message().unwrap();
        assert_eq!(msg.role, "");
        assert_eq!(msg.content, Content::Text(""));
    }

    #[test]
    fn test_set_session_id_keeps_other_fields() {
        let mut record =
            LogRecord::parse(r#"{"uuid": "m1", "sessionId": "old", "cwd": "/tmp"}"#).unwrap();
        record.set_session_id("new");

        assert_eq!(record.session_id(), Some("new"));
        assert_eq!(record.uuid(), Some("m1"));
        assert_eq!(record.get("cwd").and_then(Value::as_str), Some("/tmp"));

        let reparsed = LogRecord::parse(&record.to_line().unwrap()).unwrap();
        assert_eq!(reparsed, record);
    }

    #[test]
    fn test_set_session_id_inserts_missing_field() {
        let mut record = LogRecord::parse(r#"{"type": "summary"}"#).unwrap();
        record.set_session_id("s2");
        assert_eq!(record.session_id(), Some("s2"));
    }

    #[test]
    fn test_to_line_keeps_source_text() {
        let line = r#"{"uuid":"m1","type":"user","sessionId":"s","message":{"role":"user","content":"hi"}}"#;
        let record = LogRecord::parse(line).unwrap();
        assert_eq!(record.to_line().unwrap(), line);
    }

    #[test]
    fn test_retagged_record_keeps_key_order() {
        let line = r#"{"uuid":"m1","type":"user","sessionId":"s","message":{"role":"user","content":"hi"}}"#;
        let mut record = LogRecord::parse(line).unwrap();
        record.set_session_id("s2");
        assert_eq!(
            record.to_line().unwrap(),
            r#"{"uuid":"m1","type":"user","sessionId":"s2","message":{"role":"user","content":"hi"}}"#
        );
    }
}
