//! Canonical message record and its persisted JSON schema.

use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use crate::normalize::date;

/// A normalized, provider-agnostic email message.
///
/// This is both the in-memory record and the persisted schema: one message
/// is written as one pretty-printed JSON file named `{id}.json` under its
/// folder directory. Field names and order below are the on-disk contract.
///
/// Everything except the read flag is immutable after ingestion; there is
/// no way to edit a subject or body through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier, used as the filename stem and as the move/delete
    /// key. Either the protocol-level Message-ID (angle brackets stripped)
    /// or a generated UUID.
    pub id: String,

    /// Sender, as free-form address text.
    #[serde(rename = "from")]
    pub sender: String,

    /// Recipient, as free-form address text.
    #[serde(rename = "to")]
    pub recipient: String,

    /// CC recipients, if any. Serialized as `null` when absent.
    #[serde(default)]
    pub cc: Option<String>,

    /// BCC recipients, if any. Serialized as `null` when absent.
    #[serde(default)]
    pub bcc: Option<String>,

    /// Date header, stored exactly as received. Normalization to a
    /// comparable timestamp happens only transiently when sorting.
    pub date: String,

    /// Decoded subject line.
    pub subject: String,

    /// Decoded body text.
    pub body: String,

    /// Read/unread flag, the only mutable field.
    pub is_read: bool,

    /// Attachments in the order they appeared in the MIME tree.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Create a message with the required fields; cc/bcc empty, unread, no
    /// attachments, dated now.
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            recipient: recipient.into(),
            cc: None,
            bcc: None,
            date: date::now_rfc2822(),
            subject: subject.into(),
            body: body.into(),
            is_read: false,
            attachments: Vec::new(),
        }
    }

    /// Mark the message as read.
    pub fn mark_as_read(&mut self) {
        self.is_read = true;
    }

    /// Mark the message as unread.
    pub fn mark_as_unread(&mut self) {
        self.is_read = false;
    }

    /// Whether the message carries any attachments.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message {
            id: "msg-1".into(),
            sender: "alice@example.com".into(),
            recipient: "bob@example.com".into(),
            cc: Some("carol@example.com".into()),
            bcc: None,
            date: "Thu, 04 Jan 2024 10:00:00 +0000".into(),
            subject: "Hello".into(),
            body: "Hi Bob".into(),
            is_read: false,
            attachments: vec![Attachment::new("notes.txt", "text/plain", b"notes".to_vec())],
        }
    }

    #[test]
    fn test_schema_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["from"], "alice@example.com");
        assert_eq!(json["to"], "bob@example.com");
        assert!(json["bcc"].is_null());
        assert_eq!(json["attachments"][0]["filename"], "notes.txt");
        // No leaked internal field names.
        assert!(json.get("sender").is_none());
        assert!(json.get("recipient").is_none());
    }

    #[test]
    fn test_round_trip_with_attachments() {
        let msg = sample();
        let json = serde_json::to_string_pretty(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
        assert_eq!(back.attachments[0].content(), b"notes");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        // cc/bcc/attachments may be entirely absent in hand-written files.
        let json = r#"{
            "id": "x", "from": "a", "to": "b",
            "date": "Thu, 04 Jan 2024 10:00:00 +0000",
            "subject": "s", "body": "t", "is_read": true
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.cc, None);
        assert!(msg.attachments.is_empty());
        assert!(msg.is_read);
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        let json = r#"{"id": "x", "from": "a", "to": "b"}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }

    #[test]
    fn test_read_flag_toggles() {
        let mut msg = sample();
        msg.mark_as_read();
        assert!(msg.is_read);
        msg.mark_as_unread();
        assert!(!msg.is_read);
    }

    #[test]
    fn test_new_defaults_to_parseable_date() {
        let msg = Message::new("id", "a@b.com", "c@d.com", "s", "b");
        // The generated date must survive the sort-key chain without
        // falling back to "now at sort time".
        assert!(!msg.date.is_empty());
        assert!(msg.date.ends_with("+0000"));
    }
}
