//! Synthetic message generator for demos and tests.

use chrono::{Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::ingest::IngestionSource;
use crate::model::{Attachment, Message};
use crate::store::MessageStore;

/// Generates plausible test messages: staggered hourly dates, rotating
/// subject shapes, an attachment on every even index, cc/bcc on a cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockSource;

impl MockSource {
    pub fn new() -> Self {
        Self
    }

    fn generate(&self, index: usize) -> Message {
        let n = index + 1;

        let (subject, body) = match index % 3 {
            0 => (
                format!("Important: Test Message {n}"),
                format!(
                    "This is test message {n} with some important content to test search functionality."
                ),
            ),
            1 => (
                format!("Newsletter: Test Message {n}"),
                format!("Newsletter {n}: Updates and information about our latest developments."),
            ),
            _ => (
                format!("Test Message {n}"),
                format!("This is a regular message {n} with nothing particularly special about it."),
            ),
        };

        let date = (Utc::now() - Duration::hours(index as i64))
            .format("%a, %d %b %Y %H:%M:%S +0000")
            .to_string();

        let mut message = Message {
            id: Uuid::new_v4().to_string(),
            sender: "sender@example.com".to_string(),
            recipient: "recipient@example.com".to_string(),
            cc: (index % 2 == 0).then(|| "cc@example.com".to_string()),
            bcc: (index % 3 == 0).then(|| "bcc@example.com".to_string()),
            date,
            subject,
            body,
            is_read: false,
            attachments: Vec::new(),
        };

        if index % 2 == 0 {
            let content = format!("This is the content of attachment {n}").into_bytes();
            message.attachments.push(Attachment::new(
                format!("attachment_{n}.txt"),
                "text/plain",
                content,
            ));
        }

        message
    }
}

impl IngestionSource for MockSource {
    fn fetch(
        &mut self,
        store: &mut dyn MessageStore,
        folder: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Message>> {
        let mut stored = Vec::new();
        for index in 0..limit {
            let message = self.generate(index);
            match store.add(message.clone(), folder) {
                Ok(()) => stored.push(message),
                Err(e) => warn!(id = %message.id, error = %e, "could not store mock message"),
            }
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_dates_descend() {
        let source = MockSource::new();
        let first = source.generate(0);
        let second = source.generate(1);
        let key = crate::normalize::date::sort_key;
        assert!(key(&first.date) > key(&second.date));
    }

    #[test]
    fn test_attachment_cadence() {
        let source = MockSource::new();
        assert!(source.generate(0).has_attachments());
        assert!(!source.generate(1).has_attachments());
        assert!(source.generate(2).has_attachments());
    }

    #[test]
    fn test_ids_are_unique() {
        let source = MockSource::new();
        assert_ne!(source.generate(0).id, source.generate(0).id);
    }

    #[test]
    fn test_subject_rotation() {
        let source = MockSource::new();
        assert!(source.generate(0).subject.starts_with("Important:"));
        assert!(source.generate(1).subject.starts_with("Newsletter:"));
        assert!(source.generate(2).subject.starts_with("Test Message"));
    }
}
