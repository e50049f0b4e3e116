//! Message normalization: raw protocol-level email to canonical records.
//!
//! The pipeline has three stages, each tolerant of malformed input:
//! header decoding ([`header`]), MIME body/attachment extraction
//! ([`mime`]), and date normalization for sort ordering ([`date`]).

pub mod date;
pub mod header;
pub mod mime;

use mail_parser::MessageParser;
use tracing::warn;
use uuid::Uuid;

use crate::model::Message;

/// Converts raw RFC 5322 bytes into a canonical [`Message`].
///
/// Normalization never fails: undecodable fields degrade to best-effort
/// replacements, and a message the MIME parser rejects outright still
/// yields a record with a permissively-decoded body.
pub trait Normalizer {
    fn normalize(&self, raw: &[u8]) -> Message;
}

/// The standard mail-parser-backed normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeNormalizer;

impl MimeNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for MimeNormalizer {
    fn normalize(&self, raw: &[u8]) -> Message {
        let header_text = header::decode_header_bytes(header::raw_header_block(raw));
        let headers = header::unfold_headers(&header_text);

        let id = header::get_header(&headers, "message-id")
            .map(header::strip_angle_brackets)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let sender = header::get_header(&headers, "from")
            .map(header::decode_header)
            .unwrap_or_else(|| "Unknown".to_string());

        let recipient = header::get_header(&headers, "to")
            .map(header::decode_header)
            .unwrap_or_default();

        let cc = header::get_header(&headers, "cc")
            .filter(|v| !v.is_empty())
            .map(header::decode_header);

        let bcc = header::get_header(&headers, "bcc")
            .filter(|v| !v.is_empty())
            .map(header::decode_header);

        let subject = header::get_header(&headers, "subject")
            .map(header::decode_header)
            .unwrap_or_else(|| "No Subject".to_string());

        // The date is stored exactly as received; a missing header gets a
        // generated one so every message has a usable sort key.
        let date = header::get_header(&headers, "date")
            .map(str::to_string)
            .unwrap_or_else(date::now_rfc2822);

        let (body, attachments) = match MessageParser::default().parse(raw) {
            Some(parsed) => mime::extract_content(&parsed),
            None => {
                warn!(id = %id, "message failed MIME parsing, keeping raw body");
                (mime::fallback_body(raw), Vec::new())
            }
        };

        Message {
            id,
            sender,
            recipient,
            cc,
            bcc,
            date,
            subject,
            body,
            is_read: false,
            attachments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &[u8]) -> Message {
        MimeNormalizer::new().normalize(raw)
    }

    #[test]
    fn test_basic_fields() {
        let raw = b"Message-ID: <msg001@example.com>\r\n\
From: Alice <alice@example.com>\r\n\
To: bob@example.com\r\n\
Cc: carol@example.com\r\n\
Date: Thu, 04 Jan 2024 10:00:00 +0000\r\n\
Subject: Hello\r\n\
Content-Type: text/plain\r\n\r\nHi Bob\r\n";
        let msg = normalize(raw);
        assert_eq!(msg.id, "msg001@example.com");
        assert_eq!(msg.sender, "Alice <alice@example.com>");
        assert_eq!(msg.recipient, "bob@example.com");
        assert_eq!(msg.cc.as_deref(), Some("carol@example.com"));
        assert_eq!(msg.bcc, None);
        assert_eq!(msg.date, "Thu, 04 Jan 2024 10:00:00 +0000");
        assert_eq!(msg.subject, "Hello");
        assert_eq!(msg.body.trim_end(), "Hi Bob");
        assert!(!msg.is_read);
    }

    #[test]
    fn test_missing_message_id_gets_generated() {
        let raw = b"From: a@b.com\r\nSubject: x\r\n\r\nbody\r\n";
        let first = normalize(raw);
        let second = normalize(raw);
        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_missing_headers_get_defaults() {
        let raw = b"X-Nothing: here\r\n\r\nbody\r\n";
        let msg = normalize(raw);
        assert_eq!(msg.sender, "Unknown");
        assert_eq!(msg.recipient, "");
        assert_eq!(msg.subject, "No Subject");
        assert_eq!(msg.cc, None);
        // The generated date must be sortable.
        assert!(msg.date.ends_with("+0000"));
    }

    #[test]
    fn test_encoded_subject_is_decoded() {
        let raw = b"From: a@b.com\r\nSubject: =?UTF-8?B?SG9sYSBtdW5kbw==?=\r\n\r\nbody\r\n";
        let msg = normalize(raw);
        assert_eq!(msg.subject, "Hola mundo");
    }

    #[test]
    fn test_folded_subject_is_unfolded() {
        let raw = b"From: a@b.com\r\nSubject: part one\r\n\tpart two\r\n\r\nbody\r\n";
        let msg = normalize(raw);
        assert_eq!(msg.subject, "part one part two");
    }

    #[test]
    fn test_multipart_with_attachment() {
        let raw = b"Message-ID: <m2@example.com>\r\nFrom: a@b.com\r\nSubject: att\r\n\
MIME-Version: 1.0\r\nContent-Type: multipart/mixed; boundary=\"B\"\r\n\r\n\
--B\r\nContent-Type: text/plain\r\n\r\nSee attached.\r\n\
--B\r\nContent-Type: application/pdf\r\nContent-Disposition: attachment; filename=\"doc.pdf\"\r\nContent-Transfer-Encoding: base64\r\n\r\nJVBERi0=\r\n\
--B--\r\n";
        let msg = normalize(raw);
        assert!(msg.body.contains("See attached."));
        assert_eq!(msg.attachments.len(), 1);
        assert_eq!(msg.attachments[0].filename(), "doc.pdf");
        assert_eq!(msg.attachments[0].content(), b"%PDF-");
    }
}
