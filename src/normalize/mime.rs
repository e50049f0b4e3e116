//! MIME content extraction: body/attachment separation over a parsed tree.

use mail_parser::{MimeHeaders, PartType};
use tracing::debug;

use crate::model::Attachment;

/// Marker prepended to a body that had to be taken from an HTML part.
pub const HTML_BODY_MARKER: &str = "[HTML Content]";

/// Extract the body text and attachments from a parsed message.
///
/// Single-part messages contribute their whole payload as the body and
/// never produce attachments. For multipart messages every leaf part is
/// classified: an explicit attachment disposition, or any content type
/// other than plain text and HTML, makes the part an attachment;
/// plain-text parts concatenate into the body; an HTML part is used only
/// as long as no body text has been found, tagged with
/// [`HTML_BODY_MARKER`].
pub fn extract_content(message: &mail_parser::Message<'_>) -> (String, Vec<Attachment>) {
    let root_is_multipart = message
        .parts
        .first()
        .is_some_and(|part| matches!(part.body, PartType::Multipart(_)));

    if !root_is_multipart {
        return (single_part_body(message), Vec::new());
    }

    let mut body = String::new();
    let mut attachments = Vec::new();

    for part in &message.parts {
        // Container wrappers carry no content of their own.
        if matches!(part.body, PartType::Multipart(_)) {
            continue;
        }

        let content_type = part_content_type(part);
        let is_attachment = has_attachment_disposition(part)
            || (content_type != "text/plain" && content_type != "text/html");

        if is_attachment {
            let filename = part
                .attachment_name()
                .map(String::from)
                .unwrap_or_else(|| format!("attachment_{}", attachments.len()));
            attachments.push(Attachment::new(
                filename,
                content_type,
                part.contents().to_vec(),
            ));
        } else if content_type == "text/plain" {
            body.push_str(&part_text(part));
        } else if body.is_empty() {
            debug!("no plain-text part yet, falling back to HTML body");
            body.push_str(HTML_BODY_MARKER);
            body.push('\n');
            body.push_str(&part_text(part));
        }
    }

    (body, attachments)
}

/// Fallback body when the MIME parser rejects the message entirely:
/// everything after the first blank line, decoded permissively.
pub fn fallback_body(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    if let Some(pos) = text.find("\r\n\r\n") {
        text[pos + 4..].to_string()
    } else if let Some(pos) = text.find("\n\n") {
        text[pos + 2..].to_string()
    } else {
        String::new()
    }
}

/// Body of a single-part message: the decoded payload, whatever its type.
fn single_part_body(message: &mail_parser::Message<'_>) -> String {
    match message.parts.first() {
        Some(part) => part_text(part),
        None => String::new(),
    }
}

/// Decoded text of a leaf part; binary payloads decode permissively.
fn part_text(part: &mail_parser::MessagePart<'_>) -> String {
    match &part.body {
        PartType::Text(text) | PartType::Html(text) => text.as_ref().to_owned(),
        _ => String::from_utf8_lossy(part.contents()).into_owned(),
    }
}

/// `type/subtype` of a part, lowercase; parts without a declared type
/// default to plain text (or HTML when the parser already identified one).
fn part_content_type(part: &mail_parser::MessagePart<'_>) -> String {
    match part.content_type() {
        Some(ct) => match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub).to_lowercase(),
            None => ct.ctype().to_lowercase(),
        },
        None => match &part.body {
            PartType::Html(_) => "text/html".to_string(),
            _ => "text/plain".to_string(),
        },
    }
}

fn has_attachment_disposition(part: &mail_parser::MessagePart<'_>) -> bool {
    part.content_disposition()
        .is_some_and(|disposition| disposition.ctype().eq_ignore_ascii_case("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail_parser::MessageParser;

    fn parse(raw: &[u8]) -> mail_parser::Message<'_> {
        MessageParser::default().parse(raw).expect("parseable test message")
    }

    #[test]
    fn test_single_part_plain() {
        let raw = b"From: a@b.com\r\nSubject: hi\r\nContent-Type: text/plain\r\n\r\nJust text\r\n";
        let msg = parse(raw);
        let (body, attachments) = extract_content(&msg);
        assert_eq!(body.trim_end(), "Just text");
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_multipart_prefers_plain_over_html() {
        let raw = b"From: a@b.com\r\nSubject: alt\r\nMIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n\r\n\
--XYZ\r\nContent-Type: text/plain; charset=utf-8\r\n\r\nHello\r\n\
--XYZ\r\nContent-Type: text/html; charset=utf-8\r\n\r\n<p>Hi</p>\r\n\
--XYZ--\r\n";
        let msg = parse(raw);
        let (body, attachments) = extract_content(&msg);
        assert!(body.contains("Hello"));
        assert!(!body.contains("<p>"));
        assert!(!body.contains(HTML_BODY_MARKER));
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_html_fallback_is_marked() {
        let raw = b"From: a@b.com\r\nSubject: html only\r\nMIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n\r\n\
--XYZ\r\nContent-Type: text/html; charset=utf-8\r\n\r\n<p>Hi</p>\r\n\
--XYZ--\r\n";
        let msg = parse(raw);
        let (body, _) = extract_content(&msg);
        assert!(body.starts_with(HTML_BODY_MARKER));
        assert!(body.contains("<p>Hi</p>"));
    }

    #[test]
    fn test_attachment_by_disposition() {
        let raw = b"From: a@b.com\r\nSubject: att\r\nMIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\r\n\
--XYZ\r\nContent-Type: text/plain\r\n\r\nSee attached.\r\n\
--XYZ\r\nContent-Type: text/plain\r\nContent-Disposition: attachment; filename=\"notes.txt\"\r\n\r\nthe notes\r\n\
--XYZ--\r\n";
        let msg = parse(raw);
        let (body, attachments) = extract_content(&msg);
        assert!(body.contains("See attached."));
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename(), "notes.txt");
        assert_eq!(attachments[0].content_type(), "text/plain");
    }

    #[test]
    fn test_attachment_by_content_type() {
        let raw = b"From: a@b.com\r\nSubject: pdf\r\nMIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\r\n\
--XYZ\r\nContent-Type: text/plain\r\n\r\nBody here\r\n\
--XYZ\r\nContent-Type: application/pdf\r\nContent-Transfer-Encoding: base64\r\n\r\nJVBERi0=\r\n\
--XYZ--\r\n";
        let msg = parse(raw);
        let (_, attachments) = extract_content(&msg);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].content_type(), "application/pdf");
        // base64 "JVBERi0=" is "%PDF-"
        assert_eq!(attachments[0].content(), b"%PDF-");
    }

    #[test]
    fn test_unnamed_attachment_gets_ordinal_name() {
        let raw = b"From: a@b.com\r\nSubject: blobs\r\nMIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\r\n\
--XYZ\r\nContent-Type: application/octet-stream\r\n\r\nAAA\r\n\
--XYZ\r\nContent-Type: application/octet-stream\r\n\r\nBBB\r\n\
--XYZ--\r\n";
        let msg = parse(raw);
        let (_, attachments) = extract_content(&msg);
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].filename(), "attachment_0");
        assert_eq!(attachments[1].filename(), "attachment_1");
    }

    #[test]
    fn test_multiple_plain_parts_concatenate() {
        let raw = b"From: a@b.com\r\nSubject: two\r\nMIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\r\n\
--XYZ\r\nContent-Type: text/plain\r\n\r\nfirst\r\n\
--XYZ\r\nContent-Type: text/plain\r\n\r\nsecond\r\n\
--XYZ--\r\n";
        let msg = parse(raw);
        let (body, _) = extract_content(&msg);
        assert!(body.contains("first"));
        assert!(body.contains("second"));
    }

    #[test]
    fn test_fallback_body() {
        let data = b"From: a@b.com\nSubject: x\n\nbare body\n";
        assert_eq!(fallback_body(data), "bare body\n");
    }

    #[test]
    fn test_fallback_body_no_blank_line() {
        assert_eq!(fallback_body(b"no headers separator"), "");
    }
}
