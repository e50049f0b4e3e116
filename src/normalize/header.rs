//! Header decoding: RFC 2047 encoded-words, folding, charset fallbacks.
//!
//! A header value may be a mix of plain text and differently-encoded
//! segments. Each segment is decoded with its declared charset; anything
//! that cannot be decoded is kept verbatim or replaced lossily rather than
//! failing the whole header.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::warn;

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Adjacent encoded words separated only by whitespace are joined without
/// the separator (RFC 2047 §6.2). A token that fails to decode is preserved
/// as-is.
pub fn decode_header(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    let mut prev_encoded = false;

    while let Some(start) = rest.find("=?") {
        let gap = &rest[..start];
        if !(prev_encoded && !gap.is_empty() && gap.chars().all(char::is_whitespace)) {
            out.push_str(gap);
        }

        match decode_encoded_word(&rest[start..]) {
            Some((text, consumed)) => {
                out.push_str(&text);
                rest = &rest[start + consumed..];
                prev_encoded = true;
            }
            None => {
                out.push_str("=?");
                rest = &rest[start + 2..];
                prev_encoded = false;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Decode one `=?charset?enc?payload?=` token. Returns the decoded text and
/// the number of input bytes consumed, or `None` if the token is malformed.
fn decode_encoded_word(s: &str) -> Option<(String, usize)> {
    let inner = s.strip_prefix("=?")?;

    let charset_end = inner.find('?')?;
    let charset = &inner[..charset_end];

    let after_charset = &inner[charset_end + 1..];
    let enc_end = after_charset.find('?')?;
    let encoding = &after_charset[..enc_end];

    let payload_start = &after_charset[enc_end + 1..];
    let payload_end = payload_start.find("?=")?;
    let payload = &payload_start[..payload_end];

    let consumed = 2 + charset_end + 1 + enc_end + 1 + payload_end + 2;

    let bytes = match encoding {
        "B" | "b" => BASE64.decode(payload.as_bytes()).ok()?,
        "Q" | "q" => decode_q(payload),
        _ => return None,
    };

    Some((decode_charset(charset, &bytes), consumed))
}

/// Decode Q-encoding: underscores become spaces, `=XX` becomes a byte.
fn decode_q(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                match u8::from_str_radix(
                    std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("xx"),
                    16,
                ) {
                    Ok(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    Err(_) => {
                        out.push(b'=');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    out
}

/// Decode bytes using a named charset, with permissive UTF-8 as the
/// fallback for unknown labels.
fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    match encoding_rs::Encoding::for_label(charset.as_bytes()) {
        Some(encoding) => {
            let (decoded, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        }
        None => {
            warn!(charset, "unknown charset, decoding as lossy UTF-8");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Decode a raw header block to text: UTF-8 first, then Windows-1252
/// (which accepts every byte). Strips a leading BOM.
pub fn decode_header_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Unfold headers: continuation lines (leading space or tab) are joined to
/// the previous header. Returns `(lowercase_name, raw_value)` pairs.
pub fn unfold_headers(text: &str) -> Vec<(String, String)> {
    let mut result: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = result.last_mut() {
                last.1.push(' ');
                last.1.push_str(line.trim());
            }
        } else if let Some(colon) = line.find(':') {
            let name = line[..colon].trim().to_lowercase();
            let value = line[colon + 1..].trim().to_string();
            result.push((name, value));
        }
        // Lines without a colon and not a continuation are silently skipped
    }

    result
}

/// First value for a header name (case-insensitive; pass lowercase).
pub fn get_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// The raw header block of a message: everything before the first blank
/// line.
pub fn raw_header_block(data: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < data.len() {
        if data[i..].starts_with(b"\n\n") {
            return &data[..i];
        }
        if data[i..].starts_with(b"\r\n\r\n") {
            return &data[..i];
        }
        i += 1;
    }
    data
}

/// Strip surrounding angle brackets from a Message-ID-like value.
pub fn strip_angle_brackets(s: &str) -> String {
    s.trim().trim_matches(|c| c == '<' || c == '>').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_word() {
        assert_eq!(decode_header("=?UTF-8?B?SG9sYSBtdW5kbw==?="), "Hola mundo");
    }

    #[test]
    fn test_decode_q_word() {
        assert_eq!(decode_header("=?ISO-8859-1?Q?caf=E9?="), "café");
    }

    #[test]
    fn test_adjacent_words_join_without_separator() {
        let input = "=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?=";
        assert_eq!(decode_header(input), "Hola mundo");
    }

    #[test]
    fn test_mixed_plain_and_encoded() {
        assert_eq!(
            decode_header("Re: =?UTF-8?B?SG9sYQ==?= there"),
            "Re: Hola there"
        );
    }

    #[test]
    fn test_q_underscore_is_space() {
        assert_eq!(
            decode_header("=?ISO-8859-1?Q?R=E9sum=E9_du_projet?="),
            "Résumé du projet"
        );
    }

    #[test]
    fn test_utf8_base64_multibyte() {
        // 山田太郎
        assert_eq!(decode_header("=?UTF-8?B?5bGx55Sw5aSq6YOO?="), "山田太郎");
    }

    #[test]
    fn test_windows1252_word() {
        assert_eq!(decode_header("=?Windows-1252?Q?M=FCller?="), "Müller");
    }

    #[test]
    fn test_unknown_encoding_token_preserved() {
        let input = "=?UTF-8?X?abc?=";
        assert_eq!(decode_header(input), input);
    }

    #[test]
    fn test_truncated_token_preserved() {
        assert_eq!(decode_header("=?UTF-8?B?SG9sYQ"), "=?UTF-8?B?SG9sYQ");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(decode_header("Just a subject"), "Just a subject");
    }

    #[test]
    fn test_unfold_headers() {
        let text = "Subject: This is a long\n\tsubject line\nFrom: user@example.com\n";
        let headers = unfold_headers(text);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].0, "subject");
        assert_eq!(headers[0].1, "This is a long subject line");
    }

    #[test]
    fn test_get_header_is_first_match() {
        let headers = vec![
            ("received".to_string(), "first".to_string()),
            ("received".to_string(), "second".to_string()),
        ];
        assert_eq!(get_header(&headers, "received"), Some("first"));
        assert_eq!(get_header(&headers, "subject"), None);
    }

    #[test]
    fn test_raw_header_block() {
        let data = b"From: a@b.com\nSubject: Hi\n\nBody here\n";
        let block = raw_header_block(data);
        assert!(block.ends_with(b"Subject: Hi"));
    }

    #[test]
    fn test_raw_header_block_crlf() {
        let data = b"From: a@b.com\r\nSubject: Hi\r\n\r\nBody\r\n";
        let block = raw_header_block(data);
        assert!(block.ends_with(b"Subject: Hi"));
    }

    #[test]
    fn test_strip_angle_brackets() {
        assert_eq!(strip_angle_brackets(" <msg001@example.com> "), "msg001@example.com");
        assert_eq!(strip_angle_brackets("plain-id"), "plain-id");
    }

    #[test]
    fn test_decode_header_bytes_latin1_fallback() {
        // 0xE9 is not valid UTF-8 on its own; Windows-1252 maps it to é.
        let decoded = decode_header_bytes(b"Subject: caf\xE9");
        assert!(decoded.contains("café"));
    }
}
