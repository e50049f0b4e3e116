//! Attachment record type.
//!
//! Content is held in memory as raw bytes and persisted as a hex string.
//! The hex form is a stable on-disk contract; message files written by
//! older deployments must keep loading byte-for-byte.

use serde::{Deserialize, Serialize};

/// A decoded email attachment.
///
/// Immutable once constructed. The size is always derived from the content
/// so the two can never diverge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename of the attachment. Generated if missing from the headers.
    filename: String,

    /// MIME content type (e.g. `"image/jpeg"`, `"application/pdf"`).
    content_type: String,

    /// Raw decoded bytes, hex-encoded in the persisted JSON.
    #[serde(with = "hex_bytes")]
    content: Vec<u8>,
}

impl Attachment {
    /// Create a new attachment from its decoded content.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content,
        }
    }

    /// Filename of the attachment.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// MIME content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Size of the decoded content in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Raw decoded content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Serde adapter: `Vec<u8>` as a lowercase hex string.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(&text).map_err(serde::de::Error::custom)
    }
}
