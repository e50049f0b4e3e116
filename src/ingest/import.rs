//! Bulk import: load messages from a JSON array file into the store.
//!
//! Entries may come from exports of other tools, so decoding is tolerant:
//! missing ids and dates get generated, attachment content is accepted as
//! a hex string or a byte array, and a malformed entry skips with a
//! warning instead of aborting the whole import.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::model::{Attachment, Message};
use crate::normalize::date;
use crate::store::MessageStore;

/// Import every entry of a JSON array file into `folder`, reporting
/// progress as `(done, total)` through the optional callback. Returns the
/// messages that were stored.
pub fn import_json(
    path: &Path,
    store: &mut dyn MessageStore,
    folder: &str,
    progress: Option<&dyn Fn(usize, usize)>,
) -> Result<Vec<Message>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let entries: Vec<Value> =
        serde_json::from_str(&text).context("import file must be a JSON array of messages")?;

    let total = entries.len();
    let mut imported = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match message_from_value(entry) {
            Ok(message) => match store.add(message.clone(), folder) {
                Ok(()) => imported.push(message),
                Err(e) => warn!(index, error = %e, "could not store imported message"),
            },
            Err(e) => warn!(index, error = %e, "skipping malformed import entry"),
        }
        if let Some(progress) = progress {
            progress(index + 1, total);
        }
    }

    Ok(imported)
}

/// Build a [`Message`] from one loosely-typed import entry.
fn message_from_value(value: &Value) -> Result<Message> {
    let obj = value.as_object().context("entry is not a JSON object")?;

    let text = |key: &str| obj.get(key).and_then(Value::as_str);
    let required = |key: &str| {
        text(key)
            .map(str::to_string)
            .with_context(|| format!("missing required field '{key}'"))
    };

    let mut attachments = Vec::new();
    for (n, att) in obj
        .get("attachments")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
    {
        let filename = att
            .get("filename")
            .and_then(Value::as_str)
            .with_context(|| format!("attachment {n} has no filename"))?;
        let content_type = att
            .get("content_type")
            .and_then(Value::as_str)
            .with_context(|| format!("attachment {n} has no content_type"))?;
        let content = match att.get("content") {
            Some(Value::String(hex_text)) => hex::decode(hex_text)
                .with_context(|| format!("attachment {n} content is not valid hex"))?,
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .with_context(|| format!("attachment {n} has a byte out of range"))
                })
                .collect::<Result<Vec<u8>>>()?,
            _ => bail!("attachment {n} has no content"),
        };
        attachments.push(Attachment::new(filename, content_type, content));
    }

    Ok(Message {
        id: text("id")
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        sender: required("from")?,
        recipient: required("to")?,
        cc: text("cc").map(str::to_string),
        bcc: text("bcc").map(str::to_string),
        date: text("date").map(str::to_string).unwrap_or_else(date::now_rfc2822),
        subject: required("subject")?,
        body: required("body")?,
        is_read: obj.get("is_read").and_then(Value::as_bool).unwrap_or(false),
        attachments,
    })
}
