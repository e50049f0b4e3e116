//! File-backed message store: one directory per folder, one pretty-printed
//! JSON file per message.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::model::Message;
use crate::normalize::date;
use crate::store::{MessageStore, DEFAULT_FOLDERS, TRASH_FOLDER};

/// Message store persisted as `{data_dir}/{folder}/{id}.json`.
///
/// The whole mailbox is loaded eagerly at construction; the in-memory
/// collections and the files are kept in step by every mutating call.
/// Single-process, single-writer: concurrent access from elsewhere must be
/// serialized by the caller.
pub struct FileStore {
    data_dir: PathBuf,
    folders: Vec<String>,
    messages: HashMap<String, Vec<Message>>,
}

impl FileStore {
    /// Open (or initialize) a mailbox rooted at `data_dir`.
    ///
    /// The default folders get their directories created eagerly. Any
    /// extra directory already under the root is re-registered as a
    /// user-created folder, so folders survive a restart. Message files
    /// that fail to parse are logged and skipped, never fatal.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|e| StoreError::io(&data_dir, e))?;

        let mut folders: Vec<String> = DEFAULT_FOLDERS.iter().map(|f| f.to_string()).collect();
        for folder in &folders {
            let path = data_dir.join(folder);
            fs::create_dir_all(&path).map_err(|e| StoreError::io(&path, e))?;
        }

        // Re-register folders created in earlier sessions.
        let entries = fs::read_dir(&data_dir).map_err(|e| StoreError::io(&data_dir, e))?;
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                if !folders.contains(&name) {
                    folders.push(name);
                }
            }
        }

        let mut messages = HashMap::new();
        for folder in &folders {
            messages.insert(folder.clone(), load_folder(&data_dir.join(folder)));
        }

        info!(
            path = %data_dir.display(),
            folders = folders.len(),
            messages = messages.values().map(Vec::len).sum::<usize>(),
            "opened mailbox store"
        );

        Ok(Self {
            data_dir,
            folders,
            messages,
        })
    }

    /// Root directory of the mailbox.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn ensure_folder(&self, folder: &str) -> Result<()> {
        if self.folders.iter().any(|f| f == folder) {
            Ok(())
        } else {
            Err(StoreError::UnknownFolder(folder.to_string()))
        }
    }

    fn message_path(&self, folder: &str, id: &str) -> PathBuf {
        self.data_dir.join(folder).join(format!("{id}.json"))
    }

    fn encode(message: &Message) -> Result<String> {
        serde_json::to_string_pretty(message).map_err(|e| StoreError::Encode {
            id: message.id.clone(),
            source: e,
        })
    }
}

/// Load every `*.json` message in a folder directory, skipping files that
/// cannot be read or parsed.
fn load_folder(dir: &Path) -> Vec<Message> {
    let mut out = Vec::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "cannot scan folder directory");
            return out;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Message>(&text) {
                Ok(message) => out.push(message),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping malformed message file")
                }
            },
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable message file"),
        }
    }

    out
}

impl MessageStore for FileStore {
    fn folders(&self) -> Vec<String> {
        self.folders.clone()
    }

    fn list(&self, folder: &str, limit: Option<usize>) -> Result<Vec<Message>> {
        self.ensure_folder(folder)?;

        let mut sorted = self.messages.get(folder).cloned().unwrap_or_default();
        // Newest first; unparseable dates key as "now" and so sort to the
        // top rather than failing the listing.
        sorted.sort_by_cached_key(|m| std::cmp::Reverse(date::sort_key(&m.date)));

        if let Some(limit) = limit {
            sorted.truncate(limit);
        }
        Ok(sorted)
    }

    fn search(&self, query: &str, folder: &str) -> Result<Vec<Message>> {
        self.ensure_folder(folder)?;

        let needle = query.to_lowercase();
        let matches = self
            .messages
            .get(folder)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|m| {
                        m.subject.to_lowercase().contains(&needle)
                            || m.body.to_lowercase().contains(&needle)
                            || m.sender.to_lowercase().contains(&needle)
                            || m.recipient.to_lowercase().contains(&needle)
                            || m.id.to_lowercase() == needle
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(matches)
    }

    fn add(&mut self, message: Message, folder: &str) -> Result<()> {
        self.ensure_folder(folder)?;

        let json = Self::encode(&message)?;
        let path = self.message_path(folder, &message.id);
        debug!(id = %message.id, folder, "adding message");

        // Memory first, then disk; a failed write surfaces without rolling
        // the in-memory append back.
        self.messages
            .entry(folder.to_string())
            .or_default()
            .push(message);
        fs::write(&path, json).map_err(|e| StoreError::io(&path, e))
    }

    fn create_folder(&mut self, name: &str) -> Result<()> {
        if self.folders.iter().any(|f| f == name) {
            return Err(StoreError::FolderExists(name.to_string()));
        }

        let path = self.data_dir.join(name);
        fs::create_dir_all(&path).map_err(|e| StoreError::io(&path, e))?;

        self.folders.push(name.to_string());
        self.messages.insert(name.to_string(), Vec::new());
        info!(folder = name, "created folder");
        Ok(())
    }

    fn move_message(&mut self, id: &str, source: &str, target: &str) -> Result<bool> {
        self.ensure_folder(source)?;
        self.ensure_folder(target)?;

        let position = self
            .messages
            .get(source)
            .and_then(|messages| messages.iter().position(|m| m.id == id));
        let Some(position) = position else {
            return Ok(false);
        };
        let message = match self.messages.get_mut(source) {
            Some(messages) => messages.remove(position),
            None => return Ok(false),
        };

        let source_path = self.message_path(source, id);
        let target_path = self.message_path(target, id);

        // If the backing file went missing the store is the surviving copy;
        // write it fresh into the target instead of failing the move.
        let fresh_payload = if source_path.exists() {
            None
        } else {
            warn!(id, source, "source file missing on move, writing fresh copy");
            Some(Self::encode(&message)?)
        };

        self.messages
            .entry(target.to_string())
            .or_default()
            .push(message);

        match fresh_payload {
            Some(json) => {
                fs::write(&target_path, json).map_err(|e| StoreError::io(&target_path, e))?
            }
            None => fs::rename(&source_path, &target_path)
                .map_err(|e| StoreError::io(&target_path, e))?,
        }

        debug!(id, source, target, "moved message");
        Ok(true)
    }

    fn delete(&mut self, id: &str, folder: &str) -> Result<bool> {
        self.ensure_folder(folder)?;

        // Two-tier deletion: outside the trash, "delete" means "move to
        // trash". Only the trash itself deletes for real.
        if folder != TRASH_FOLDER {
            return self.move_message(id, folder, TRASH_FOLDER);
        }

        let position = self
            .messages
            .get(folder)
            .and_then(|messages| messages.iter().position(|m| m.id == id));
        let Some(position) = position else {
            return Ok(false);
        };
        if let Some(messages) = self.messages.get_mut(folder) {
            messages.remove(position);
        }

        let path = self.message_path(folder, id);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
        }

        debug!(id, "permanently deleted message");
        Ok(true)
    }
}
