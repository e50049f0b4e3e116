//! Mailbox stores: durable, folder-partitioned collections of messages.

pub mod file;

pub use file::FileStore;

use crate::error::Result;
use crate::model::Message;

/// Folders every mailbox starts with.
pub const DEFAULT_FOLDERS: [&str; 5] = ["INBOX", "Sent", "Drafts", "Trash", "Archive"];

/// The folder soft-deleted messages land in.
pub const TRASH_FOLDER: &str = "Trash";

/// A folder-partitioned message store.
///
/// This is the complete mutation surface: apart from the read/unread flag
/// on [`Message`] itself, nothing about a stored message can be edited.
/// Referencing a folder that is not tracked fails with
/// [`StoreError::UnknownFolder`](crate::error::StoreError::UnknownFolder)
/// on every operation.
pub trait MessageStore {
    /// Names of all tracked folders.
    fn folders(&self) -> Vec<String>;

    /// Messages in a folder sorted by descending normalized date (newest
    /// first), truncated to `limit` when given. The result is an owned
    /// snapshot; later store mutations do not show through it.
    fn list(&self, folder: &str, limit: Option<usize>) -> Result<Vec<Message>>;

    /// Messages matching `query` case-insensitively as a substring of the
    /// subject, body, sender or recipient, or exactly equal to the id.
    /// Results come back in folder storage order, not date order.
    fn search(&self, query: &str, folder: &str) -> Result<Vec<Message>>;

    /// Append a message to a folder and persist it, overwriting any
    /// existing file with the same id.
    fn add(&mut self, message: Message, folder: &str) -> Result<()>;

    /// Register a new folder and create its directory eagerly.
    fn create_folder(&mut self, name: &str) -> Result<()>;

    /// Move a message between folders. Returns `false` (not an error) when
    /// no message with that id exists in the source folder.
    fn move_message(&mut self, id: &str, source: &str, target: &str) -> Result<bool>;

    /// Delete a message. From any folder except the trash this is a soft
    /// delete: the message moves into [`TRASH_FOLDER`]. Only deleting from
    /// the trash removes the record and its file for good. Returns whether
    /// a message was found.
    fn delete(&mut self, id: &str, folder: &str) -> Result<bool>;
}
