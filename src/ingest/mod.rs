//! Ingestion sources: external producers of canonical messages.
//!
//! A source reads raw material (an IMAP mailbox, a bulk JSON file, thin
//! air for test data), normalizes it into [`Message`] records, and hands
//! those to a [`MessageStore`]. The store never sees protocol-level data.

pub mod imap;
pub mod import;
pub mod mock;

pub use imap::ImapSource;
pub use mock::MockSource;

use crate::model::Message;
use crate::store::MessageStore;

/// An external producer of canonical messages.
pub trait IngestionSource {
    /// Produce up to `limit` messages, add each to `folder` in the store,
    /// and return the messages that were stored. Per-message failures are
    /// logged and skipped; only source-level failures (connection, auth)
    /// abort the fetch.
    fn fetch(
        &mut self,
        store: &mut dyn MessageStore,
        folder: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Message>>;
}
