//! IMAP ingestion source: fetch raw messages over TLS and normalize them
//! into the local store.

use anyhow::{Context, Result};
use native_tls::TlsConnector;
use tracing::{info, warn};

use crate::ingest::IngestionSource;
use crate::model::Message;
use crate::normalize::{MimeNormalizer, Normalizer};
use crate::store::MessageStore;

type TlsSession = imap::Session<native_tls::TlsStream<std::net::TcpStream>>;

/// Fetches full messages (`RFC822`) from an IMAP server with LOGIN auth.
pub struct ImapSource {
    host: String,
    port: u16,
    username: String,
    password: String,
    normalizer: MimeNormalizer,
}

impl ImapSource {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            normalizer: MimeNormalizer::new(),
        }
    }

    fn connect(&self) -> Result<TlsSession> {
        let tls = TlsConnector::builder().build()?;
        let client = imap::connect((self.host.as_str(), self.port), self.host.as_str(), &tls)
            .with_context(|| format!("connecting to {}:{}", self.host, self.port))?;
        let session = client
            .login(&self.username, &self.password)
            .map_err(|(e, _client)| e)
            .with_context(|| format!("logging in as {}", self.username))?;
        Ok(session)
    }

    /// Folder names available on the server.
    pub fn list_folders(&self) -> Result<Vec<String>> {
        let mut session = self.connect()?;
        let names = session.list(None, Some("*"))?;
        let folders = names.iter().map(|name| name.name().to_string()).collect();
        session.logout().ok();
        Ok(folders)
    }
}

impl IngestionSource for ImapSource {
    fn fetch(
        &mut self,
        store: &mut dyn MessageStore,
        folder: &str,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let mut session = self.connect()?;
        session
            .select(folder)
            .with_context(|| format!("selecting folder '{folder}'"))?;

        let mut uids: Vec<u32> = session.uid_search("ALL")?.into_iter().collect();
        uids.sort_unstable();
        let newest = uids.split_off(uids.len().saturating_sub(limit));
        info!(folder, count = newest.len(), "fetching messages");

        let mut stored = Vec::new();
        for uid in newest {
            let fetches = match session.uid_fetch(uid.to_string(), "RFC822") {
                Ok(fetches) => fetches,
                Err(e) => {
                    warn!(uid, error = %e, "fetch failed, skipping message");
                    continue;
                }
            };
            let Some(fetch) = fetches.iter().next() else {
                continue;
            };
            let Some(raw) = fetch.body() else {
                warn!(uid, "fetch response carried no body");
                continue;
            };

            let message = self.normalizer.normalize(raw);
            match store.add(message.clone(), folder) {
                Ok(()) => stored.push(message),
                Err(e) => warn!(id = %message.id, error = %e, "could not store fetched message"),
            }
        }

        session.logout().ok();
        Ok(stored)
    }
}
