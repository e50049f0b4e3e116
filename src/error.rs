//! Centralized error types for maildepot.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the maildepot store.
///
/// Malformed *data* (undecodable headers, broken dates, corrupt message
/// files) never surfaces here; the store degrades by skipping or
/// substituting and logs a diagnostic instead. Only structural misuse and
/// filesystem failures reach the caller.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An operation referenced a folder that is not tracked by the store.
    #[error("folder '{0}' does not exist")]
    UnknownFolder(String),

    /// `create_folder` was called with a name that is already tracked.
    #[error("folder '{0}' already exists")]
    FolderExists(String),

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A message could not be encoded for persistence.
    #[error("failed to encode message '{id}': {source}")]
    Encode {
        id: String,
        source: serde_json::Error,
    },
}

/// Convenience alias for `Result<T, StoreError>`.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `StoreError`
/// when no path context is available (rare — prefer `StoreError::io`).
impl From<std::io::Error> for StoreError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
