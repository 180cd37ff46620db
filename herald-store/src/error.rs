//! Error types for herald-store.

use std::path::PathBuf;

use thiserror::Error;

use herald_core::DocumentKey;

/// All errors that can arise from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Nothing is stored under the key yet.
    #[error("no stored entry for '{key}' at {path}")]
    NotFound { key: DocumentKey, path: PathBuf },

    /// The stored payload is not valid structured data.
    #[error("stored entry for '{key}' at {path} is not valid JSON: {source}")]
    Decode {
        key: DocumentKey,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be serialized for writing.
    #[error("failed to encode '{key}': {source}")]
    Encode {
        key: DocumentKey,
        #[source]
        source: serde_json::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
