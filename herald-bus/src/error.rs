//! Error types for herald-bus.

use std::path::PathBuf;

use thiserror::Error;

/// Error surface of the cross-context transport.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// `SignalBroadcast::spawn` was called outside a tokio runtime.
    #[error("the signal watcher needs a running tokio runtime")]
    NoRuntime,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BusError {
    BusError::Io {
        path: path.into(),
        source,
    }
}
