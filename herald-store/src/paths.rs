//! On-disk layout.
//!
//! ```text
//! ~/.herald/
//!   store/
//!     <document-key>.json            (one canonical document per key, mode 0600)
//!     <document-key>.json.corrupt-*  (quarantined undecodable payloads)
//!   signals/
//!     <document-key>.json            (latest cross-context change envelope)
//! ```

use std::path::{Path, PathBuf};

use herald_core::DocumentKey;

use crate::error::StoreError;

pub const HERALD_DIR: &str = ".herald";

pub fn herald_root(home: &Path) -> PathBuf {
    home.join(HERALD_DIR)
}

pub fn store_dir(home: &Path) -> PathBuf {
    herald_root(home).join("store")
}

pub fn signals_dir(home: &Path) -> PathBuf {
    herald_root(home).join("signals")
}

/// `<home>/.herald/store/<key>.json`. Pure, no I/O.
pub fn document_path(home: &Path, key: &DocumentKey) -> PathBuf {
    store_dir(home).join(format!("{key}.json"))
}

/// `<home>/.herald/signals/<key>.json`. Pure, no I/O.
pub fn signal_path(home: &Path, key: &DocumentKey) -> PathBuf {
    signals_dir(home).join(format!("{key}.json"))
}

/// The current user's home directory.
pub fn home_dir() -> Result<PathBuf, StoreError> {
    dirs::home_dir().ok_or(StoreError::HomeNotFound)
}
