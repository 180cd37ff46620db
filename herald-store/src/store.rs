//! Durable key-value store: one JSON file per document key.
//!
//! # Write protocol
//!
//! serialize → `<key>.json.<pid>-<uuid>.tmp` sibling → `chmod 0600` →
//! `rename`. Every write gets its own temp file, so concurrent writers never
//! share one. The rename makes a write atomic for readers of this and every
//! other context, but there is no locking: when two contexts write the same
//! key the later rename wins and the earlier write's changes are gone.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use herald_core::DocumentKey;

use crate::error::{io_err, StoreError};
use crate::paths;

/// File-backed content store rooted at `<home>/.herald/store/`.
#[derive(Debug, Clone)]
pub struct FileStore {
    home: PathBuf,
}

impl FileStore {
    /// Store rooted at an explicit home directory; used by tests with `TempDir`.
    pub fn at(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn path_for(&self, key: &DocumentKey) -> PathBuf {
        paths::document_path(&self.home, key)
    }

    pub fn exists(&self, key: &DocumentKey) -> bool {
        self.path_for(key).exists()
    }

    /// Read the raw stored value for `key`.
    ///
    /// Returns [`StoreError::NotFound`] if nothing is stored and
    /// [`StoreError::Decode`] if the payload is not valid JSON.
    pub fn read(&self, key: &DocumentKey) -> Result<Value, StoreError> {
        self.read_as(key)
    }

    /// Read and decode the stored value for `key` into `T`.
    pub fn read_as<T: DeserializeOwned>(&self, key: &DocumentKey) -> Result<T, StoreError> {
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    key: key.clone(),
                    path,
                })
            }
            Err(err) => return Err(io_err(path, err)),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Decode {
            key: key.clone(),
            path,
            source,
        })
    }

    /// Atomically replace the stored value for `key`.
    pub fn write<T: Serialize>(&self, key: &DocumentKey, value: &T) -> Result<(), StoreError> {
        let dir = paths::store_dir(&self.home);
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
            set_dir_permissions(&dir)?;
        }

        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
            key: key.clone(),
            source,
        })?;
        let path = self.path_for(key);
        let tmp = path.with_file_name(format!(
            "{key}.json.{}-{}.tmp",
            std::process::id(),
            Uuid::new_v4().simple()
        ));
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        set_file_permissions(&tmp)?;
        if let Err(err) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&path, err));
        }
        tracing::debug!("wrote {}", path.display());
        Ok(())
    }

    /// Move the payload stored for `key` aside to
    /// `<key>.json.corrupt-<unix-millis>`.
    ///
    /// Returns the quarantine path, or `None` if nothing was stored.
    pub fn quarantine(&self, key: &DocumentKey) -> Result<Option<PathBuf>, StoreError> {
        let path = self.path_for(key);
        let target = path.with_file_name(format!(
            "{key}.json.corrupt-{}",
            Utc::now().timestamp_millis()
        ));
        match std::fs::rename(&path, &target) {
            Ok(()) => {
                tracing::warn!(
                    "quarantined undecodable '{key}' payload to {}",
                    target.display()
                );
                Ok(Some(target))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_err(&path, err)),
        }
    }

    /// Document keys currently present on disk, sorted.
    ///
    /// Files whose names are not valid keys are ignored.
    pub fn keys(&self) -> Result<Vec<DocumentKey>, StoreError> {
        let dir = paths::store_dir(&self.home);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(err) => return Err(io_err(&dir, err)),
        };
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&dir, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            match stem.parse::<DocumentKey>() {
                Ok(key) => keys.push(key),
                Err(err) => tracing::debug!("skipping {name}: {err}"),
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn read_missing_is_not_found() {
        let home = TempDir::new().expect("home");
        let err = FileStore::at(home.path()).read(&DocumentKey::Home).unwrap_err();
        assert!(err.is_not_found(), "got: {err}");
    }

    #[test]
    fn write_then_read_roundtrip() {
        let home = TempDir::new().expect("home");
        let store = FileStore::at(home.path());
        let value = json!({ "group": { "title": "T", "description": "D" } });
        store.write(&DocumentKey::Home, &value).expect("write");
        assert_eq!(store.read(&DocumentKey::Home).expect("read"), value);
    }

    #[test]
    fn malformed_payload_is_decode_error() {
        let home = TempDir::new().expect("home");
        let store = FileStore::at(home.path());
        let path = store.path_for(&DocumentKey::News);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ \"items\": [ unclosed").unwrap();

        let err = store.read(&DocumentKey::News).unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }), "got: {err}");
        assert!(err.to_string().contains("news.json"));
    }

    #[test]
    fn invalid_utf8_is_decode_error() {
        let home = TempDir::new().expect("home");
        let store = FileStore::at(home.path());
        let path = store.path_for(&DocumentKey::Home);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            store.read(&DocumentKey::Home),
            Err(StoreError::Decode { .. })
        ));
    }

    #[test]
    fn atomic_write_cleans_up_tmp() {
        let home = TempDir::new().expect("home");
        let store = FileStore::at(home.path());
        store.write(&DocumentKey::Users, &json!({})).expect("write");
        store.write(&DocumentKey::Users, &json!({ "v": 2 })).expect("write");
        let leftovers: Vec<String> = std::fs::read_dir(paths::store_dir(home.path()))
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[test]
    fn later_write_wins() {
        let home = TempDir::new().expect("home");
        let first = FileStore::at(home.path());
        let second = FileStore::at(home.path());
        first.write(&DocumentKey::Home, &json!({ "v": 1 })).unwrap();
        second.write(&DocumentKey::Home, &json!({ "v": 2 })).unwrap();
        assert_eq!(first.read(&DocumentKey::Home).unwrap(), json!({ "v": 2 }));
    }

    #[test]
    fn quarantine_moves_payload_aside() {
        let home = TempDir::new().expect("home");
        let store = FileStore::at(home.path());
        store.write(&DocumentKey::Images, &json!("x")).unwrap();
        let moved = store
            .quarantine(&DocumentKey::Images)
            .expect("quarantine")
            .expect("something moved");
        assert!(moved.exists());
        assert!(!store.exists(&DocumentKey::Images));
        assert!(store.quarantine(&DocumentKey::Images).unwrap().is_none());
    }

    #[test]
    fn keys_lists_valid_entries_only() {
        let home = TempDir::new().expect("home");
        let store = FileStore::at(home.path());
        assert!(store.keys().unwrap().is_empty());
        store.write(&DocumentKey::News, &json!({})).unwrap();
        store.write(&"subsidiary.tech".parse().unwrap(), &json!({})).unwrap();
        std::fs::write(paths::store_dir(home.path()).join("notes.txt"), "x").unwrap();
        std::fs::write(paths::store_dir(home.path()).join("Bogus.json"), "{}").unwrap();
        let keys: Vec<String> = store.keys().unwrap().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["news", "subsidiary.tech"]);
    }

    #[cfg(unix)]
    #[test]
    fn written_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let home = TempDir::new().expect("home");
        let store = FileStore::at(home.path());
        store.write(&DocumentKey::Users, &json!({})).unwrap();
        let mode = std::fs::metadata(store.path_for(&DocumentKey::Users))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }
}
