//! Canonical document façade for one execution context.
//!
//! [`ContentRepository`] owns the context's [`DocumentCache`]. The cache is
//! populated by the first [`load`](ContentRepository::load) of a key and
//! updated only by [`save`](ContentRepository::save) and
//! [`reload`](ContentRepository::reload); nothing else mutates it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use herald_core::{Broadcast, ContentChanged, ContentDocument, DocumentKey, SectionKey};

use crate::error::StoreError;
use crate::integrity::{self, RepairReport};
use crate::store::FileStore;

/// Canonical documents already read by this context.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: Mutex<HashMap<DocumentKey, ContentDocument>>,
}

impl DocumentCache {
    pub fn get(&self, key: &DocumentKey) -> Option<ContentDocument> {
        self.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &DocumentKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn put(&self, key: DocumentKey, document: ContentDocument) {
        self.lock().insert(key, document);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DocumentKey, ContentDocument>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Store + validator + cache + propagation, behind one API.
pub struct ContentRepository {
    store: FileStore,
    cache: DocumentCache,
    bus: Arc<dyn Broadcast>,
}

impl ContentRepository {
    pub fn new(store: FileStore, bus: Arc<dyn Broadcast>) -> Self {
        Self {
            store,
            cache: DocumentCache::default(),
            bus,
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub fn bus(&self) -> &Arc<dyn Broadcast> {
        &self.bus
    }

    /// Canonical document for `key`: cached, or read and repaired on first use.
    pub fn load(&self, key: &DocumentKey) -> Result<ContentDocument, StoreError> {
        if let Some(doc) = self.cache.get(key) {
            return Ok(doc);
        }
        self.reload(key)
    }

    /// Read `key` from the store (repairing it), bypassing and refreshing the
    /// cache.
    pub fn reload(&self, key: &DocumentKey) -> Result<ContentDocument, StoreError> {
        self.check(key).map(|(doc, _)| doc)
    }

    /// Like [`reload`](Self::reload), also returning the validator's report.
    pub fn check(&self, key: &DocumentKey) -> Result<(ContentDocument, RepairReport), StoreError> {
        let (doc, report) = integrity::load_and_repair(&self.store, key)?;
        self.cache.put(key.clone(), doc.clone());
        Ok((doc, report))
    }

    /// Make `document` canonical for `key`: normalise, write, cache, announce.
    ///
    /// Returns the document as stored.
    pub fn save(
        &self,
        key: &DocumentKey,
        document: &ContentDocument,
    ) -> Result<ContentDocument, StoreError> {
        let normalized = integrity::normalize(key, document);
        self.store.write(key, &normalized)?;
        self.cache.put(key.clone(), normalized.clone());
        self.announce(key, &normalized);
        Ok(normalized)
    }

    /// Replace one section of the current canonical document.
    pub fn replace_section(
        &self,
        section: &SectionKey,
        value: Value,
    ) -> Result<ContentDocument, StoreError> {
        let mut doc = self.reload(section.document())?;
        doc.set_section(section.section(), value);
        self.save(section.document(), &doc)
    }

    /// Publish `document` as the new state of `key` on the bus.
    ///
    /// The store is already authoritative when this runs, so a failed publish
    /// is logged and otherwise ignored: late contexts catch up from the store.
    pub fn announce(&self, key: &DocumentKey, document: &ContentDocument) {
        let change = ContentChanged {
            key: key.clone(),
            document: document.clone(),
        };
        if let Err(err) = self.bus.publish(&change) {
            tracing::warn!("{err}");
        }
    }
}

impl std::fmt::Debug for ContentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRepository")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use herald_core::{default_document, LocalBroadcast};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn repo(home: &TempDir) -> (ContentRepository, Arc<Mutex<Vec<ContentChanged>>>) {
        let bus = LocalBroadcast::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(Arc::new(move |c: &ContentChanged| {
            sink.lock().unwrap().push(c.clone());
        }));
        (
            ContentRepository::new(FileStore::at(home.path()), Arc::new(bus)),
            seen,
        )
    }

    #[test]
    fn first_load_populates_cache() {
        let home = TempDir::new().expect("home");
        let (repo, _) = repo(&home);
        assert!(repo.cache().is_empty());
        repo.load(&DocumentKey::Home).expect("load");
        assert!(repo.cache().contains(&DocumentKey::Home));
    }

    #[test]
    fn load_serves_cache_until_reload() {
        let home = TempDir::new().expect("home");
        let (repo, _) = repo(&home);
        let before = repo.load(&DocumentKey::Home).unwrap();

        // Another context overwrites the store behind our back.
        let mut changed = before.clone();
        changed.set_section("group", json!({ "title": "X", "description": "Y" }));
        FileStore::at(home.path())
            .write(&DocumentKey::Home, &changed)
            .unwrap();

        assert_eq!(repo.load(&DocumentKey::Home).unwrap(), before);
        assert_eq!(repo.reload(&DocumentKey::Home).unwrap(), changed);
        assert_eq!(repo.load(&DocumentKey::Home).unwrap(), changed);
    }

    #[test]
    fn save_normalizes_writes_and_announces() {
        let home = TempDir::new().expect("home");
        let (repo, seen) = repo(&home);
        let mut doc = ContentDocument::new();
        doc.set_section("hero", json!({ "title": "B" }));

        let saved = repo.save(&DocumentKey::Home, &doc).expect("save");
        assert_eq!(saved.section("hero").unwrap()["title"], "B");
        assert_eq!(
            saved.section("stats"),
            default_document(&DocumentKey::Home).section("stats")
        );
        assert_eq!(repo.store().read(&DocumentKey::Home).unwrap(), saved.clone().into_value());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].key, DocumentKey::Home);
        assert_eq!(seen[0].document, saved);
    }

    #[test]
    fn replace_section_keeps_other_sections() {
        let home = TempDir::new().expect("home");
        let (repo, _) = repo(&home);
        let section: SectionKey = "home.group".parse().unwrap();
        let doc = repo
            .replace_section(&section, json!({ "title": "새 소개", "description": "D" }))
            .unwrap();
        assert_eq!(doc.section("group").unwrap()["title"], "새 소개");
        assert_eq!(doc.section("hero"), default_document(&DocumentKey::Home).section("hero"));
    }
}
