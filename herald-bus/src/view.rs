//! Consumer adapter: what a rendering layer holds on to.
//!
//! A [`ContentView`] keeps the latest observed document for each key it was
//! activated with. While active it follows the repository's bus; while
//! inactive it misses everything, and the next [`activate`](ContentView::activate)
//! catches up by reading the store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use herald_core::{ContentChanged, ContentDocument, DocumentKey, Listener, SubscriptionId};
use herald_store::{ContentRepository, StoreError};

type Observed = Arc<Mutex<HashMap<DocumentKey, ContentDocument>>>;

pub struct ContentView {
    repo: Arc<ContentRepository>,
    observed: Observed,
    on_change: Option<Listener>,
    subscription: Option<SubscriptionId>,
}

impl ContentView {
    pub fn new(repo: Arc<ContentRepository>) -> Self {
        Self {
            repo,
            observed: Arc::new(Mutex::new(HashMap::new())),
            on_change: None,
            subscription: None,
        }
    }

    /// Call `callback` whenever an incoming change alters an observed
    /// document. Redelivery of a document already observed does not call it.
    pub fn on_change(
        mut self,
        callback: impl Fn(&ContentChanged) + Send + Sync + 'static,
    ) -> Self {
        self.on_change = Some(Arc::new(callback));
        self
    }

    /// Start following `keys`, reading each one fresh from the store.
    ///
    /// Re-activating replaces the previous key set.
    pub fn activate(&mut self, keys: &[DocumentKey]) -> Result<(), StoreError> {
        self.deactivate();
        lock(&self.observed).clear();

        // Subscribe before the catch-up read so that nothing published in
        // between is missed. A change delivered while the read is in flight
        // may be newer than what the read returns, so the read only fills
        // keys that nothing has been delivered for yet.
        let observed = self.observed.clone();
        let on_change = self.on_change.clone();
        let following: Vec<DocumentKey> = keys.to_vec();
        let listener: Listener = Arc::new(move |change: &ContentChanged| {
            if !following.contains(&change.key) {
                return;
            }
            let replaced = {
                let mut docs = lock(&observed);
                let unchanged = docs.get(&change.key) == Some(&change.document);
                if !unchanged {
                    docs.insert(change.key.clone(), change.document.clone());
                }
                !unchanged
            };
            if replaced {
                if let Some(callback) = &on_change {
                    callback(change);
                }
            }
        });
        self.subscription = Some(self.repo.bus().subscribe(listener));

        for key in keys {
            let doc = match self.repo.reload(key) {
                Ok(doc) => doc,
                Err(err) => {
                    self.deactivate();
                    return Err(err);
                }
            };
            lock(&self.observed).entry(key.clone()).or_insert(doc);
        }
        tracing::debug!(keys = keys.len(), "content view activated");
        Ok(())
    }

    /// Stop following. Returns `false` if the view was not active.
    pub fn deactivate(&mut self) -> bool {
        match self.subscription.take() {
            Some(id) => self.repo.bus().unsubscribe(id),
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// The latest observed document for `key`.
    pub fn current(&self, key: &DocumentKey) -> Option<ContentDocument> {
        lock(&self.observed).get(key).cloned()
    }

    pub fn keys(&self) -> Vec<DocumentKey> {
        let mut keys: Vec<DocumentKey> = lock(&self.observed).keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Drop for ContentView {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl std::fmt::Debug for ContentView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentView")
            .field("keys", &self.keys())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

fn lock(observed: &Observed) -> MutexGuard<'_, HashMap<DocumentKey, ContentDocument>> {
    observed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use herald_core::{Broadcast, LocalBroadcast, SectionKey};
    use herald_store::FileStore;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn repo(home: &TempDir) -> Arc<ContentRepository> {
        Arc::new(ContentRepository::new(
            FileStore::at(home.path()),
            Arc::new(LocalBroadcast::new()),
        ))
    }

    #[test]
    fn activation_reads_the_store() {
        let home = TempDir::new().expect("home");
        let repo = repo(&home);
        let mut view = ContentView::new(repo.clone());
        assert!(view.current(&DocumentKey::Home).is_none());

        view.activate(&[DocumentKey::Home]).unwrap();
        assert!(view.is_active());
        assert_eq!(
            view.current(&DocumentKey::Home),
            Some(repo.load(&DocumentKey::Home).unwrap())
        );
    }

    #[test]
    fn follows_changes_only_while_active() {
        let home = TempDir::new().expect("home");
        let repo = repo(&home);
        let mut view = ContentView::new(repo.clone());
        view.activate(&[DocumentKey::Home]).unwrap();

        let group: SectionKey = "home.group".parse().unwrap();
        repo.replace_section(&group, json!({ "title": "one", "description": "" }))
            .unwrap();
        let seen = view.current(&DocumentKey::Home).unwrap();
        assert_eq!(seen.section("group").unwrap()["title"], "one");

        assert!(view.deactivate());
        repo.replace_section(&group, json!({ "title": "two", "description": "" }))
            .unwrap();
        let stale = view.current(&DocumentKey::Home).unwrap();
        assert_eq!(stale.section("group").unwrap()["title"], "one");

        view.activate(&[DocumentKey::Home]).unwrap();
        let caught_up = view.current(&DocumentKey::Home).unwrap();
        assert_eq!(caught_up.section("group").unwrap()["title"], "two");
    }

    #[test]
    fn redelivery_is_idempotent() {
        let home = TempDir::new().expect("home");
        let repo = repo(&home);
        let renders = Arc::new(AtomicUsize::new(0));
        let counter = renders.clone();
        let mut view = ContentView::new(repo.clone()).on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        view.activate(&[DocumentKey::Home]).unwrap();

        let mut doc = view.current(&DocumentKey::Home).unwrap();
        doc.set_section("group", json!({ "title": "x", "description": "y" }));
        let change = ContentChanged {
            key: DocumentKey::Home,
            document: doc.clone(),
        };
        repo.bus().publish(&change).unwrap();
        repo.bus().publish(&change).unwrap();

        assert_eq!(renders.load(Ordering::SeqCst), 1);
        assert_eq!(view.current(&DocumentKey::Home), Some(doc));
    }

    #[test]
    fn ignores_keys_it_does_not_follow() {
        let home = TempDir::new().expect("home");
        let repo = repo(&home);
        let mut view = ContentView::new(repo.clone());
        view.activate(&[DocumentKey::News]).unwrap();

        let hero: SectionKey = "home.hero".parse().unwrap();
        repo.replace_section(&hero, json!({ "title": "B" })).unwrap();
        assert!(view.current(&DocumentKey::Home).is_none());
        assert_eq!(view.keys(), vec![DocumentKey::News]);
    }

    /// Delivers `pending` to each new subscriber straight away, standing in
    /// for a remote change that lands while the catch-up read is running.
    struct DeliverOnSubscribe {
        inner: LocalBroadcast,
        pending: ContentChanged,
    }

    impl Broadcast for DeliverOnSubscribe {
        fn publish(&self, change: &ContentChanged) -> Result<(), herald_core::BroadcastError> {
            self.inner.publish(change)
        }

        fn subscribe(&self, listener: Listener) -> SubscriptionId {
            let id = self.inner.subscribe(listener.clone());
            listener(&self.pending);
            id
        }

        fn unsubscribe(&self, id: SubscriptionId) -> bool {
            self.inner.unsubscribe(id)
        }
    }

    #[test]
    fn change_delivered_during_activation_survives_the_catch_up_read() {
        let home = TempDir::new().expect("home");
        let mut newer = herald_core::default_document(&DocumentKey::Home);
        newer.set_section("group", json!({ "title": "newer", "description": "" }));
        let bus = Arc::new(DeliverOnSubscribe {
            inner: LocalBroadcast::new(),
            pending: ContentChanged {
                key: DocumentKey::Home,
                document: newer.clone(),
            },
        });
        let repo = Arc::new(ContentRepository::new(FileStore::at(home.path()), bus));
        let renders = Arc::new(AtomicUsize::new(0));
        let counter = renders.clone();
        let mut view = ContentView::new(repo.clone()).on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        view.activate(&[DocumentKey::Home]).unwrap();

        assert_ne!(repo.load(&DocumentKey::Home).unwrap(), newer);
        assert_eq!(view.current(&DocumentKey::Home), Some(newer));
        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_unsubscribes() {
        let home = TempDir::new().expect("home");
        let bus = Arc::new(LocalBroadcast::new());
        let repo = Arc::new(ContentRepository::new(
            FileStore::at(home.path()),
            bus.clone(),
        ));
        {
            let mut view = ContentView::new(repo);
            view.activate(&[DocumentKey::Home]).unwrap();
            assert_eq!(bus.listeners().len(), 1);
        }
        assert!(bus.listeners().is_empty());
    }
}
