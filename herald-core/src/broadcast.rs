//! The change propagation contract.
//!
//! Every transport implements [`Broadcast`]: `publish` a [`ContentChanged`]
//! and `subscribe` a [`Listener`]. [`LocalBroadcast`] is the same-context
//! transport: delivery is synchronous, on the publisher's call stack, to every
//! listener registered in this process. The cross-context transport lives in
//! `herald-bus`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{ContentDocument, DocumentKey};

/// Identifies one execution context (one running instance sharing the store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Payload of every propagation signal: the new canonical document for a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChanged {
    #[serde(rename = "sectionKey")]
    pub key: DocumentKey,
    pub document: ContentDocument,
}

/// Callback invoked for every delivered change.
pub type Listener = Arc<dyn Fn(&ContentChanged) + Send + Sync>;

/// Handle returned by [`Broadcast::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Failure to hand a change to a transport.
#[derive(Debug, Error)]
#[error("failed to publish change for '{key}': {source}")]
pub struct BroadcastError {
    pub key: DocumentKey,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Publish/subscribe contract shared by every transport.
pub trait Broadcast: Send + Sync {
    fn publish(&self, change: &ContentChanged) -> Result<(), BroadcastError>;

    fn subscribe(&self, listener: Listener) -> SubscriptionId;

    /// Returns `false` if the subscription was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

// ---------------------------------------------------------------------------
// ListenerSet
// ---------------------------------------------------------------------------

/// Registered listeners of one context, shared by every transport feeding it.
#[derive(Default)]
pub struct ListenerSet {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, listener));
        id
    }

    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    /// Deliver `change` to every listener and return how many were called.
    ///
    /// Listeners run outside the lock, so they may subscribe, unsubscribe or
    /// publish themselves.
    pub fn dispatch(&self, change: &ContentChanged) -> usize {
        let snapshot: Vec<Listener> = self.lock().iter().map(|(_, l)| l.clone()).collect();
        for listener in &snapshot {
            listener(change);
        }
        snapshot.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet").field("len", &self.len()).finish()
    }
}

// ---------------------------------------------------------------------------
// LocalBroadcast
// ---------------------------------------------------------------------------

/// Same-context transport: synchronous in-process fan-out.
#[derive(Debug, Clone, Default)]
pub struct LocalBroadcast {
    listeners: Arc<ListenerSet>,
}

impl LocalBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share a listener set with another transport of the same context.
    pub fn with_listeners(listeners: Arc<ListenerSet>) -> Self {
        Self { listeners }
    }

    pub fn listeners(&self) -> Arc<ListenerSet> {
        self.listeners.clone()
    }
}

impl Broadcast for LocalBroadcast {
    fn publish(&self, change: &ContentChanged) -> Result<(), BroadcastError> {
        self.listeners.dispatch(change);
        Ok(())
    }

    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }
}
