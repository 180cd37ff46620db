//! The dual-channel bus a context hands to its repository.

use std::path::Path;
use std::sync::Arc;

use herald_core::{
    Broadcast, BroadcastError, ContentChanged, ContextId, Listener, ListenerSet, LocalBroadcast,
    SubscriptionId,
};

use crate::error::BusError;
use crate::signal::SignalBroadcast;

/// Same-context and cross-context transports behind one [`Broadcast`].
///
/// Both transports feed the same [`ListenerSet`], so a subscriber registered
/// once sees changes made in this context (synchronously, during `publish`)
/// and changes signalled by other contexts (asynchronously, from the watcher
/// task).
#[derive(Debug)]
pub struct ContentBus {
    listeners: Arc<ListenerSet>,
    local: LocalBroadcast,
    signal: SignalBroadcast,
}

impl ContentBus {
    /// Bus that announces to other contexts but does not listen to them.
    ///
    /// Suited to one-shot processes; needs no runtime.
    pub fn publisher(home: &Path, context: ContextId) -> Self {
        let listeners = Arc::new(ListenerSet::new());
        Self {
            local: LocalBroadcast::with_listeners(listeners.clone()),
            signal: SignalBroadcast::publisher_with_listeners(home, context, listeners.clone()),
            listeners,
        }
    }

    /// Bus that also watches for other contexts' signals. Must be called from
    /// within a tokio runtime.
    pub fn spawn(home: &Path, context: ContextId) -> Result<Self, BusError> {
        let listeners = Arc::new(ListenerSet::new());
        Ok(Self {
            local: LocalBroadcast::with_listeners(listeners.clone()),
            signal: SignalBroadcast::spawn(home, context, listeners.clone())?,
            listeners,
        })
    }

    pub fn context(&self) -> ContextId {
        self.signal.origin()
    }

    pub fn is_watching(&self) -> bool {
        self.signal.is_watching()
    }

    pub fn subscribers(&self) -> usize {
        self.listeners.len()
    }
}

impl Broadcast for ContentBus {
    /// Deliver to this context's listeners, then signal the others.
    ///
    /// Local delivery happens even when signalling fails.
    fn publish(&self, change: &ContentChanged) -> Result<(), BroadcastError> {
        self.local.publish(change)?;
        self.signal.publish(change)
    }

    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }
}
