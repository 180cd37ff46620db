//! Cross-context transport over signal files.
//!
//! ```text
//! context A                          <home>/.herald/signals/           context B
//! publish ──write tmp + rename──▶ <key>.json ──notify──▶ watcher task ──▶ listeners
//! ```
//!
//! Each key has one signal file holding the latest [`SignalEnvelope`]. A
//! context ignores envelopes carrying its own origin (its listeners were
//! already called by the same-context transport) and envelopes whose bytes
//! it has already dispatched. Nothing is replayed: a context that was not
//! watching when a signal was written catches up from the store instead.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{broadcast, mpsc};

use herald_core::{
    Broadcast, BroadcastError, ContentChanged, ContextId, Listener, ListenerSet, SubscriptionId,
};
use herald_store::paths::{signal_path, signals_dir};

use crate::error::{io_err, BusError};

/// What a signal file contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalEnvelope {
    pub origin: ContextId,
    pub published_at: DateTime<Utc>,
    pub change: ContentChanged,
}

impl SignalEnvelope {
    pub fn new(origin: ContextId, change: ContentChanged) -> Self {
        Self {
            origin,
            published_at: Utc::now(),
            change,
        }
    }
}

/// Cross-context [`Broadcast`] transport.
///
/// Built either as a plain publisher (no runtime needed) or with
/// [`spawn`](Self::spawn), which also starts a watcher task delivering other
/// contexts' signals to `listeners`. The watcher stops when this value is
/// dropped.
#[derive(Debug)]
pub struct SignalBroadcast {
    home: PathBuf,
    origin: ContextId,
    listeners: Arc<ListenerSet>,
    shutdown: Option<broadcast::Sender<()>>,
}

impl SignalBroadcast {
    /// Publish-only transport.
    pub fn publisher(home: &Path, origin: ContextId) -> Self {
        Self::publisher_with_listeners(home, origin, Arc::new(ListenerSet::new()))
    }

    pub fn publisher_with_listeners(
        home: &Path,
        origin: ContextId,
        listeners: Arc<ListenerSet>,
    ) -> Self {
        Self {
            home: home.to_path_buf(),
            origin,
            listeners,
            shutdown: None,
        }
    }

    /// Publish and watch. Must be called from within a tokio runtime.
    ///
    /// The watch is registered before this returns, so every signal written
    /// afterwards by another context is observed.
    pub fn spawn(
        home: &Path,
        origin: ContextId,
        listeners: Arc<ListenerSet>,
    ) -> Result<Self, BusError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BusError::NoRuntime)?;
        let dir = ensure_signals_dir(home)?;
        // Canonicalize so that FSEvents paths (which arrive as real paths)
        // match the `starts_with` check in `is_signal_file`.
        let dir = fs::canonicalize(&dir).unwrap_or(dir);

        let (event_tx, event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
        let mut watcher: RecommendedWatcher = recommended_watcher(move |event: notify::Result<Event>| {
            let _ = event_tx.send(event);
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let receiver = Receiver::new(dir, origin, listeners.clone());
        runtime.spawn(receiver.run(watcher, event_rx, shutdown_rx));
        tracing::debug!(context = %origin, "signal watcher started");

        Ok(Self {
            home: home.to_path_buf(),
            origin,
            listeners,
            shutdown: Some(shutdown_tx),
        })
    }

    pub fn origin(&self) -> ContextId {
        self.origin
    }

    pub fn listeners(&self) -> Arc<ListenerSet> {
        self.listeners.clone()
    }

    /// `true` while the watcher task is running.
    pub fn is_watching(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|tx| tx.receiver_count() > 0)
    }

    /// Stop the watcher task. Publishing keeps working.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    /// Write `change` for the other contexts and return the signal path.
    ///
    /// Listeners of this context are not called.
    pub fn send(&self, change: &ContentChanged) -> Result<PathBuf, BusError> {
        write_envelope(&self.home, &SignalEnvelope::new(self.origin, change.clone()))
    }
}

impl Drop for SignalBroadcast {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Broadcast for SignalBroadcast {
    fn publish(&self, change: &ContentChanged) -> Result<(), BroadcastError> {
        self.send(change).map(|_| ()).map_err(|err| BroadcastError {
            key: change.key.clone(),
            source: Box::new(err),
        })
    }

    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }
}

/// Atomically replace the signal file for the envelope's key.
pub fn write_envelope(home: &Path, envelope: &SignalEnvelope) -> Result<PathBuf, BusError> {
    ensure_signals_dir(home)?;
    let key = &envelope.change.key;
    let path = signal_path(home, key);
    // Per-origin temp name: two contexts signalling the same key never share one.
    let tmp = path.with_file_name(format!("{key}.json.{}.tmp", envelope.origin));
    let json = serde_json::to_vec_pretty(envelope)?;
    fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(err) = fs::rename(&tmp, &path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(&path, err));
    }
    tracing::trace!(key = %key, path = %path.display(), "signal written");
    Ok(path)
}

fn ensure_signals_dir(home: &Path) -> Result<PathBuf, BusError> {
    let dir = signals_dir(home);
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

// ---------------------------------------------------------------------------
// Watcher side
// ---------------------------------------------------------------------------

struct Receiver {
    dir: PathBuf,
    origin: ContextId,
    listeners: Arc<ListenerSet>,
    /// Digest of the last envelope dispatched per signal file.
    digests: HashMap<PathBuf, String>,
}

impl Receiver {
    fn new(dir: PathBuf, origin: ContextId, listeners: Arc<ListenerSet>) -> Self {
        Self {
            dir,
            origin,
            listeners,
            digests: HashMap::new(),
        }
    }

    async fn run(
        mut self,
        _watcher: RecommendedWatcher,
        mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    let event = match event {
                        Ok(event) => event,
                        Err(err) => {
                            tracing::warn!(error = %err, "signal watcher event error");
                            continue;
                        }
                    };
                    if !is_relevant_event_kind(&event.kind) {
                        continue;
                    }
                    for path in event.paths {
                        if is_signal_file(&path, &self.dir) {
                            self.receive(&path);
                        }
                    }
                }
            }
        }
        tracing::debug!(context = %self.origin, "signal watcher stopped");
    }

    /// Read one signal file and dispatch it if it is new and foreign.
    ///
    /// Returns the number of listeners called, or `None` if nothing was
    /// dispatched.
    fn receive(&mut self, path: &Path) -> Option<usize> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "signal unreadable");
                return None;
            }
        };

        let digest = hex::encode(Sha256::digest(&bytes));
        if self.digests.get(path) == Some(&digest) {
            return None;
        }
        self.digests.insert(path.to_path_buf(), digest);

        let envelope: SignalEnvelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping undecodable signal");
                return None;
            }
        };
        if envelope.origin == self.origin {
            return None;
        }

        let delivered = self.listeners.dispatch(&envelope.change);
        tracing::debug!(
            key = %envelope.change.key,
            origin = %envelope.origin,
            listeners = delivered,
            "signal delivered"
        );
        Some(delivered)
    }
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

fn is_signal_file(path: &Path, dir: &Path) -> bool {
    path.starts_with(dir)
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), BusError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), BusError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), BusError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), BusError> {
    Ok(())
}
