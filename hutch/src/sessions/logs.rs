//! Per-container log buffers and listener fan-out.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::service::ContainerId;

/// Appended after every fragment so the buffer reads as lines.
pub(crate) const LINE_TERMINATOR: char = '\n';

/// Callback invoked with each newly observed log fragment.
///
/// Called synchronously on the collector's own task, so implementations
/// must not block; hand fragments off to your own executor (a channel is
/// enough) if delivery involves I/O. Fragments arrive with surrounding
/// whitespace trimmed; they are never empty, never duplicated, and arrive
/// strictly in poll order per container.
pub trait LogListener: Send + Sync {
    fn on_log_updated(&self, container_id: &str, fragment: &str);
}

/// Buffer and listener set for one container.
///
/// Each container has its own locks, so collectors never contend with each
/// other, only with readers of the same container.
struct ContainerLog {
    buffer: Mutex<String>,
    listeners: Mutex<Vec<Weak<dyn LogListener>>>,
}

impl ContainerLog {
    fn new() -> Self {
        Self {
            buffer: Mutex::new(String::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }
}

/// Registry of per-container log state, keyed by container id.
///
/// Entries are created on first touch and kept after collection stops;
/// buffered text survives until [`clear`](Self::clear).
#[derive(Default)]
pub struct LogRegistry {
    containers: RwLock<HashMap<ContainerId, Arc<ContainerLog>>>,
}

impl LogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: &str) -> Arc<ContainerLog> {
        if let Some(log) = self.containers.read().get(id) {
            return log.clone();
        }
        self.containers
            .write()
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(ContainerLog::new()))
            .clone()
    }

    /// Append a fragment (plus terminator) to the buffer, then notify every
    /// currently registered listener with the raw fragment.
    ///
    /// Listeners run without any registry lock held: the listener set is
    /// snapshotted first, so a callback may unregister itself (or anyone
    /// else) without corrupting iteration. Dropped listeners are pruned
    /// afterwards.
    pub fn append_fragment(&self, id: &str, fragment: &str) {
        let log = self.entry(id);

        {
            let mut buffer = log.buffer.lock();
            buffer.push_str(fragment);
            buffer.push(LINE_TERMINATOR);
        }

        let snapshot: Vec<Weak<dyn LogListener>> = log.listeners.lock().clone();
        for weak in &snapshot {
            if let Some(listener) = weak.upgrade() {
                listener.on_log_updated(id, fragment);
            }
        }
        log.listeners.lock().retain(|w| w.strong_count() > 0);
    }

    /// Point-in-time copy of the buffered text; empty if the container has
    /// never logged. Never a live view.
    pub fn buffered(&self, id: &str) -> String {
        match self.containers.read().get(id) {
            Some(log) => log.buffer.lock().clone(),
            None => String::new(),
        }
    }

    /// Truncate the buffer. Collection state is untouched; a running
    /// collector keeps appending afterwards.
    pub fn clear(&self, id: &str) {
        if let Some(log) = self.containers.read().get(id) {
            log.buffer.lock().clear();
            tracing::debug!(container = %id, "log buffer cleared");
        }
    }

    /// Register a listener for one container's fragments.
    ///
    /// Only a weak reference is kept: registration never extends the
    /// caller's lifetime, and a dropped listener silently stops receiving.
    pub fn register_listener<L>(&self, id: &str, listener: &Arc<L>)
    where
        L: LogListener + 'static,
    {
        let weak = Arc::downgrade(listener);
        let weak: Weak<dyn LogListener> = weak;
        self.entry(id).listeners.lock().push(weak);
    }

    /// Remove a previously registered listener. Safe to call from inside
    /// the listener's own callback.
    pub fn unregister_listener<L>(&self, id: &str, listener: &Arc<L>)
    where
        L: LogListener + 'static,
    {
        if let Some(log) = self.containers.read().get(id) {
            log.listeners
                .lock()
                .retain(|w| !std::ptr::addr_eq(w.as_ptr(), Arc::as_ptr(listener)));
        }
    }

    /// Number of live listeners for a container (diagnostics hook).
    pub fn listener_count(&self, id: &str) -> usize {
        match self.containers.read().get(id) {
            Some(log) => log
                .listeners
                .lock()
                .iter()
                .filter(|w| w.strong_count() > 0)
                .count(),
            None => 0,
        }
    }
}
