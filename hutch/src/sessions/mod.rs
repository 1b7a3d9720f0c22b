//! Container session management.
//!
//! [`SessionManager`] is the crate's front door: synchronous lifecycle
//! operations against the runtime daemon, plus per-container log
//! collection with buffering and listener fan-out.

mod collector;
mod logs;

pub use logs::LogListener;

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::errors::{HutchError, HutchResult};
use crate::options::SessionOptions;
use crate::portal::{ServiceHandle, ServiceRegistry};
use crate::service::{ContainerId, ContainerRuntime, ImageSource};

use collector::{CollectorHandle, CollectorMap};
use logs::LogRegistry;

/// Session manager for one runtime daemon.
///
/// Lifecycle operations are plain async request/response calls on the
/// caller's task; do not invoke them from a latency-sensitive path. Log
/// collection runs one background task per container, all sharing the
/// manager's service handle.
///
/// Call [`shutdown`](Self::shutdown) before dropping the manager so every
/// collector has provably exited; dropping without it only requests
/// cancellation as a safety net.
pub struct SessionManager {
    handle: Arc<ServiceHandle>,
    logs: Arc<LogRegistry>,
    collectors: CollectorMap,
    next_generation: AtomicU64,
    options: SessionOptions,
}

impl SessionManager {
    /// Build a manager resolving the daemon through `registry` per
    /// `options`. Nothing is contacted until the first operation.
    pub fn new(registry: Arc<dyn ServiceRegistry>, options: SessionOptions) -> Self {
        let handle = Arc::new(ServiceHandle::new(registry, options.service_name.clone()));
        Self {
            handle,
            logs: Arc::new(LogRegistry::new()),
            collectors: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            options,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The shared service handle (diagnostics and tests).
    pub fn service_handle(&self) -> &ServiceHandle {
        &self.handle
    }

    /// Invalidate the handle on transport failure, then hand the error back.
    fn after_failure(&self, e: HutchError) -> HutchError {
        if e.invalidates_handle() {
            self.handle.invalidate();
        }
        e
    }

    async fn runtime(&self) -> HutchResult<Arc<dyn ContainerRuntime>> {
        self.handle.resolve().await
    }

    // ------------------------------------------------------------------
    // Lifecycle operations
    // ------------------------------------------------------------------

    /// Whether the container is currently running.
    pub async fn is_running(&self, id: &str) -> HutchResult<bool> {
        let runtime = self.runtime().await?;
        runtime
            .is_running(id)
            .await
            .map_err(|e| self.after_failure(e))
    }

    /// First listed container that is running, if any. O(n) remote calls;
    /// n is expected to be small.
    pub async fn first_running(&self) -> HutchResult<Option<ContainerId>> {
        for id in self.list_containers().await? {
            if self.is_running(&id).await? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Start a container, attached. `Ok(false)` means the daemon declined
    /// (already running, unknown id).
    pub async fn start(&self, id: &str) -> HutchResult<bool> {
        let runtime = self.runtime().await?;
        let ok = runtime
            .start(id, true)
            .await
            .map_err(|e| self.after_failure(e))?;
        if ok {
            tracing::debug!(container = %id, "container started");
        } else {
            tracing::warn!(container = %id, "runtime refused to start container");
        }
        Ok(ok)
    }

    /// Stop a running container.
    pub async fn stop(&self, id: &str) -> HutchResult<bool> {
        let runtime = self.runtime().await?;
        let ok = runtime.stop(id).await.map_err(|e| self.after_failure(e))?;
        if ok {
            tracing::debug!(container = %id, "container stopped");
        } else {
            tracing::warn!(container = %id, "runtime refused to stop container");
        }
        Ok(ok)
    }

    /// Register a new container from a local rootfs image file.
    ///
    /// Failing to open the file locally is `Ok(false)` and never contacts
    /// the daemon; the opened stream is released on every exit path.
    pub async fn add_container(&self, id: &str, image_path: &Path) -> HutchResult<bool> {
        let runtime = self.runtime().await?;

        let source = match ImageSource::from_file(image_path).await {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(
                    container = %id,
                    path = %image_path.display(),
                    error = %e,
                    "cannot open rootfs image"
                );
                return Ok(false);
            }
        };

        let ok = runtime
            .add_container(id, source)
            .await
            .map_err(|e| self.after_failure(e))?;
        if ok {
            tracing::debug!(container = %id, "container added");
        } else {
            tracing::warn!(container = %id, "runtime refused to add container");
        }
        Ok(ok)
    }

    /// Delete a container and its on-daemon state.
    pub async fn delete_container(&self, id: &str) -> HutchResult<bool> {
        let runtime = self.runtime().await?;
        let ok = runtime
            .delete_container(id)
            .await
            .map_err(|e| self.after_failure(e))?;
        if ok {
            tracing::debug!(container = %id, "container deleted");
        } else {
            tracing::warn!(container = %id, "runtime refused to delete container");
        }
        Ok(ok)
    }

    /// All known container ids in daemon order. An unavailable service
    /// degrades to an empty list; a transport failure still propagates.
    pub async fn list_containers(&self) -> HutchResult<Vec<ContainerId>> {
        let runtime = match self.runtime().await {
            Ok(runtime) => runtime,
            Err(HutchError::ServiceUnavailable(name)) => {
                tracing::debug!(service = %name, "service unavailable, reporting no containers");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        runtime
            .list_containers()
            .await
            .map_err(|e| self.after_failure(e))
    }

    // ------------------------------------------------------------------
    // Log collection
    // ------------------------------------------------------------------

    /// Start the background log collector for a container.
    ///
    /// Returns `false` (no-op) when a collector is already running for this
    /// id; at most one collector per container exists at any instant. Must
    /// be called from within a tokio runtime.
    pub fn start_collecting(&self, id: &str) -> bool {
        let mut collectors = self.collectors.lock();
        if collectors.contains_key(id) {
            tracing::debug!(container = %id, "collector already running");
            return false;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let join = collector::spawn(
            id.to_string(),
            generation,
            self.handle.clone(),
            self.logs.clone(),
            self.collectors.clone(),
            cancel.clone(),
            self.options.poll_interval,
        );
        collectors.insert(
            id.to_string(),
            CollectorHandle {
                generation,
                cancel,
                join: Some(join),
            },
        );
        true
    }

    /// Stop the collector for a container and wait for it to exit.
    ///
    /// When this returns, no further buffer writes can occur for this id.
    /// The registration stays in place until the worker has actually
    /// exited, so a `start_collecting` racing with the drain is refused
    /// rather than overlapping two workers. A no-op (logged) when nothing
    /// is collecting.
    pub async fn stop_collecting(&self, id: &str) {
        let taken = {
            let mut collectors = self.collectors.lock();
            collectors
                .get_mut(id)
                .map(|handle| (handle.cancel.clone(), handle.join.take()))
        };
        match taken {
            None => {
                tracing::debug!(container = %id, "no collector to stop");
            }
            Some((cancel, None)) => {
                // Another stop already took the join handle and is waiting.
                cancel.cancel();
                tracing::debug!(container = %id, "collector already stopping");
            }
            Some((cancel, Some(join))) => {
                cancel.cancel();
                if let Err(e) = join.await {
                    tracing::warn!(container = %id, error = %e, "collector task failed");
                }
                tracing::debug!(container = %id, "collector stopped");
            }
        }
    }

    /// Whether a collector is currently running for this container.
    pub fn is_collecting(&self, id: &str) -> bool {
        self.collectors.lock().contains_key(id)
    }

    /// Point-in-time copy of the buffered logs; empty if none.
    pub fn buffered_logs(&self, id: &str) -> String {
        self.logs.buffered(id)
    }

    /// Truncate the log buffer without touching collection state.
    pub fn clear_logs(&self, id: &str) {
        self.logs.clear(id);
    }

    /// Register a listener for a container's log fragments. Only a weak
    /// reference is kept; see [`LogListener`] for the delivery contract.
    pub fn register_listener<L>(&self, id: &str, listener: &Arc<L>)
    where
        L: LogListener + 'static,
    {
        self.logs.register_listener(id, listener);
    }

    /// Remove a previously registered listener.
    pub fn unregister_listener<L>(&self, id: &str, listener: &Arc<L>)
    where
        L: LogListener + 'static,
    {
        self.logs.unregister_listener(id, listener);
    }

    /// Number of live listeners for a container (diagnostics hook).
    pub fn listener_count(&self, id: &str) -> usize {
        self.logs.listener_count(id)
    }

    /// Stop every collector and wait for each to exit. Workers deregister
    /// themselves on the way out.
    pub async fn shutdown(&self) {
        let draining: Vec<_> = {
            let mut collectors = self.collectors.lock();
            collectors
                .iter_mut()
                .map(|(id, handle)| (id.clone(), handle.cancel.clone(), handle.join.take()))
                .collect()
        };
        for (id, cancel, join) in draining {
            cancel.cancel();
            if let Some(join) = join {
                if let Err(e) = join.await {
                    tracing::warn!(container = %id, error = %e, "collector task failed");
                }
                tracing::debug!(container = %id, "collector stopped");
            }
        }
    }
}

impl Drop for SessionManager {
    /// Best-effort cancellation for collectors that outlive the manager.
    /// Prefer [`SessionManager::shutdown`], which also waits for exits.
    fn drop(&mut self) {
        for handle in self.collectors.lock().values() {
            handle.cancel.cancel();
        }
    }
}
