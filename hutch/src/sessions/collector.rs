//! Per-container log collection workers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::portal::ServiceHandle;
use crate::service::ContainerId;

use super::logs::LogRegistry;

/// Registration record for one live collector.
///
/// The entry stays in the map until the worker has fully exited, even
/// while a stop is draining it; a stopper takes the join handle but
/// leaves the registration behind so a racing start is refused. The
/// generation counter lets the worker remove only its own registration
/// on exit.
pub(super) struct CollectorHandle {
    pub(super) generation: u64,
    pub(super) cancel: CancellationToken,
    pub(super) join: Option<JoinHandle<()>>,
}

pub(super) type CollectorMap = Arc<Mutex<HashMap<ContainerId, CollectorHandle>>>;

/// Spawn the dedicated worker task for one container.
///
/// The loop polls the shared service handle once per iteration, appends
/// non-blank output to the container's buffer (notifying listeners), and
/// sleeps `poll_interval` between polls. Errors are recorded and never end
/// the loop; only cancellation does. Cancellation also wakes the sleep, so
/// a stop request is observed promptly.
pub(super) fn spawn(
    id: ContainerId,
    generation: u64,
    handle: Arc<ServiceHandle>,
    logs: Arc<LogRegistry>,
    collectors: CollectorMap,
    cancel: CancellationToken,
    poll_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!(container = %id, generation, "log collector started");

        while !cancel.is_cancelled() {
            match poll_once(&handle, &logs, &id).await {
                Ok(appended) => {
                    if appended {
                        tracing::trace!(container = %id, "appended log fragment");
                    }
                }
                Err(e) => {
                    if e.invalidates_handle() {
                        handle.invalidate();
                    }
                    tracing::warn!(container = %id, error = %e, "log poll failed, will retry");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }

        // Drop our own registration so a future start_collecting can
        // install a fresh worker. A successor with a newer generation is
        // left alone.
        {
            let mut map = collectors.lock();
            if map.get(&id).is_some_and(|h| h.generation == generation) {
                map.remove(&id);
            }
        }
        tracing::debug!(container = %id, generation, "log collector exited");
    })
}

/// One poll iteration: fetch, trim, append + fan out.
///
/// Returns whether a fragment was appended.
async fn poll_once(
    handle: &ServiceHandle,
    logs: &LogRegistry,
    id: &str,
) -> crate::HutchResult<bool> {
    let runtime = handle.resolve().await?;
    let text = runtime.fetch_logs(id).await?;
    let fragment = text.trim();
    if fragment.is_empty() {
        return Ok(false);
    }
    logs.append_fragment(id, fragment);
    Ok(true)
}
