//! Hosting-process watchdog and teardown.
//!
//! The hosting process stays alive only while something is still running
//! in the daemon. Every idle-check interval the watchdog asks whether any
//! container is running; once nothing is, it asks the host to shut down.
//! The check runs on the shared cooperative scheduler and never parks a
//! thread.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::sessions::SessionManager;

/// Device index the display and input forwarders are bound to.
pub const PRIMARY_DEVICE: u32 = 0;

/// Shutdown capability of the hosting process, injected by the integrator.
#[async_trait]
pub trait HostControl: Send + Sync {
    /// Ask the hosting process to exit. Called at most once per watchdog.
    async fn request_shutdown(&self);
}

/// Hardware-forwarding subsystems owned by the hosting process.
///
/// Implementations must tolerate teardown for a device that was never
/// brought up.
pub trait DeviceForwarding: Send + Sync {
    /// Release auxiliary socket resources (e.g. the audio bridge socket).
    fn release_sockets(&self);

    /// Tear down display forwarding for a device.
    fn teardown_display(&self, device: u32);

    /// Tear down input forwarding for a device.
    fn teardown_input(&self, device: u32);
}

/// Periodic idle check for the hosting process.
///
/// The host is supposed to be torn down by whoever started it; this is the
/// backstop for the case where the last container stops itself while
/// nobody is watching, so the host does not idle forever.
pub struct HostWatchdog {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl HostWatchdog {
    /// Spawn the watchdog task. It re-arms after every check that finds a
    /// running container and exits after requesting host shutdown.
    pub fn spawn(sessions: Arc<SessionManager>, host: Arc<dyn HostControl>) -> Self {
        let interval = sessions.options().idle_check_interval;
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                match sessions.first_running().await {
                    Ok(Some(id)) => {
                        tracing::trace!(container = %id, "container still running, watchdog re-armed");
                    }
                    Ok(None) => {
                        tracing::info!("no container running, requesting host shutdown");
                        host.request_shutdown().await;
                        break;
                    }
                    Err(e) => {
                        // Can't tell whether anything is running; keep the
                        // host alive and try again next interval.
                        tracing::warn!(error = %e, "idle check failed, will retry");
                    }
                }
            }
        });

        Self { cancel, join }
    }

    /// Cancel the watchdog and wait for its task to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.join.await;
    }
}

/// Deterministic host teardown, run when the hosting process shuts down.
///
/// Stops every log collector (waiting for each to exit), releases the
/// auxiliary sockets, then signals display and input forwarding to tear
/// down for the primary device.
pub async fn teardown_host(sessions: &SessionManager, forwarding: &dyn DeviceForwarding) {
    sessions.shutdown().await;
    forwarding.release_sockets();
    forwarding.teardown_display(PRIMARY_DEVICE);
    forwarding.teardown_input(PRIMARY_DEVICE);
    tracing::debug!("host teardown complete");
}
