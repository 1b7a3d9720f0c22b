//! Configuration for a session manager instance.

use std::path::PathBuf;
use std::time::Duration;

/// Well-known name the runtime daemon registers under.
pub const DEFAULT_SERVICE_NAME: &str = "hutchd";

/// Options controlling how a [`SessionManager`](crate::SessionManager)
/// reaches the runtime daemon and how often its background work runs.
#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Name the daemon is looked up under in the service registry.
    pub service_name: String,

    /// Directory holding the daemon's listening socket
    /// (`<runtime_dir>/<service_name>.sock`).
    pub runtime_dir: PathBuf,

    /// Delay between log polls for one container. Bounds both the remote
    /// call rate and the worst-case log latency.
    pub poll_interval: Duration,

    /// Interval between the watchdog's "is anything still running" checks.
    pub idle_check_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            runtime_dir: default_runtime_dir(),
            poll_interval: Duration::from_millis(100),
            idle_check_interval: Duration::from_secs(30),
        }
    }
}

/// `$XDG_RUNTIME_DIR/hutch`, falling back to `/run/hutch` for system
/// services without a user session.
fn default_runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(|| PathBuf::from("/run"))
        .join("hutch")
}
