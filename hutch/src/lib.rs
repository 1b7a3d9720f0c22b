//! Hutch - client-side session manager for the `hutchd` container runtime.
//!
//! Hutch talks to a remote container-runtime daemon over a Unix socket and
//! exposes:
//!
//! - synchronous lifecycle operations (start/stop/add/delete/list/is-running),
//! - continuous per-container log collection with thread-safe buffering and
//!   listener fan-out,
//! - an idle watchdog that lets the hosting process exit once nothing is
//!   running.
//!
//! The daemon itself is out of scope: the crate ends at the
//! [`ContainerRuntime`] trait, with [`PortalClient`] as the production
//! implementation and in-memory fakes for tests.
//!
//! # Quick tour
//!
//! ```no_run
//! use std::sync::Arc;
//! use hutch::{SessionManager, SessionOptions, SocketRegistry};
//!
//! # async fn run() -> hutch::HutchResult<()> {
//! let options = SessionOptions::default();
//! let registry = Arc::new(SocketRegistry::new(options.runtime_dir.clone()));
//! let sessions = SessionManager::new(registry, options);
//!
//! if sessions.start("alpine-1").await? {
//!     sessions.start_collecting("alpine-1");
//! }
//! // ... later ...
//! sessions.stop_collecting("alpine-1").await;
//! println!("{}", sessions.buffered_logs("alpine-1"));
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod options;
pub mod portal;
pub mod service;
pub mod sessions;
pub mod watchdog;

pub use errors::{HutchError, HutchResult};
pub use options::{SessionOptions, DEFAULT_SERVICE_NAME};
pub use portal::{PortalClient, ServiceHandle, ServiceRegistry, SocketRegistry};
pub use service::{ContainerId, ContainerRuntime, ImageSource};
pub use sessions::{LogListener, SessionManager};
pub use watchdog::{DeviceForwarding, HostControl, HostWatchdog, PRIMARY_DEVICE};
