//! Host-side portal to the runtime daemon.
//!
//! The daemon registers a Unix socket under a well-known name; the portal
//! resolves that name to a typed client ([`PortalClient`]) and caches it
//! behind [`ServiceHandle`] so the lifecycle client and all log collectors
//! share one resolution.

mod client;
mod handle;
pub mod protocol;
mod registry;

pub use client::PortalClient;
pub use handle::ServiceHandle;
pub use registry::{ServiceRegistry, SocketRegistry};
