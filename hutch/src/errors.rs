//! Error types for the hutch client library.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type HutchResult<T> = Result<T, HutchError>;

/// Failures surfaced by the session manager and the portal client.
///
/// Application-level refusals (the daemon answered but declined the request)
/// are **not** errors; lifecycle operations report them as `Ok(false)` so
/// callers can tell "service declined" apart from "could not reach the
/// service".
#[derive(Debug, Error)]
pub enum HutchError {
    /// The service registry has no live entry for the runtime service.
    #[error("container service '{0}' is not available")]
    ServiceUnavailable(String),

    /// A remote call failed at the transport level (peer died, socket error).
    /// The cached service handle must be discarded after this.
    #[error("communication with container service failed: {0}")]
    Communication(String),

    /// The daemon answered, but not with anything the protocol allows here.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Invariant violation inside this crate.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HutchError {
    /// Whether the cached service handle must be discarded after this error,
    /// forcing a fresh registry lookup on the next call.
    pub fn invalidates_handle(&self) -> bool {
        matches!(
            self,
            HutchError::ServiceUnavailable(_) | HutchError::Communication(_)
        )
    }
}
