//! Service registry: well-known name to runtime client.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::HutchResult;
use crate::service::ContainerRuntime;

use super::client::PortalClient;

/// Resolves a well-known service name to a runtime client.
///
/// This is the capability-injection seam: production code uses
/// [`SocketRegistry`], tests hand the session manager an in-memory fake.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Look up a service by name. `Ok(None)` means the registry has no
    /// live entry; errors are registry failures, not absence.
    async fn lookup(&self, name: &str) -> HutchResult<Option<Arc<dyn ContainerRuntime>>>;
}

/// Registry backed by a directory of daemon sockets.
///
/// A service named `n` is available iff `<runtime_dir>/<n>.sock` exists.
/// Existence is the only check here; a stale socket surfaces later as a
/// `Communication` error on first use, which invalidates the handle and
/// sends the caller back through this lookup.
pub struct SocketRegistry {
    runtime_dir: PathBuf,
}

impl SocketRegistry {
    pub fn new(runtime_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime_dir: runtime_dir.into(),
        }
    }

    fn socket_path(&self, name: &str) -> PathBuf {
        self.runtime_dir.join(format!("{}.sock", name))
    }
}

#[async_trait]
impl ServiceRegistry for SocketRegistry {
    async fn lookup(&self, name: &str) -> HutchResult<Option<Arc<dyn ContainerRuntime>>> {
        let path = self.socket_path(name);
        match tokio::fs::metadata(&path).await {
            Ok(_) => {
                tracing::debug!(service = %name, socket = %path.display(), "service socket found");
                Ok(Some(Arc::new(PortalClient::new(path))))
            }
            Err(e) => {
                tracing::debug!(service = %name, socket = %path.display(), error = %e, "service socket missing");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_misses_when_socket_absent() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SocketRegistry::new(dir.path());
        assert!(registry.lookup("hutchd").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_hits_when_socket_exists() {
        let dir = tempfile::tempdir().unwrap();
        // Any filesystem entry at the socket path counts as registered.
        std::fs::write(dir.path().join("hutchd.sock"), b"").unwrap();
        let registry = SocketRegistry::new(dir.path());
        assert!(registry.lookup("hutchd").await.unwrap().is_some());
    }
}
