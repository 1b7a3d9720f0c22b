//! Cached handle to the runtime service.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::{HutchError, HutchResult};
use crate::service::ContainerRuntime;

use super::registry::ServiceRegistry;

/// Lazily resolved, wholesale-replaceable handle to the runtime service.
///
/// The cached runtime is shared by the lifecycle client and every log
/// collector. It is only ever swapped as a whole: readers see either a
/// valid client or a miss that sends them through one registry lookup.
/// There is no retry or backoff at this layer; each call site resolves at
/// most once per invocation.
pub struct ServiceHandle {
    name: String,
    registry: Arc<dyn ServiceRegistry>,
    cached: RwLock<Option<Arc<dyn ContainerRuntime>>>,
}

impl ServiceHandle {
    pub fn new(registry: Arc<dyn ServiceRegistry>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry,
            cached: RwLock::new(None),
        }
    }

    /// Name the service is looked up under.
    pub fn service_name(&self) -> &str {
        &self.name
    }

    /// Return the cached runtime, resolving through the registry on a miss.
    ///
    /// Two callers racing on a cold cache may both perform the lookup; the
    /// second write just replaces an equivalent client.
    pub async fn resolve(&self) -> HutchResult<Arc<dyn ContainerRuntime>> {
        if let Some(runtime) = self.cached.read().clone() {
            return Ok(runtime);
        }

        let runtime = self
            .registry
            .lookup(&self.name)
            .await?
            .ok_or_else(|| HutchError::ServiceUnavailable(self.name.clone()))?;
        tracing::debug!(service = %self.name, "resolved runtime service");
        *self.cached.write() = Some(runtime.clone());
        Ok(runtime)
    }

    /// Discard the cached runtime, forcing re-resolution on next use.
    pub fn invalidate(&self) {
        let had = self.cached.write().take().is_some();
        if had {
            tracing::debug!(service = %self.name, "discarded cached service handle");
        }
    }

    /// Whether a runtime is currently cached (test and diagnostics hook).
    pub fn is_cached(&self) -> bool {
        self.cached.read().is_some()
    }
}
