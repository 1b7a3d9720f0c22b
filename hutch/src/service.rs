//! The typed seam to the remote container runtime.
//!
//! Everything above this trait (session manager, collectors, watchdog) is
//! transport-agnostic; the production implementation lives in
//! [`crate::portal`] and tests substitute in-memory fakes.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::errors::HutchResult;

/// Opaque, stable identifier for a managed container.
pub type ContainerId = String;

/// An open, read-only byte stream over a container rootfs image.
///
/// The total length is captured up front so the wire layer can frame the
/// transfer. The underlying stream is released when the source is dropped,
/// on every exit path.
pub struct ImageSource {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    len: u64,
}

impl ImageSource {
    pub fn new(reader: Box<dyn AsyncRead + Send + Unpin>, len: u64) -> Self {
        Self { reader, len }
    }

    /// Open a local file read-only as an image source.
    pub async fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        Ok(Self::new(Box::new(file), len))
    }

    /// Total number of bytes the stream will yield.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consume the source, handing out the raw stream and its length.
    pub fn into_parts(self) -> (Box<dyn AsyncRead + Send + Unpin>, u64) {
        (self.reader, self.len)
    }
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSource").field("len", &self.len).finish()
    }
}

/// Client view of the remote container-runtime service.
///
/// All operations are single synchronous request/response calls on the
/// caller's task. A `false` return means the daemon answered and declined
/// (already running, unknown id, ...); transport failures are errors.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Whether the container is currently running.
    async fn is_running(&self, id: &str) -> HutchResult<bool>;

    /// Start a container. `attach` keeps the daemon attached to the
    /// container session so it survives the caller.
    async fn start(&self, id: &str, attach: bool) -> HutchResult<bool>;

    /// Stop a running container.
    async fn stop(&self, id: &str) -> HutchResult<bool>;

    /// Register a new container from a rootfs image stream.
    async fn add_container(&self, id: &str, image: ImageSource) -> HutchResult<bool>;

    /// Delete a container and its on-daemon state.
    async fn delete_container(&self, id: &str) -> HutchResult<bool>;

    /// All known container ids, in the daemon's own order.
    async fn list_containers(&self) -> HutchResult<Vec<ContainerId>>;

    /// Log text produced since the previous fetch for this container.
    ///
    /// Delta contract: the daemon keeps the read cursor, so consecutive
    /// fetches never return overlapping text. Blank output means nothing
    /// new happened.
    async fn fetch_logs(&self, id: &str) -> HutchResult<String>;
}
