//! Socket-backed implementation of [`ContainerRuntime`].

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::errors::{HutchError, HutchResult};
use crate::service::{ContainerId, ContainerRuntime, ImageSource};

use super::protocol::{PortalRequest, PortalResponse};

/// Typed client for one runtime daemon socket.
///
/// Opens a fresh connection per request; the daemon treats each connection
/// as one request/response exchange. The client itself holds no connection
/// state, so a single instance can serve the lifecycle client and every
/// log collector concurrently.
pub struct PortalClient {
    socket_path: PathBuf,
}

impl PortalClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &std::path::Path {
        &self.socket_path
    }

    async fn connect(&self) -> HutchResult<UnixStream> {
        UnixStream::connect(&self.socket_path).await.map_err(|e| {
            HutchError::Communication(format!(
                "connect to {} failed: {}",
                self.socket_path.display(),
                e
            ))
        })
    }

    async fn write_request(stream: &mut UnixStream, req: &PortalRequest) -> HutchResult<()> {
        let mut line = serde_json::to_string(req)
            .map_err(|e| HutchError::Internal(format!("serializing request: {}", e)))?;
        line.push('\n');
        stream
            .write_all(line.as_bytes())
            .await
            .map_err(|e| HutchError::Communication(format!("writing request: {}", e)))
    }

    async fn read_response(stream: UnixStream) -> HutchResult<PortalResponse> {
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(|e| HutchError::Communication(format!("reading response: {}", e)))?;
        if n == 0 {
            return Err(HutchError::Communication(
                "daemon closed the connection without responding".into(),
            ));
        }

        let resp: PortalResponse = serde_json::from_str(line.trim_end())
            .map_err(|e| HutchError::Protocol(format!("malformed response: {}", e)))?;

        // A daemon-side Error is a semantic failure on a working transport;
        // it must not force handle re-resolution.
        if let PortalResponse::Error { message } = resp {
            return Err(HutchError::Protocol(message));
        }
        Ok(resp)
    }

    async fn roundtrip(&self, req: PortalRequest) -> HutchResult<PortalResponse> {
        let mut stream = self.connect().await?;
        Self::write_request(&mut stream, &req).await?;
        Self::read_response(stream).await
    }

    fn expect_done(resp: PortalResponse) -> HutchResult<bool> {
        match resp {
            PortalResponse::Done { ok } => Ok(ok),
            other => Err(HutchError::Protocol(format!(
                "expected done, got {:?}",
                other
            ))),
        }
    }
}

#[async_trait]
impl ContainerRuntime for PortalClient {
    async fn is_running(&self, id: &str) -> HutchResult<bool> {
        let resp = self
            .roundtrip(PortalRequest::IsRunning { id: id.to_string() })
            .await?;
        Self::expect_done(resp)
    }

    async fn start(&self, id: &str, attach: bool) -> HutchResult<bool> {
        let resp = self
            .roundtrip(PortalRequest::Start {
                id: id.to_string(),
                attach,
            })
            .await?;
        Self::expect_done(resp)
    }

    async fn stop(&self, id: &str) -> HutchResult<bool> {
        let resp = self
            .roundtrip(PortalRequest::Stop { id: id.to_string() })
            .await?;
        Self::expect_done(resp)
    }

    async fn add_container(&self, id: &str, image: ImageSource) -> HutchResult<bool> {
        let (mut reader, size) = image.into_parts();

        let mut stream = self.connect().await?;
        Self::write_request(
            &mut stream,
            &PortalRequest::AddContainer {
                id: id.to_string(),
                size,
            },
        )
        .await?;

        let copied = tokio::io::copy(&mut reader, &mut stream)
            .await
            .map_err(|e| HutchError::Communication(format!("streaming image: {}", e)))?;
        if copied != size {
            // The framed transfer is now out of sync; the connection is dead
            // either way.
            return Err(HutchError::Communication(format!(
                "image stream truncated: sent {} of {} bytes",
                copied, size
            )));
        }
        stream
            .flush()
            .await
            .map_err(|e| HutchError::Communication(format!("flushing image: {}", e)))?;

        Self::expect_done(Self::read_response(stream).await?)
    }

    async fn delete_container(&self, id: &str) -> HutchResult<bool> {
        let resp = self
            .roundtrip(PortalRequest::DeleteContainer { id: id.to_string() })
            .await?;
        Self::expect_done(resp)
    }

    async fn list_containers(&self) -> HutchResult<Vec<ContainerId>> {
        match self.roundtrip(PortalRequest::ListContainers).await? {
            PortalResponse::Containers { ids } => Ok(ids),
            other => Err(HutchError::Protocol(format!(
                "expected containers, got {:?}",
                other
            ))),
        }
    }

    async fn fetch_logs(&self, id: &str) -> HutchResult<String> {
        match self
            .roundtrip(PortalRequest::FetchLogs { id: id.to_string() })
            .await?
        {
            PortalResponse::Logs { text } => Ok(text),
            other => Err(HutchError::Protocol(format!(
                "expected logs, got {:?}",
                other
            ))),
        }
    }
}
