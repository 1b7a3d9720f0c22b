//! Wire protocol spoken with the runtime daemon.
//!
//! Newline-delimited JSON over a Unix stream socket, one request per
//! connection. `AddContainer` is the only request with a body: exactly
//! `size` raw bytes of rootfs image follow the request line on the same
//! stream.

use serde::{Deserialize, Serialize};

/// Request sent to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortalRequest {
    /// Is the container currently running?
    IsRunning { id: String },

    /// Start a container; `attach` keeps the daemon attached to the session.
    Start { id: String, attach: bool },

    /// Stop a running container.
    Stop { id: String },

    /// Register a new container. `size` bytes of rootfs image follow the
    /// request line.
    AddContainer { id: String, size: u64 },

    /// Delete a container and its state.
    DeleteContainer { id: String },

    /// List all known container ids.
    ListContainers,

    /// Fetch log text produced since the previous fetch.
    FetchLogs { id: String },
}

/// Response from the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortalResponse {
    /// Outcome of a lifecycle request. `ok: false` is an application-level
    /// refusal, not a failure.
    Done { ok: bool },

    /// Container ids, in the daemon's own order.
    Containers { ids: Vec<String> },

    /// Log text for a `FetchLogs` request; possibly blank.
    Logs { text: String },

    /// The daemon could not make sense of the request.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_format_is_stable() {
        let req = PortalRequest::IsRunning {
            id: "alpine-1".into(),
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"type":"is_running","id":"alpine-1"}"#
        );

        let req = PortalRequest::Start {
            id: "alpine-1".into(),
            attach: true,
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"type":"start","id":"alpine-1","attach":true}"#
        );

        let req = PortalRequest::ListContainers;
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"type":"list_containers"}"#
        );
    }

    #[test]
    fn response_round_trips() {
        let resp: PortalResponse =
            serde_json::from_str(r#"{"type":"done","ok":false}"#).unwrap();
        assert!(matches!(resp, PortalResponse::Done { ok: false }));

        let resp: PortalResponse =
            serde_json::from_str(r#"{"type":"containers","ids":["a","b"]}"#).unwrap();
        match resp {
            PortalResponse::Containers { ids } => assert_eq!(ids, vec!["a", "b"]),
            other => panic!("unexpected response: {:?}", other),
        }

        let resp: PortalResponse =
            serde_json::from_str(r#"{"type":"logs","text":"boot ok"}"#).unwrap();
        match resp {
            PortalResponse::Logs { text } => assert_eq!(text, "boot ok"),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn add_container_carries_size() {
        let req = PortalRequest::AddContainer {
            id: "deb-1".into(),
            size: 4096,
        };
        let json = serde_json::to_string(&req).unwrap();
        let back: PortalRequest = serde_json::from_str(&json).unwrap();
        match back {
            PortalRequest::AddContainer { id, size } => {
                assert_eq!(id, "deb-1");
                assert_eq!(size, 4096);
            }
            other => panic!("unexpected request: {:?}", other),
        }
    }
}
