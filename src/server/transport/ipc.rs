//! In-process message bridge.
//!
//! A desktop shell talks to the router without a socket: it sends
//! [`IpcRequest`] messages carrying the same method, URL and JSON body an
//! HTTP client would, and receives an [`IpcResponse`] on a dedicated one-shot
//! channel. The bridge task serves requests concurrently.

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Transport, TransportKind};
use crate::server::pipeline::{Reply, ReplyBody};
use crate::server::router::ProjectRouter;

/// Pending messages the bridge accepts before senders wait.
pub const BRIDGE_CAPACITY: usize = 64;

/// A request sent across the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcRequest {
    /// HTTP method name, case-insensitive.
    pub method: String,
    /// Path including the base path, optionally followed by `?query`.
    pub url: String,
    /// JSON body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// The answer to an [`IpcRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpcResponse {
    /// HTTP-equivalent status.
    pub status: u16,
    /// `OK` for success, otherwise the plain-text failure message.
    pub status_text: String,
    /// Success payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl IpcResponse {
    /// True for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<Reply> for IpcResponse {
    fn from(reply: Reply) -> Self {
        match reply.body {
            ReplyBody::Json(value) => Self {
                status: reply.status,
                status_text: "OK".to_string(),
                data: Some(value),
            },
            ReplyBody::Text(text) => Self {
                status: reply.status,
                status_text: text,
                data: None,
            },
        }
    }
}

/// Failure to get an answer through the bridge at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The bridge task is gone.
    #[error("ipc bridge is closed")]
    Closed,
    /// The request was accepted but its reply never arrived.
    #[error("ipc bridge dropped the reply")]
    NoReply,
}

/// Answers one bridged request on its reply channel.
#[derive(Debug)]
pub struct IpcTransport {
    reply_to: oneshot::Sender<IpcResponse>,
}

impl IpcTransport {
    /// Wraps the reply channel of one request.
    pub fn new(reply_to: oneshot::Sender<IpcResponse>) -> Self {
        Self { reply_to }
    }
}

impl Transport for IpcTransport {
    /// `false` if the requester stopped waiting.
    type Output = bool;

    fn kind(&self) -> TransportKind {
        TransportKind::IpcBridge
    }

    fn respond(self, reply: Reply) -> bool {
        self.reply_to.send(IpcResponse::from(reply)).is_ok()
    }
}

struct Envelope {
    request: IpcRequest,
    reply_to: oneshot::Sender<IpcResponse>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Handle for sending requests to a running bridge. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IpcBridge {
    sender: mpsc::Sender<Envelope>,
}

impl IpcBridge {
    /// Starts the bridge task. It runs until every [`IpcBridge`] handle is
    /// dropped.
    pub fn spawn(router: ProjectRouter) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<Envelope>(BRIDGE_CAPACITY);
        let handle = tokio::spawn(async move {
            info!(base_path = router.base_path(), "ipc bridge started");
            while let Some(envelope) = receiver.recv().await {
                let router = router.clone();
                tokio::spawn(async move {
                    let Envelope { request, reply_to } = envelope;
                    let reply = handle_message(&router, request).await;
                    if !IpcTransport::new(reply_to).respond(reply) {
                        warn!("ipc requester went away before the reply");
                    }
                });
            }
            info!("ipc bridge stopped");
        });
        (Self { sender }, handle)
    }

    /// Sends `request` and waits for its answer.
    pub async fn send(&self, request: IpcRequest) -> Result<IpcResponse, BridgeError> {
        let (reply_to, reply) = oneshot::channel();
        self.sender
            .send(Envelope { request, reply_to })
            .await
            .map_err(|_| BridgeError::Closed)?;
        reply.await.map_err(|_| BridgeError::NoReply)
    }
}

async fn handle_message(router: &ProjectRouter, request: IpcRequest) -> Reply {
    debug!(method = %request.method, url = %request.url, "ipc request");
    let method = match Method::from_bytes(request.method.to_ascii_uppercase().as_bytes()) {
        Ok(method) => method,
        Err(_) => {
            return Reply::text(
                400,
                format!("Bad request: unknown method {:?}", request.method),
            )
        },
    };
    router.handle_target(&method, &request.url, request.data).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reply_maps_to_status_text() {
        let ok = IpcResponse::from(Reply::ok(json!({"pid": "3"})));
        assert_eq!(ok.status_text, "OK");
        assert_eq!(ok.data, Some(json!({"pid": "3"})));

        let missing = IpcResponse::from(Reply::text(404, "Item(s) not found"));
        assert_eq!(missing.status_text, "Item(s) not found");
        assert!(missing.data.is_none());
        assert!(!missing.is_success());
    }

    #[test]
    fn response_uses_camel_case() {
        let wire = serde_json::to_value(IpcResponse::from(Reply::text(400, "Bad request: x"))).unwrap();
        assert_eq!(wire, json!({"status": 400, "statusText": "Bad request: x"}));
    }

    #[tokio::test]
    async fn dropped_requester_is_reported() {
        let (tx, rx) = oneshot::channel();
        drop(rx);
        assert!(!IpcTransport::new(tx).respond(Reply::ok(json!(null))));
    }
}
