//! Client side of the in-process IPC bridge.

use async_trait::async_trait;
use http::Method;
use serde_json::Value;

use super::{RequestError, Transport};
use crate::server::transport::{IpcBridge, IpcRequest};

/// Sends requests through an [`IpcBridge`].
#[derive(Debug, Clone)]
pub struct IpcTransport {
    bridge: IpcBridge,
    base_path: String,
}

impl IpcTransport {
    /// `base_path` is the router's prefix, for example `/data`.
    pub fn new(bridge: IpcBridge, base_path: impl Into<String>) -> Self {
        Self {
            bridge,
            base_path: base_path.into(),
        }
    }
}

#[async_trait]
impl Transport for IpcTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RequestError> {
        let url = format!("{}{}", self.base_path, path);
        let response = self
            .bridge
            .send(IpcRequest {
                method: method.to_string(),
                url: url.clone(),
                data: body,
            })
            .await
            .map_err(|e| RequestError::Bridge {
                message: e.to_string(),
                url: url.clone(),
            })?;

        if !response.is_success() {
            return Err(RequestError::Status {
                status: response.status,
                message: response.status_text,
                url,
            });
        }
        Ok(response.data.unwrap_or(Value::Null))
    }
}
