//! How the client reaches the server.
//!
//! The async action creator only needs `request(method, path, body)`. Which
//! mechanism carries it is injected: [`HttpTransport`] over the network,
//! or [`IpcTransport`] through an in-process
//! [`IpcBridge`](crate::server::IpcBridge). Both report failures as a
//! [`RequestError`], so reducers never learn which one was used.

#[cfg(feature = "http-client")]
pub mod http;
pub mod ipc;

use async_trait::async_trait;
use ::http::Method;
use serde_json::Value;

#[cfg(feature = "http-client")]
pub use self::http::HttpTransport;
pub use self::ipc::IpcTransport;

/// A request that did not produce a success payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The server answered with a non-success status.
    #[error("{status} {message} ({url})")]
    Status {
        /// HTTP status.
        status: u16,
        /// Plain-text body of the reply.
        message: String,
        /// Request URL.
        url: String,
    },
    /// The server could not be reached.
    #[error("unreachable: {message} ({url})")]
    Unreachable {
        /// Transport error text.
        message: String,
        /// Request URL.
        url: String,
    },
    /// The IPC bridge failed to deliver the request or its reply.
    #[error("bridge: {message} ({url})")]
    Bridge {
        /// Bridge error text.
        message: String,
        /// Request URL.
        url: String,
    },
    /// The reply could not be decoded as JSON.
    #[error("decode: {message} ({url})")]
    Decode {
        /// Decoder error text.
        message: String,
        /// Request URL.
        url: String,
    },
}

impl RequestError {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unreachable { .. } | Self::Bridge { .. } | Self::Decode { .. } => None,
        }
    }

    /// Human-readable message, without the URL.
    pub fn message(&self) -> &str {
        match self {
            Self::Status { message, .. }
            | Self::Unreachable { message, .. }
            | Self::Bridge { message, .. }
            | Self::Decode { message, .. } => message,
        }
    }

    /// The URL the request went to.
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. }
            | Self::Unreachable { url, .. }
            | Self::Bridge { url, .. }
            | Self::Decode { url, .. } => url,
        }
    }
}

/// The injected network capability.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends one request. `path` is relative to the transport's base, for
    /// example `/projects/25`.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RequestError>;
}
