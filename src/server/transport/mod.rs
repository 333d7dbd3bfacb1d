//! Delivery of pipeline replies.
//!
//! The pipeline produces a [`Reply`] without knowing how it travels. A
//! [`Transport`] turns that reply into whatever its channel needs: an axum
//! response for HTTP, or a message on a one-shot channel for the in-process
//! IPC bridge.

#[cfg(feature = "http-server")]
pub mod http;
pub mod ipc;

use super::pipeline::Reply;

#[cfg(feature = "http-server")]
pub use http::{HttpServer, HttpTransport};
pub use ipc::{BridgeError, IpcBridge, IpcRequest, IpcResponse, IpcTransport};

/// The two ways a request can reach the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// REST over HTTP.
    Http,
    /// Message passing through [`IpcBridge`].
    IpcBridge,
}

/// Sends one reply back to the caller.
pub trait Transport {
    /// What responding produces.
    type Output;

    /// Which kind of transport this is.
    fn kind(&self) -> TransportKind;

    /// Delivers `reply`.
    fn respond(self, reply: Reply) -> Self::Output;
}
