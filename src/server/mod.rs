//! Server side: the validated request pipeline behind the REST surface.
//!
//! # Architecture
//!
//! 1. **[`validators`]** -- pure checks over `{keys, data, options}`.
//! 2. **[`transactions`]** -- one [`Operation`] per use case, executed
//!    against an injected [`ProjectStore`](crate::store::ProjectStore).
//! 3. **[`pipeline`]** -- [`handle_request`] composes the two and maps the
//!    outcome to a [`Reply`].
//! 4. **[`router`]** -- [`ProjectRouter`] resolves method and path to a
//!    pipeline.
//! 5. **[`transport`]** -- HTTP (axum) and the in-process IPC bridge deliver
//!    the same replies.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use http::Method;
//! use projboard::server::ProjectRouter;
//! use projboard::store::SqliteStore;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(SqliteStore::open_in_memory().unwrap());
//! let router = ProjectRouter::new(store, "/data");
//!
//! let reply = router
//!     .handle(&Method::POST, "/data/projects", None, Some(json!({"name": "Garden"})))
//!     .await;
//! assert_eq!(reply.status, 200);
//!
//! let reply = router.handle(&Method::GET, "/data/projects/abc", None, None).await;
//! assert_eq!(reply.status, 400);
//! # }
//! ```

pub mod config;
pub mod pipeline;
pub mod request;
pub mod router;
pub mod transactions;
pub mod transport;
pub mod validators;

pub use config::{ConfigError, DatabaseConfig, ServerConfig};
pub use pipeline::{handle_request, Pipeline, Reply, ReplyBody};
pub use request::{Data, Keys, PathParams, RawRequest, Refined};
pub use router::ProjectRouter;
pub use transactions::Operation;
#[cfg(feature = "http-server")]
pub use transport::{HttpServer, HttpTransport};
pub use transport::{IpcBridge, IpcRequest, IpcResponse, Transport, TransportKind};
pub use validators::Validator;
