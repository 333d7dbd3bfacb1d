//! # projboard
//!
//! A small projects-and-tasks service in two halves that keep each other
//! consistent:
//!
//! - the **server**: a validated request pipeline over an embedded SQLite
//!   store, reachable over HTTP or an in-process IPC bridge;
//! - the **client**: a normalised state container that tracks every request
//!   it sends (pending counter, merged replies, accumulated failures).
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use projboard::client::{ClientStore, HttpTransport, ProjectsApi};
//! use projboard::server::{HttpServer, ProjectRouter, ServerConfig};
//! use projboard::store::SqliteStore;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default();
//! let store = Arc::new(SqliteStore::open_in_memory()?);
//! let router = ProjectRouter::new(store, config.base_path.clone());
//! let (addr, _server) = HttpServer::new(config, router).bind(std::future::pending()).await?;
//!
//! let client = ClientStore::new();
//! let api = ProjectsApi::new(HttpTransport::new(format!("http://{addr}/data")));
//! client.dispatch_async(api.add_project(Some("Garden"), None)).await;
//! assert_eq!(client.state().projects.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! - `http-server`: axum REST transport ([`server::HttpServer`])
//! - `http-client`: reqwest client transport ([`client::HttpTransport`])
//! - `logging`: [`shared::init_logging`] on `tracing-subscriber`

pub mod client;
pub mod error;
pub mod server;
pub mod shared;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use store::{ProjectStore, SqliteStore, StoreError};
pub use types::{Pid, Tid};
