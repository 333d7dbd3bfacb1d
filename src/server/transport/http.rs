//! HTTP transport on axum.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use super::{Transport, TransportKind};
use crate::server::config::ServerConfig;
use crate::server::pipeline::{Reply, ReplyBody};
use crate::server::router::ProjectRouter;

/// Renders replies as axum responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    type Output = Response;

    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    fn respond(self, reply: Reply) -> Response {
        let status =
            StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match reply.body {
            ReplyBody::Json(value) => (status, Json(value)).into_response(),
            ReplyBody::Text(text) => (status, text).into_response(),
        }
    }
}

/// The REST surface served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpServer {
    config: ServerConfig,
    router: ProjectRouter,
}

impl HttpServer {
    /// Serves `router` on the address in `config`.
    pub fn new(config: ServerConfig, router: ProjectRouter) -> Self {
        Self { config, router }
    }

    /// The configuration the server binds with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Builds the axum application.
    ///
    /// Routes:
    /// - `{base}/projects`
    /// - `{base}/projects/{*rest}`
    ///
    /// Any other path is answered by the router as well, so the 404 body is
    /// the same everywhere.
    pub fn app(&self) -> Router {
        let base = self.router.base_path().to_string();

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route(&format!("{base}/projects"), any(dispatch))
            .route(&format!("{base}/projects/{{*rest}}"), any(dispatch))
            .fallback(dispatch)
            .layer(cors)
            .with_state(Arc::new(self.router.clone()))
    }

    /// Binds the configured address and starts serving in the background.
    ///
    /// The server stops accepting connections once `shutdown` resolves and
    /// finishes the requests already in flight.
    ///
    /// Returns the bound socket address and a join handle for the spawned
    /// server task.
    pub async fn bind<F>(self, shutdown: F) -> std::io::Result<(SocketAddr, JoinHandle<()>)>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let app = self.app();

        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("Project server listening on http://{}{}", addr, self.config.base_path);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("HTTP server error: {}", e);
            }
            info!("Project server stopped");
        });

        Ok((addr, handle))
    }
}

async fn dispatch(
    State(router): State<Arc<ProjectRouter>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let reply = router
        .handle_bytes(&method, uri.path(), uri.query(), &body)
        .await;
    HttpTransport.respond(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_reply_keeps_status() {
        let response = HttpTransport.respond(Reply::text(404, "Item(s) not found"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bind_serves_on_a_free_port() {
        let store = crate::store::SqliteStore::open_in_memory().unwrap();
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        let server = HttpServer::new(config, ProjectRouter::new(Arc::new(store), "/data"));
        assert_eq!(server.config().port, 0);

        let (addr, handle) = server.bind(async {}).await.unwrap();
        assert_ne!(addr.port(), 0);
        handle.await.unwrap();
    }

    #[test]
    fn json_reply_is_ok() {
        let response = HttpTransport.respond(Reply::ok(json!({"pid": "1"})));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
    }
}
