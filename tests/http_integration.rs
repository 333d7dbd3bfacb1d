//! End-to-end over a real socket: axum server, reqwest client, client store.

use std::sync::Arc;

use projboard::client::{ClientStore, HttpTransport, ProjectsApi, RequestError, Transport};
use projboard::server::{HttpServer, ProjectRouter, ServerConfig};
use projboard::store::SqliteStore;
use serde_json::json;
use tokio::sync::oneshot;

struct Running {
    base_url: String,
    stop: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl Running {
    async fn start() -> Self {
        let store = SqliteStore::open_in_memory().unwrap();
        store.seed_demo_data().unwrap();
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        let router = ProjectRouter::new(Arc::new(store), config.base_path.clone());
        let (stop, stopped) = oneshot::channel::<()>();
        let (addr, handle) = HttpServer::new(config.clone(), router).bind(async move {
            let _ = stopped.await;
        })
        .await
        .unwrap();
        Self {
            base_url: format!("http://{addr}{}", config.base_path),
            stop: Some(stop),
            handle,
        }
    }

    async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.await.unwrap();
    }
}

mod http_tests {
    use super::*;
    use http::Method;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_client_store_over_http() {
        let server = Running::start().await;
        let api = ProjectsApi::new(HttpTransport::new(server.base_url.clone()));
        let client = ClientStore::new();

        client.dispatch_async(api.all_projects()).await;
        client.dispatch_async(api.project_by_id("25")).await;
        let state = client.state();
        assert_eq!(state.projects["25"].pending, 1);
        assert_eq!(state.tasks["2"].descr, "Decide what tools to use");

        let done = client.complete_task(&api, "25", "2", true).await.unwrap();
        assert!(!done.is_error());
        assert_eq!(client.state().projects["25"].pending, 0);

        let fetched = api
            .transport()
            .request(Method::GET, "/projects/25/2", None)
            .await
            .unwrap();
        assert_eq!(fetched["completed"], json!(true));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_status_and_message_reach_the_client() {
        let server = Running::start().await;
        let transport = HttpTransport::new(server.base_url.clone());

        let err = transport
            .request(Method::PUT, "/projects/99", Some(json!({"name": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Status { status: 404, .. }));
        assert_eq!(err.message(), "Item(s) not found");

        let err = transport
            .request(Method::GET, "/projects?search=name%3Dx%27%20OR%201%3D1", None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));

        let err = transport
            .request(Method::PATCH, "/projects", None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(405));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_rejected() {
        let server = Running::start().await;
        let response = reqwest::Client::new()
            .post(format!("{}/projects", server.base_url))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);

        let response = reqwest::Client::new()
            .get(format!("{}/projects", server.base_url))
            .header("origin", "http://example.com")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert!(response.headers().contains_key("access-control-allow-origin"));

        server.shutdown().await;
    }
}
