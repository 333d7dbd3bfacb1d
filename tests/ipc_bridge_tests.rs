//! The IPC bridge serves the same pipeline as HTTP.

use std::sync::Arc;

use projboard::server::{IpcBridge, IpcRequest, ProjectRouter};
use projboard::store::SqliteStore;
use serde_json::json;

fn bridge() -> IpcBridge {
    let store = SqliteStore::open_in_memory().unwrap();
    store.seed_demo_data().unwrap();
    let (bridge, _task) = IpcBridge::spawn(ProjectRouter::new(Arc::new(store), "/data"));
    bridge
}

fn request(method: &str, url: &str) -> IpcRequest {
    IpcRequest {
        method: method.to_string(),
        url: url.to_string(),
        data: None,
    }
}

mod bridge_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_success_carries_data_and_ok() {
        let bridge = bridge();
        let response = bridge.send(request("get", "/data/projects/25/2")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(
            response.data,
            Some(json!({
                "tid": "2",
                "pid": "25",
                "descr": "Decide what tools to use",
                "completed": false
            }))
        );
    }

    #[tokio::test]
    async fn test_failure_carries_message_as_status_text() {
        let bridge = bridge();
        let response = bridge.send(request("DELETE", "/data/projects/1")).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.status_text, "Item(s) not found");
        assert_eq!(response.data, None);

        let response = bridge.send(request("BREW", "/data/projects")).await.unwrap();
        assert_eq!(response.status, 405);
    }

    #[tokio::test]
    async fn test_query_string_is_honoured() {
        let bridge = bridge();
        let response = bridge
            .send(request("GET", "/data/projects?fields=pid&search=name=omelette"))
            .await
            .unwrap();
        assert_eq!(response.data, Some(json!([{"pid": "34"}])));
    }

    #[tokio::test]
    async fn test_body_is_forwarded() {
        let bridge = bridge();
        let response = bridge
            .send(IpcRequest {
                method: "POST".to_string(),
                url: "/data/projects/34".to_string(),
                data: Some(json!({"descr": "Serve", "completed": 0})),
            })
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(response.data.unwrap()["tid"].is_string());
    }

    #[tokio::test]
    async fn test_concurrent_requests_all_answered() {
        let bridge = bridge();
        let mut handles = Vec::new();
        for _ in 0..20 {
            let bridge = bridge.clone();
            handles.push(tokio::spawn(async move {
                bridge.send(request("GET", "/data/projects")).await.unwrap().status
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 200);
        }
    }
}
