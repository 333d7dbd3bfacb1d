//! HTTP transport on reqwest.

use async_trait::async_trait;
use ::http::Method;
use serde_json::Value;
use tracing::debug;

use super::{RequestError, Transport};

/// Talks to the REST surface over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` is everything before `/projects`, for example
    /// `http://127.0.0.1:8080/data`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Uses an existing client (timeouts, pooling).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// The prefix prepended to every path.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RequestError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "http request");

        let mut builder = self.client.request(method, &url);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RequestError::Unreachable {
                message: e.to_string(),
                url: url.clone(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            };
            return Err(RequestError::Status {
                status: status.as_u16(),
                message,
                url,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| RequestError::Decode {
                message: e.to_string(),
                url,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        assert_eq!(
            HttpTransport::new("http://localhost:8080/data/").base_url(),
            "http://localhost:8080/data"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_reported() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let transport = HttpTransport::new("http://127.0.0.1:9/data");
        let err = transport
            .request(Method::GET, "/projects", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Unreachable { .. }));
        assert_eq!(err.status(), None);
        assert_eq!(err.url(), "http://127.0.0.1:9/data/projects");
    }
}
