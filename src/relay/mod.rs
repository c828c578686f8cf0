//! File content relay
//!
//! Asks the extraction backend for the text content of an uploaded file.
//! Only the file name is sent; the backend resolves the file itself.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Relay returned status {0}")]
    StatusError(u16),

    #[error("Malformed relay response: {0}")]
    BodyError(String),

    #[error("Relay reported an error: {0}")]
    RemoteError(String),

    #[error("Relay response has no content")]
    MissingContent,
}

pub type RelayResult<T> = Result<T, RelayError>;

/// Trait for the file content extraction backend
#[async_trait]
pub trait ContentRelay: Send + Sync {
    /// Fetch the extracted text for a file name
    async fn fetch_content(&self, file_name: &str) -> RelayResult<String>;
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    file_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Relay client for the REST extraction endpoint
#[derive(Debug, Clone)]
pub struct HttpContentRelay {
    client: Client,
    url: String,
}

impl HttpContentRelay {
    pub fn new(url: impl Into<String>, timeout: Duration) -> RelayResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &Config) -> RelayResult<Self> {
        Self::new(config.relay_url.clone(), config.request_timeout())
    }
}

#[async_trait]
impl ContentRelay for HttpContentRelay {
    async fn fetch_content(&self, file_name: &str) -> RelayResult<String> {
        debug!("Requesting content for {} from {}", file_name, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&ExtractRequest { file_name })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::StatusError(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: ExtractResponse =
            serde_json::from_str(&body).map_err(|e| RelayError::BodyError(e.to_string()))?;

        match (parsed.content, parsed.error) {
            (Some(content), _) => Ok(content),
            (None, Some(error)) => Err(RelayError::RemoteError(error)),
            (None, None) => Err(RelayError::MissingContent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn relay_with(router: Router) -> HttpContentRelay {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        HttpContentRelay::new(format!("http://{}/extract", addr), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_content_sends_file_name() {
        let router = Router::new().route(
            "/extract",
            post(|Json(body): Json<Value>| async move {
                let name = body["file_name"].as_str().unwrap_or_default().to_string();
                Json(json!({ "content": format!("內容 of {}", name) }))
            }),
        );
        let relay = relay_with(router).await;

        let content = relay.fetch_content("line3.csv").await.unwrap();
        assert_eq!(content, "內容 of line3.csv");
    }

    #[tokio::test]
    async fn test_server_error_status_fails() {
        let router = Router::new().route(
            "/extract",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "content": "should not be used" })),
                )
            }),
        );
        let relay = relay_with(router).await;

        let err = relay.fetch_content("a.pdf").await.unwrap_err();
        assert!(matches!(err, RelayError::StatusError(500)));
    }

    #[tokio::test]
    async fn test_error_field_and_missing_content() {
        let router = Router::new()
            .route("/extract", post(|| async { Json(json!({ "error": "not found" })) }));
        let relay = relay_with(router).await;
        assert!(matches!(
            relay.fetch_content("x").await,
            Err(RelayError::RemoteError(msg)) if msg == "not found"
        ));

        let router = Router::new().route("/extract", post(|| async { Json(json!({})) }));
        let relay = relay_with(router).await;
        assert!(matches!(
            relay.fetch_content("x").await,
            Err(RelayError::MissingContent)
        ));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let router = Router::new().route("/extract", post(|| async { "<html>oops</html>" }));
        let relay = relay_with(router).await;
        assert!(matches!(
            relay.fetch_content("x").await,
            Err(RelayError::BodyError(_))
        ));
    }
}
