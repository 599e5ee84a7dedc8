//! Screenshot rendering collaborator.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use vitae_core::{ErrorKind, Result};

use super::TRACING_TARGET;

/// Renders a stored resume to an image.
///
/// The real implementation talks to an external browser-rendering service;
/// tests substitute an in-memory stub.
#[async_trait]
pub trait ScreenshotRenderer: Send + Sync {
    /// Renders `resume_id` and returns the PNG bytes.
    async fn render(&self, resume_id: &str) -> Result<Bytes>;

    /// True when the renderer answers its health probe.
    async fn health(&self) -> bool;
}

/// Renderer backed by an HTTP rendering service.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpRenderer {
    /// Creates a renderer client for the given base endpoint.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("vitae-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| {
                ErrorKind::ConfigurationError
                    .with_message("failed to build renderer HTTP client")
                    .with_source(error)
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ScreenshotRenderer for HttpRenderer {
    async fn render(&self, resume_id: &str) -> Result<Bytes> {
        let url = format!("{}/render", self.endpoint);

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "resume_id": resume_id }))
            .send()
            .await
            .map_err(|error| {
                let kind = if error.is_timeout() {
                    ErrorKind::Timeout
                } else {
                    ErrorKind::UpstreamFailure
                };
                kind.with_message(format!("renderer call for {resume_id} failed"))
                    .with_source(error)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ErrorKind::UpstreamFailure
                .with_message(format!("renderer returned {status} for {resume_id}")));
        }

        let bytes = response.bytes().await.map_err(|error| {
            ErrorKind::UpstreamFailure
                .with_message(format!("reading rendered image for {resume_id} failed"))
                .with_source(error)
        })?;

        if bytes.is_empty() {
            return Err(ErrorKind::UpstreamFailure
                .with_message(format!("renderer produced an empty image for {resume_id}")));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            resume_id,
            bytes = bytes.len(),
            "screenshot rendered"
        );

        Ok(bytes)
    }

    async fn health(&self) -> bool {
        let url = format!("{}/health", self.endpoint);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "renderer health check failed"
                );
                false
            }
        }
    }
}
