//! Fetch layer for posting pages.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vitae_core::{ErrorKind, Result};

use crate::TRACING_TARGET;

/// Maximum body size accepted from a posting page.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Thin wrapper around a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
}

impl FetchClient {
    /// Builds a client with sane connect/read bounds.
    ///
    /// Per-job deadlines are enforced by the worker; the timeout here only
    /// bounds a single network exchange.
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("vitae-scrape/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|error| {
                ErrorKind::ConfigurationError
                    .with_message("failed to build HTTP client")
                    .with_source(error)
            })?;

        Ok(Self { http })
    }

    /// Fetches a page body, racing the request against `cancel`.
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<String> {
        let request = self.http.get(url).send();

        let response = tokio::select! {
            response = request => response,
            () = cancel.cancelled() => {
                return Err(ErrorKind::Timeout
                    .with_message(format!("fetch of {url} cancelled")));
            }
        };

        let response = response.map_err(|error| {
            let kind = if error.is_timeout() {
                ErrorKind::Timeout
            } else {
                ErrorKind::UpstreamFailure
            };
            kind.with_message(format!("fetch of {url} failed"))
                .with_source(error)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ErrorKind::UpstreamFailure
                .with_message(format!("fetch of {url} returned {status}")));
        }

        let body = tokio::select! {
            body = response.text() => body.map_err(|error| {
                ErrorKind::UpstreamFailure
                    .with_message(format!("reading body of {url} failed"))
                    .with_source(error)
            })?,
            () = cancel.cancelled() => {
                return Err(ErrorKind::Timeout
                    .with_message(format!("fetch of {url} cancelled mid-body")));
            }
        };

        if body.len() > MAX_BODY_BYTES {
            tracing::debug!(
                target: TRACING_TARGET,
                url,
                bytes = body.len(),
                "truncating oversized body"
            );
            let mut end = MAX_BODY_BYTES;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            return Ok(body[..end].to_string());
        }

        Ok(body)
    }
}
