//! The default `Scraper` implementation.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vitae_core::{ErrorKind, Result};
use vitae_pool::{Extraction, JobOptions, JobPayload, Scraper};

use crate::TRACING_TARGET;
use crate::clean::html_to_text;
use crate::client::FetchClient;
use crate::parse::{posting_from_html, posting_from_text};

/// Engine name reported for fetched pages.
const ENGINE_HTTP: &str = "http";

/// Engine name reported for pasted descriptions.
const ENGINE_RAW: &str = "raw";

/// Fetch-and-parse extraction engine.
#[derive(Debug, Clone)]
pub struct HttpScraper {
    client: FetchClient,
}

impl HttpScraper {
    /// Creates the engine with the given single-exchange timeout.
    pub fn new(request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: FetchClient::new(request_timeout)?,
        })
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn extract(
        &self,
        payload: &JobPayload,
        _options: &JobOptions,
        cancel: &CancellationToken,
    ) -> Result<Extraction> {
        match payload {
            JobPayload::Url(url) => {
                let html = self.client.fetch(url, cancel).await?;
                let text = html_to_text(&html);
                if text.is_empty() {
                    return Err(ErrorKind::UpstreamFailure
                        .with_message(format!("{url} produced no readable text")));
                }

                let posting = posting_from_html(&html, text, url);
                tracing::debug!(
                    target: TRACING_TARGET,
                    url,
                    title = posting.title.as_deref().unwrap_or(""),
                    requirements = posting.requirements.len(),
                    "extracted posting from page"
                );

                Ok(Extraction {
                    posting,
                    engine: ENGINE_HTTP.to_string(),
                })
            }
            JobPayload::Description(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(ErrorKind::ValidationFailed
                        .with_message("description payload is empty"));
                }

                Ok(Extraction {
                    posting: posting_from_text(trimmed.to_string()),
                    engine: ENGINE_RAW.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn description_payloads_bypass_the_network() -> anyhow::Result<()> {
        let scraper = HttpScraper::new(Duration::from_secs(5))?;
        let cancel = CancellationToken::new();

        let extraction = scraper
            .extract(
                &JobPayload::Description(
                    "Platform Engineer\n- Rust\n- Distributed systems".into(),
                ),
                &JobOptions::default(),
                &cancel,
            )
            .await?;

        assert_eq!(extraction.engine, "raw");
        assert_eq!(extraction.posting.title.as_deref(), Some("Platform Engineer"));
        assert_eq!(extraction.posting.requirements.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn empty_descriptions_are_rejected() -> anyhow::Result<()> {
        let scraper = HttpScraper::new(Duration::from_secs(5))?;
        let cancel = CancellationToken::new();

        let error = scraper
            .extract(
                &JobPayload::Description("   ".into()),
                &JobOptions::default(),
                &cancel,
            )
            .await
            .expect_err("empty description");
        assert_eq!(error.kind, ErrorKind::ValidationFailed);
        Ok(())
    }
}
