//! `ScraperService` implementation.

use jiff::Timestamp;
use tonic::{Request, Response, Status};
use vitae_core::health::ServiceStatus;
use vitae_core::task::TaskRequest;
use vitae_core::{ErrorKind, TaskKind};
use vitae_pool::{JobOptions, JobPayload};
use vitae_proto::v1::scraper_service_server::ScraperService;
use vitae_proto::v1::{
    AsyncTaskResponse, HealthCheckRequest, HealthCheckResponse, ScrapeJobRequest,
};

use super::{TRACING_TARGET, accepted, failure, with_panic_barrier};
use crate::service::ServiceState;

/// gRPC front of the scrape pipeline.
pub struct ScraperRpc {
    state: ServiceState,
}

impl ScraperRpc {
    pub fn new(state: ServiceState) -> Self {
        Self { state }
    }

    async fn scrape_job_inner(&self, request: ScrapeJobRequest) -> AsyncTaskResponse {
        let url = Some(request.url.trim()).filter(|url| !url.is_empty());
        let description = Some(request.description.trim()).filter(|text| !text.is_empty());

        let payload = match (url, description) {
            (Some(url), None) => {
                if url::Url::parse(url).is_err() {
                    return failure(
                        ErrorKind::ValidationFailed,
                        format!("'{url}' is not a valid URL"),
                    );
                }
                JobPayload::Url(url.to_string())
            }
            (None, Some(description)) => JobPayload::Description(description.to_string()),
            (Some(_), Some(_)) => {
                return failure(
                    ErrorKind::ValidationFailed,
                    "url and description are mutually exclusive",
                );
            }
            (None, None) => {
                return failure(
                    ErrorKind::ValidationFailed,
                    "either url or description is required",
                );
            }
        };

        if !self.state.pool().is_healthy() {
            return failure(ErrorKind::ServiceUnavailable, "worker pool is unavailable");
        }

        let options = request
            .options
            .map(|options| JobOptions {
                timeout_secs: (options.timeout_secs > 0).then_some(options.timeout_secs),
                engine: (!options.engine.is_empty()).then_some(options.engine),
            })
            .unwrap_or_default();

        let task_request = TaskRequest::Scrape {
            url: matches!(payload, JobPayload::Url(_))
                .then(|| request.url.trim().to_string()),
            description: matches!(payload, JobPayload::Description(_))
                .then(|| request.description.trim().to_string()),
        };

        let executor_state = self.state.clone();
        let process_id =
            self.state
                .tasks()
                .submit(TaskKind::Scrape, task_request, async move {
                    executor_state.execute_scrape(payload, options).await
                });

        tracing::debug!(
            target: TRACING_TARGET,
            process_id = %process_id,
            "scrape rpc submission accepted"
        );

        accepted(&process_id, "scrape job accepted for processing")
    }
}

#[tonic::async_trait]
impl ScraperService for ScraperRpc {
    async fn scrape_job(
        &self,
        request: Request<ScrapeJobRequest>,
    ) -> Result<Response<AsyncTaskResponse>, Status> {
        let request = request.into_inner();
        let response = with_panic_barrier(self.scrape_job_inner(request)).await;
        Ok(Response::new(response))
    }

    async fn health_check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        let status = self.state.health().await;

        let status_text = match status {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Unhealthy => "unhealthy",
        };

        Ok(Response::new(HealthCheckResponse {
            status: status_text.to_string(),
            uptime_seconds: self.state.uptime().as_secs(),
            workers_healthy: self.state.pool().is_healthy(),
            timestamp: Timestamp::now().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;
    use vitae_core::Result;
    use vitae_core::model::JobPosting;
    use vitae_pool::{Extraction, PoolConfig, Scraper};
    use vitae_proto::v1::ScrapeOptions;

    use super::*;
    use crate::service::ServiceConfig;

    struct StubScraper;

    #[async_trait]
    impl Scraper for StubScraper {
        async fn extract(
            &self,
            _payload: &JobPayload,
            _options: &JobOptions,
            _cancel: &CancellationToken,
        ) -> Result<Extraction> {
            Ok(Extraction {
                posting: JobPosting::default(),
                engine: "stub".into(),
            })
        }
    }

    fn rpc() -> (ScraperRpc, ServiceState) {
        let state = ServiceState::builder(ServiceConfig {
            pool: PoolConfig {
                workers: 1,
                default_timeout: Duration::from_secs(5),
                ..Default::default()
            },
            ..Default::default()
        })
        .with_scraper(Arc::new(StubScraper))
        .build()
        .expect("service state");

        (ScraperRpc::new(state.clone()), state)
    }

    #[tokio::test]
    async fn valid_urls_are_accepted_with_a_scrape_process_id() {
        let (rpc, state) = rpc();

        let response = rpc
            .scrape_job_inner(ScrapeJobRequest {
                url: "https://example.com/job/1".into(),
                description: String::new(),
                options: Some(ScrapeOptions {
                    timeout_secs: 10,
                    engine: String::new(),
                }),
            })
            .await;

        assert_eq!(response.status, "ACCEPTED");
        assert!(response.process_id.starts_with("scrape_"));
        assert!(response.error.is_empty());

        state.shutdown().await;
    }

    #[tokio::test]
    async fn missing_targets_fail_in_band() {
        let (rpc, state) = rpc();

        let response = rpc
            .scrape_job_inner(ScrapeJobRequest {
                url: String::new(),
                description: String::new(),
                options: None,
            })
            .await;

        assert_eq!(response.status, "FAILURE");
        assert_eq!(response.error, "validation_failed");
        assert!(response.process_id.is_empty());
        assert_eq!(state.tasks().len(), 0);

        state.shutdown().await;
    }

    #[tokio::test]
    async fn both_targets_fail_in_band() {
        let (rpc, state) = rpc();

        let response = rpc
            .scrape_job_inner(ScrapeJobRequest {
                url: "https://example.com/job/1".into(),
                description: "also text".into(),
                options: None,
            })
            .await;

        assert_eq!(response.status, "FAILURE");
        assert_eq!(response.error, "validation_failed");

        state.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_urls_fail_in_band() {
        let (rpc, state) = rpc();

        let response = rpc
            .scrape_job_inner(ScrapeJobRequest {
                url: "not a url".into(),
                description: String::new(),
                options: None,
            })
            .await;

        assert_eq!(response.status, "FAILURE");
        assert_eq!(response.error, "validation_failed");

        state.shutdown().await;
    }
}
