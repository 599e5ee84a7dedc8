//! Scrape submission handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use vitae_core::task::TaskRequest;
use vitae_core::{ErrorKind, TaskKind};
use vitae_pool::{JobOptions, JobPayload};

use super::TRACING_TARGET;
use super::error::{Error, Result};
use super::request::{ScrapeRequest, ValidateJson};
use super::response::AsyncAccepted;
use crate::service::ServiceState;

/// `POST /api/v1/scrape`
///
/// Validates the target, creates the task and returns 202 with the process
/// id; extraction itself runs through the worker pool in the background.
pub(super) async fn submit_scrape(
    State(state): State<ServiceState>,
    ValidateJson(request): ValidateJson<ScrapeRequest>,
) -> Result<(StatusCode, Json<AsyncAccepted>)> {
    if !state.pool().is_healthy() {
        return Err(Error::new(
            ErrorKind::ServiceUnavailable,
            "worker pool is unavailable",
        ));
    }

    let payload = match (&request.url, &request.description) {
        (Some(url), _) => JobPayload::Url(url.clone()),
        (None, Some(description)) => JobPayload::Description(description.clone()),
        // Unreachable after validation, but fail closed rather than panic.
        (None, None) => {
            return Err(Error::new(
                ErrorKind::ValidationFailed,
                "either url or description is required",
            ));
        }
    };
    let options: JobOptions = request.options.clone().unwrap_or_default().into();

    let task_request = TaskRequest::Scrape {
        url: request.url.clone(),
        description: request.description.clone(),
    };

    let executor_state = state.clone();
    let process_id = state.tasks().submit(TaskKind::Scrape, task_request, async move {
        executor_state.execute_scrape(payload, options).await
    });

    tracing::debug!(
        target: TRACING_TARGET,
        process_id = %process_id,
        "scrape submission accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(AsyncAccepted::new(
            process_id,
            "scrape job accepted for processing",
        )),
    ))
}
