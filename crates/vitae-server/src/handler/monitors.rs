//! Service health and status handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use jiff::Timestamp;
use vitae_core::health::ServiceStatus;

use super::response::{HealthResponse, StatusResponse};
use crate::service::ServiceState;

/// `GET /health`: full health check across the pool and collaborators.
pub(super) async fn health(
    State(state): State<ServiceState>,
) -> (StatusCode, Json<HealthResponse>) {
    let status = state.health().await;

    let code = match status {
        ServiceStatus::Healthy | ServiceStatus::Degraded => StatusCode::OK,
        ServiceStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: state.version().to_string(),
            uptime_seconds: state.uptime().as_secs(),
            timestamp: Timestamp::now(),
        }),
    )
}

/// `GET /ready`: readiness gate for load balancers.
pub(super) async fn ready(State(state): State<ServiceState>) -> StatusCode {
    if state.pool().is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// `GET /live`: process liveness, always succeeds while serving.
pub(super) async fn live() -> StatusCode {
    StatusCode::OK
}

/// `GET /status`: health plus task-table and pool detail.
pub(super) async fn status(
    State(state): State<ServiceState>,
) -> (StatusCode, Json<StatusResponse>) {
    let status = state.health().await;

    let code = match status {
        ServiceStatus::Healthy | ServiceStatus::Degraded => StatusCode::OK,
        ServiceStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(StatusResponse {
            status,
            version: state.version().to_string(),
            uptime_seconds: state.uptime().as_secs(),
            tasks_tracked: state.tasks().len(),
            workers: state.pool().get_stats(),
            workers_healthy: state.pool().is_healthy(),
            timestamp: Timestamp::now(),
        }),
    )
}
