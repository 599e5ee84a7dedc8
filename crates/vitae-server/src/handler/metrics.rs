//! Pool and renderer metrics handlers.

use axum::Json;
use axum::extract::State;
use jiff::Timestamp;

use super::response::{BrowserMetricsResponse, WorkerMetricsResponse};
use crate::service::ServiceState;

/// `GET /api/v1/metrics/workers`
pub(super) async fn worker_metrics(
    State(state): State<ServiceState>,
) -> Json<WorkerMetricsResponse> {
    Json(WorkerMetricsResponse {
        healthy: state.pool().is_healthy(),
        live_workers: state.pool().live_workers(),
        tracked_destinations: state.pool().limiter().tracked_destinations(),
        stats: state.pool().get_stats(),
        timestamp: Timestamp::now(),
    })
}

/// `GET /api/v1/metrics/browser`
pub(super) async fn browser_metrics(
    State(state): State<ServiceState>,
) -> Json<BrowserMetricsResponse> {
    let renderer_healthy = match state.renderer() {
        Some(renderer) => renderer.health().await,
        None => false,
    };

    Json(BrowserMetricsResponse {
        renderer_configured: state.renderer().is_some(),
        renderer_healthy,
        storage_healthy: state.store().health().await,
        timestamp: Timestamp::now(),
    })
}
