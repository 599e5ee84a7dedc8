//! All `axum::`[`Router`]s with related handlers.
//!
//! [`Router`]: axum::routing::Router

pub mod error;
pub mod request;
pub mod response;

mod metrics;
mod monitors;
mod resume;
mod scrape;
mod tasks;

use axum::Router;
use axum::routing::{get, post};

pub use error::{Error, Result};
pub use request::ValidateJson;

use crate::service::ServiceState;

/// Tracing target for HTTP handlers.
pub(crate) const TRACING_TARGET: &str = "vitae_server::handler";

/// Returns the complete HTTP/1 JSON router.
pub fn routes(state: ServiceState) -> Router {
    Router::new()
        .route("/api/v1/scrape", post(scrape::submit_scrape))
        .route("/api/v1/resume/tailor", post(resume::submit_tailor))
        .route("/api/v1/resume/screenshot", post(resume::submit_screenshot))
        .route("/api/v1/resume/export", post(resume::submit_export))
        .route("/api/v1/tasks/{process_id}", get(tasks::task_status))
        .route("/api/v1/metrics/workers", get(metrics::worker_metrics))
        .route("/api/v1/metrics/browser", get(metrics::browser_metrics))
        .route("/health", get(monitors::health))
        .route("/ready", get(monitors::ready))
        .route("/live", get(monitors::live))
        .route("/status", get(monitors::status))
        .with_state(state)
}
