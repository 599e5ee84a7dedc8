//! Response envelopes for the HTTP surface.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use vitae_core::ProcessId;
use vitae_core::health::ServiceStatus;
use vitae_pool::PoolStatsSnapshot;

/// Envelope returned for accepted asynchronous submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncAccepted {
    pub process_id: ProcessId,
    /// Always `"ACCEPTED"`.
    pub status: String,
    pub message: String,
    pub timestamp: Timestamp,
}

impl AsyncAccepted {
    pub fn new(process_id: ProcessId, message: impl Into<String>) -> Self {
        Self {
            process_id,
            status: "ACCEPTED".to_string(),
            message: message.into(),
            timestamp: Timestamp::now(),
        }
    }
}

/// Envelope returned for synchronous failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Stable taxonomy code.
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_id: Option<String>,
    pub timestamp: Timestamp,
}

/// Body of the health endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: Timestamp,
}

/// Body of `/status`: health plus task-table and pool detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: ServiceStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub tasks_tracked: usize,
    pub workers: PoolStatsSnapshot,
    pub workers_healthy: bool,
    pub timestamp: Timestamp,
}

/// Body of `/api/v1/metrics/workers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerMetricsResponse {
    pub healthy: bool,
    pub live_workers: usize,
    pub tracked_destinations: usize,
    pub stats: PoolStatsSnapshot,
    pub timestamp: Timestamp,
}

/// Body of `/api/v1/metrics/browser`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserMetricsResponse {
    pub renderer_configured: bool,
    pub renderer_healthy: bool,
    pub storage_healthy: bool,
    pub timestamp: Timestamp,
}
