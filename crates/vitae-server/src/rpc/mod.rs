//! The gRPC surface.
//!
//! Mirrors the HTTP surface: mutating methods return an in-band
//! `AsyncTaskResponse` with `status` `"ACCEPTED"` or `"FAILURE"` instead of
//! gRPC error statuses, so clients of both surfaces see the same envelope
//! semantics.

mod resume;
mod scraper;

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use jiff::Timestamp;
use vitae_core::{ErrorKind, ProcessId};
use vitae_proto::v1::AsyncTaskResponse;
use vitae_proto::v1::resume_service_server::ResumeServiceServer;
use vitae_proto::v1::scraper_service_server::ScraperServiceServer;

pub use resume::ResumeRpc;
pub use scraper::ScraperRpc;

use crate::service::ServiceState;

/// Tracing target for RPC handlers.
pub(crate) const TRACING_TARGET: &str = "vitae_server::rpc";

/// Maximum gRPC message size in either direction.
pub const MAX_MESSAGE_BYTES: usize = 32 * 1024 * 1024;

/// Builds the gRPC services as an axum router for the multiplexer.
pub fn grpc_router(state: ServiceState) -> axum::Router {
    let scraper = ScraperServiceServer::new(ScraperRpc::new(state.clone()))
        .max_decoding_message_size(MAX_MESSAGE_BYTES)
        .max_encoding_message_size(MAX_MESSAGE_BYTES);

    let resume = ResumeServiceServer::new(ResumeRpc::new(state))
        .max_decoding_message_size(MAX_MESSAGE_BYTES)
        .max_encoding_message_size(MAX_MESSAGE_BYTES);

    tonic::service::Routes::new(scraper)
        .add_service(resume)
        .into_axum_router()
}

/// Envelope for an accepted submission.
pub(crate) fn accepted(process_id: &ProcessId, message: impl Into<String>) -> AsyncTaskResponse {
    AsyncTaskResponse {
        process_id: process_id.to_string(),
        status: "ACCEPTED".to_string(),
        message: message.into(),
        timestamp: Timestamp::now().to_string(),
        error: String::new(),
    }
}

/// Envelope for an in-band submission failure.
pub(crate) fn failure(kind: ErrorKind, message: impl Into<String>) -> AsyncTaskResponse {
    AsyncTaskResponse {
        process_id: String::new(),
        status: "FAILURE".to_string(),
        message: message.into(),
        timestamp: Timestamp::now().to_string(),
        error: kind.code().to_string(),
    }
}

/// Runs one RPC handler body behind a panic barrier.
///
/// A recovered panic becomes an in-band `internal` failure envelope, so a
/// misbehaving handler never tears down the connection or the process.
pub(crate) async fn with_panic_barrier<F>(operation: F) -> AsyncTaskResponse
where
    F: Future<Output = AsyncTaskResponse>,
{
    match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let message = panic
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| panic.downcast_ref::<&str>().copied())
                .unwrap_or("unknown panic type");

            tracing::error!(
                target: TRACING_TARGET,
                message,
                "rpc handler panicked"
            );

            failure(ErrorKind::Internal, "an unexpected panic occurred")
        }
    }
}
