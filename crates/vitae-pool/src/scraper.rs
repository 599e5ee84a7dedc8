//! The extraction seam between the pool and its engines.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vitae_core::Result;

use crate::job::{Extraction, JobOptions, JobPayload};

/// A pluggable extraction engine.
///
/// The pool makes no assumptions about the implementation beyond this
/// contract: the engine must respect `cancel` and return promptly once it
/// fires. Deadlines are enforced by the calling worker, so implementations
/// need not race their own timers.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Extracts a job posting from the payload.
    async fn extract(
        &self,
        payload: &JobPayload,
        options: &JobOptions,
        cancel: &CancellationToken,
    ) -> Result<Extraction>;
}
