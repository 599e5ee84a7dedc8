#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod dispatcher;
mod job;
pub mod limit;
mod pool;
mod scraper;
mod stats;
mod worker;

pub use job::{Extraction, JobOptions, JobPayload, JobResult};
pub use limit::{Decision, RateLimitConfig, RateLimiter};
pub use pool::{PoolConfig, WorkerPool};
pub use scraper::Scraper;
pub use stats::PoolStatsSnapshot;

/// Tracing target for pool infrastructure.
pub const TRACING_TARGET: &str = "vitae_pool";
