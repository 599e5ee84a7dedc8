//! Worker pool and rate limiting configuration.

use std::time::Duration;

use anyhow::anyhow;
use clap::Args;
use vitae_pool::{PoolConfig, RateLimitConfig};

use crate::TRACING_TARGET_CONFIG;

/// Worker pool sizing and per-destination admission limits.
///
/// # Environment Variables
///
/// - `WORKERS` - Worker count (default: 4)
/// - `QUEUE_SIZE` - Shared job queue capacity (default: 100)
/// - `REQUESTS_PER_MINUTE` - Per-destination admission rate (default: 60)
/// - `JOB_TIMEOUT` - Default extraction deadline in seconds (default: 30)
/// - `SCRAPE_REQUEST_TIMEOUT` - Single network exchange timeout (default: 20)
#[derive(Debug, Clone, Args)]
#[must_use = "config does nothing unless you use it"]
pub struct PoolArgs {
    /// Number of long-lived extraction workers.
    #[arg(long, env = "WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Capacity of the shared job queue; submissions beyond it fail fast.
    #[arg(long, env = "QUEUE_SIZE", default_value_t = 100)]
    pub queue_size: usize,

    /// Per-destination steady-state admissions per minute.
    #[arg(long, env = "REQUESTS_PER_MINUTE", default_value_t = 60)]
    pub requests_per_minute: u32,

    /// Default extraction deadline in seconds for jobs without one.
    #[arg(long, env = "JOB_TIMEOUT", default_value_t = 30)]
    pub job_timeout: u64,

    /// Timeout in seconds for a single scrape network exchange.
    #[arg(long, env = "SCRAPE_REQUEST_TIMEOUT", default_value_t = 20)]
    pub scrape_request_timeout: u64,
}

impl PoolArgs {
    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            return Err(anyhow!("worker count must be at least 1"));
        }
        if self.queue_size == 0 {
            return Err(anyhow!("queue size must be at least 1"));
        }
        if self.requests_per_minute == 0 {
            return Err(anyhow!("requests per minute must be at least 1"));
        }
        if self.job_timeout == 0 || self.job_timeout > 600 {
            return Err(anyhow!(
                "job timeout {}s is invalid, must be between 1 and 600 seconds",
                self.job_timeout
            ));
        }
        Ok(())
    }

    /// Assembles the pool configuration.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            workers: self.workers,
            queue_size: self.queue_size,
            default_timeout: Duration::from_secs(self.job_timeout),
            rate_limit: RateLimitConfig {
                requests_per_minute: self.requests_per_minute,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Returns the per-exchange scrape timeout.
    pub fn scrape_request_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_request_timeout)
    }

    /// Logs the effective pool configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            workers = self.workers,
            queue_size = self.queue_size,
            requests_per_minute = self.requests_per_minute,
            job_timeout_secs = self.job_timeout,
            "worker pool configured"
        );
    }
}
