//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── server: ServerConfig   # Host, port, timeouts, shutdown
//! ├── pool: PoolArgs         # Workers, queue, rate limits
//! └── service: ServiceArgs   # Tailoring provider, storage, renderer
//! ```
//!
//! All configuration can be provided via CLI arguments or environment
//! variables. Use `--help` to see all available options.

mod pool;
mod server;
mod service;

use std::process;

use clap::Parser;
pub use pool::PoolArgs;
pub use server::ServerConfig;
pub use service::ServiceArgs;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use vitae_server::service::ServiceConfig;

use crate::TRACING_TARGET_STARTUP;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "vitae")]
#[command(about = "vitae resume/job-posting utility server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// Worker pool and rate limiting configuration.
    #[clap(flatten)]
    pub pool: PoolArgs,

    /// Collaborator configuration (AI provider, storage, renderer).
    #[clap(flatten)]
    pub service: ServiceArgs,
}

impl Cli {
    /// Loads environment variables from a `.env` file and parses arguments.
    pub fn init() -> Self {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                eprintln!("Warning: failed to load .env file: {err}");
            }
        }
        Self::parse()
    }

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server.validate()?;
        self.pool.validate()?;
        self.service.validate()?;
        Ok(())
    }

    /// Logs configuration at startup (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            "build information"
        );

        self.server.log();
        self.pool.log();
        self.service.log();
    }

    /// Assembles the service-layer configuration.
    pub fn service_config(&self) -> anyhow::Result<ServiceConfig> {
        Ok(ServiceConfig {
            pool: self.pool.pool_config(),
            scrape_request_timeout: self.pool.scrape_request_timeout(),
            task_ttl: self.service.task_ttl(),
            task_sweep_interval: self.service.task_sweep_interval(),
            tailor: self.service.tailor_provider()?,
            store: self.service.store_config()?,
            renderer_url: self.service.renderer_url.clone(),
        })
    }
}
