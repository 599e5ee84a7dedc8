#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use vitae_server::middleware::{RecoveryConfig, RouterRecoveryExt};
use vitae_server::{ServiceState, grpc_router, routes};

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "vitae_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "vitae_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "vitae_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();
    cli.validate().context("invalid configuration")?;

    let state = ServiceState::from_config(cli.service_config()?)
        .context("failed to create service state")?;

    let rest = routes(state.clone())
        .with_recovery(RecoveryConfig::with_timeout(cli.server.request_timeout()));
    let grpc = grpc_router(state.clone());

    let result = server::serve(rest, grpc, &cli.server).await;

    // Background work stops regardless of how serving ended.
    state.shutdown().await;

    if let Err(error) = &result {
        if let Some(suggestion) = error.suggestion() {
            tracing::info!(
                target: TRACING_TARGET_SHUTDOWN,
                suggestion,
                "recovery suggestion"
            );
        }
    }

    result.context("server terminated abnormally")
}
