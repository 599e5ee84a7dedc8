//! Service state and the kind-specific executors.

mod config;
mod executors;
mod export;
mod screenshot;
mod state;

pub use config::ServiceConfig;
pub use export::render_document;
pub use screenshot::{HttpRenderer, ScreenshotRenderer};
pub use state::{ServiceState, ServiceStateBuilder};

/// Tracing target for service wiring.
pub(crate) const TRACING_TARGET: &str = "vitae_server::service";
