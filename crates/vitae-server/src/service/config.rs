//! Service-level configuration consumed by [`super::ServiceState`].

use std::time::Duration;

use vitae_ai::TailorProviderConfig;
use vitae_object::StoreConfig;
use vitae_pool::PoolConfig;

/// Everything the service layer needs to come up.
///
/// The CLI crate builds this from parsed arguments; tests build it directly.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Worker pool sizing and admission limits.
    pub pool: PoolConfig,
    /// Timeout for a single scrape network exchange.
    pub scrape_request_timeout: Duration,
    /// TTL for terminal task records.
    pub task_ttl: Duration,
    /// Sweep period for the task table.
    pub task_sweep_interval: Duration,
    /// Tailoring provider; tailoring submissions fail without one.
    pub tailor: Option<TailorProviderConfig>,
    /// Object storage for rendered artifacts.
    pub store: StoreConfig,
    /// Screenshot renderer endpoint; screenshot submissions fail without one.
    pub renderer_url: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            scrape_request_timeout: Duration::from_secs(20),
            task_ttl: Duration::from_secs(3600),
            task_sweep_interval: Duration::from_secs(300),
            tailor: None,
            store: StoreConfig::memory(),
            renderer_url: None,
        }
    }
}
