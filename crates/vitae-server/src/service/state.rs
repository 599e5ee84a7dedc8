//! Shared service state threaded through both surfaces.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use vitae_ai::{CompletionBackend, ConversationStore, RigBackend, TailorService};
use vitae_core::health::ServiceStatus;
use vitae_core::Result;
use vitae_object::ObjectStore;
use vitae_pool::{Scraper, WorkerPool};
use vitae_scrape::HttpScraper;

use super::TRACING_TARGET;
use super::config::ServiceConfig;
use super::screenshot::{HttpRenderer, ScreenshotRenderer};
use crate::task::TaskManager;

/// Shared, cheaply-cloneable service state.
///
/// Constructed once at startup and handed to the HTTP router, the RPC
/// services and the lifecycle code.
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<StateInner>,
}

struct StateInner {
    tasks: TaskManager,
    pool: Arc<WorkerPool>,
    tailor: Option<TailorService>,
    store: ObjectStore,
    renderer: Option<Arc<dyn ScreenshotRenderer>>,
    started_at: Instant,
}

impl ServiceState {
    /// Builds the state from configuration with production collaborators.
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        ServiceStateBuilder::new(config).build()
    }

    /// Starts a builder for overriding collaborators, mainly in tests.
    pub fn builder(config: ServiceConfig) -> ServiceStateBuilder {
        ServiceStateBuilder::new(config)
    }

    /// The task manager.
    pub fn tasks(&self) -> &TaskManager {
        &self.inner.tasks
    }

    /// The worker pool.
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.inner.pool
    }

    /// The tailoring service, when configured.
    pub fn tailor(&self) -> Option<&TailorService> {
        self.inner.tailor.as_ref()
    }

    /// The object store.
    pub fn store(&self) -> &ObjectStore {
        &self.inner.store
    }

    /// The screenshot renderer, when configured.
    pub fn renderer(&self) -> Option<&Arc<dyn ScreenshotRenderer>> {
        self.inner.renderer.as_ref()
    }

    /// Seconds since the service came up.
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// Crate version reported on health surfaces.
    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Aggregate health: unhealthy without a live pool, degraded when a
    /// configured collaborator stops answering.
    pub async fn health(&self) -> ServiceStatus {
        if !self.inner.pool.is_healthy() {
            return ServiceStatus::Unhealthy;
        }

        if !self.inner.store.health().await {
            return ServiceStatus::Degraded;
        }

        if let Some(renderer) = &self.inner.renderer {
            if !renderer.health().await {
                return ServiceStatus::Degraded;
            }
        }

        ServiceStatus::Healthy
    }

    /// Stops background work: in-flight executors observe the shutdown
    /// token, then the pool drains its tasks.
    pub async fn shutdown(&self) {
        tracing::info!(target: TRACING_TARGET, "service state shutting down");
        self.inner.tasks.shutdown();
        self.inner.pool.shutdown().await;
    }
}

/// Builder allowing collaborator overrides before the state comes up.
pub struct ServiceStateBuilder {
    config: ServiceConfig,
    scraper: Option<Arc<dyn Scraper>>,
    tailor_backend: Option<Arc<dyn CompletionBackend>>,
    renderer: Option<Arc<dyn ScreenshotRenderer>>,
}

impl ServiceStateBuilder {
    fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            scraper: None,
            tailor_backend: None,
            renderer: None,
        }
    }

    /// Replaces the extraction engine.
    pub fn with_scraper(mut self, scraper: Arc<dyn Scraper>) -> Self {
        self.scraper = Some(scraper);
        self
    }

    /// Replaces the tailoring completion backend.
    pub fn with_tailor_backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.tailor_backend = Some(backend);
        self
    }

    /// Replaces the screenshot renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn ScreenshotRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Wires everything together and starts the background machinery.
    pub fn build(self) -> Result<ServiceState> {
        let config = self.config;

        let scraper: Arc<dyn Scraper> = match self.scraper {
            Some(scraper) => scraper,
            None => Arc::new(HttpScraper::new(config.scrape_request_timeout)?),
        };

        let pool = WorkerPool::start(config.pool.clone(), scraper);

        let tasks = TaskManager::new(config.task_ttl);
        tasks.spawn_sweeper(config.task_sweep_interval);

        let tailor_backend: Option<Arc<dyn CompletionBackend>> = match self.tailor_backend {
            Some(backend) => Some(backend),
            None => match &config.tailor {
                Some(provider) => Some(Arc::new(RigBackend::new(provider)?)),
                None => None,
            },
        };
        let tailor = tailor_backend.map(|backend| {
            let conversations = ConversationStore::new();
            conversations.spawn_sweeper(sweeper_token(&tasks));
            TailorService::new(backend, conversations)
        });

        let renderer: Option<Arc<dyn ScreenshotRenderer>> = match self.renderer {
            Some(renderer) => Some(renderer),
            None => match &config.renderer_url {
                Some(url) => Some(Arc::new(HttpRenderer::new(url)?)),
                None => None,
            },
        };

        let store = ObjectStore::new(&config.store)?;

        tracing::info!(
            target: TRACING_TARGET,
            tailor_configured = tailor.is_some(),
            renderer_configured = renderer.is_some(),
            store_backend = config.store.backend_name(),
            "service state initialized"
        );

        Ok(ServiceState {
            inner: Arc::new(StateInner {
                tasks,
                pool,
                tailor,
                store,
                renderer,
                started_at: Instant::now(),
            }),
        })
    }
}

fn sweeper_token(tasks: &TaskManager) -> CancellationToken {
    tasks.shutdown_token().child_token()
}
