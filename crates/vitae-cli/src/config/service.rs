//! Collaborator configuration: AI provider, object storage, renderer.

use std::time::Duration;

use anyhow::anyhow;
use clap::Args;
use vitae_ai::{TailorModel, TailorProviderConfig};
use vitae_object::StoreConfig;

use crate::TRACING_TARGET_CONFIG;

/// External collaborator configuration.
///
/// # Environment Variables
///
/// - `TAILOR_PROVIDER` / `TAILOR_API_KEY` / `TAILOR_MODEL` - AI tailoring
/// - `STORAGE_BACKEND` - `memory`, `fs` or `s3`
/// - `STORAGE_ROOT` - Filesystem root for the `fs` backend
/// - `STORAGE_BUCKET` / `STORAGE_REGION` / `STORAGE_ENDPOINT` - S3 settings
/// - `STORAGE_PUBLIC_URL` - Base URL for returned artifact locations
/// - `RENDERER_URL` - Screenshot rendering service endpoint
/// - `TASK_TTL` - Seconds a terminal task record stays queryable
#[derive(Debug, Clone, Args)]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceArgs {
    /// Tailoring provider, `openai` or `anthropic`.
    #[arg(long, env = "TAILOR_PROVIDER")]
    pub tailor_provider: Option<String>,

    /// API key for the tailoring provider.
    #[arg(long, env = "TAILOR_API_KEY", hide_env_values = true)]
    pub tailor_api_key: Option<String>,

    /// Model name for the tailoring provider.
    #[arg(long, env = "TAILOR_MODEL", default_value = "gpt-4o-mini")]
    pub tailor_model: String,

    /// Object storage backend: `memory`, `fs` or `s3`.
    #[arg(long, env = "STORAGE_BACKEND", default_value = "memory")]
    pub storage_backend: String,

    /// Filesystem root for the `fs` backend.
    #[arg(long, env = "STORAGE_ROOT")]
    pub storage_root: Option<String>,

    /// Bucket name for the `s3` backend.
    #[arg(long, env = "STORAGE_BUCKET")]
    pub storage_bucket: Option<String>,

    /// Region for the `s3` backend.
    #[arg(long, env = "STORAGE_REGION")]
    pub storage_region: Option<String>,

    /// Custom endpoint for S3-compatible stores.
    #[arg(long, env = "STORAGE_ENDPOINT")]
    pub storage_endpoint: Option<String>,

    /// Base URL prefixed onto stored artifact keys.
    #[arg(long, env = "STORAGE_PUBLIC_URL")]
    pub storage_public_url: Option<String>,

    /// Screenshot rendering service endpoint.
    #[arg(long, env = "RENDERER_URL")]
    pub renderer_url: Option<String>,

    /// Seconds a terminal task record stays queryable.
    #[arg(long, env = "TASK_TTL", default_value_t = 3600)]
    pub task_ttl: u64,
}

impl ServiceArgs {
    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tailor_provider.is_some() && self.tailor_api_key.is_none() {
            return Err(anyhow!(
                "--tailor-api-key (or TAILOR_API_KEY) is required when a tailor provider is set"
            ));
        }

        match self.storage_backend.as_str() {
            "memory" => {}
            "fs" => {
                if self.storage_root.is_none() {
                    return Err(anyhow!("--storage-root is required for the fs backend"));
                }
                if self.storage_public_url.is_none() {
                    return Err(anyhow!(
                        "--storage-public-url is required for the fs backend"
                    ));
                }
            }
            "s3" => {
                if self.storage_bucket.is_none() || self.storage_region.is_none() {
                    return Err(anyhow!(
                        "--storage-bucket and --storage-region are required for the s3 backend"
                    ));
                }
                if self.storage_public_url.is_none() {
                    return Err(anyhow!(
                        "--storage-public-url is required for the s3 backend"
                    ));
                }
            }
            other => return Err(anyhow!("unknown storage backend '{other}'")),
        }

        if self.task_ttl == 0 {
            return Err(anyhow!("task TTL must be at least 1 second"));
        }

        Ok(())
    }

    /// Assembles the tailoring provider configuration, if one is set.
    pub fn tailor_provider(&self) -> anyhow::Result<Option<TailorProviderConfig>> {
        let Some(provider) = &self.tailor_provider else {
            return Ok(None);
        };

        let provider: TailorModel = provider.parse().map_err(|error| anyhow!("{error}"))?;
        let api_key = self
            .tailor_api_key
            .clone()
            .ok_or_else(|| anyhow!("tailor API key missing"))?;

        Ok(Some(TailorProviderConfig {
            provider,
            api_key,
            model: self.tailor_model.clone(),
        }))
    }

    /// Assembles the object store configuration.
    pub fn store_config(&self) -> anyhow::Result<StoreConfig> {
        let config = match self.storage_backend.as_str() {
            "memory" => StoreConfig::memory(),
            "fs" => StoreConfig::Fs {
                root: self
                    .storage_root
                    .clone()
                    .ok_or_else(|| anyhow!("storage root missing"))?,
                public_base_url: self
                    .storage_public_url
                    .clone()
                    .ok_or_else(|| anyhow!("storage public URL missing"))?,
            },
            "s3" => StoreConfig::S3 {
                bucket: self
                    .storage_bucket
                    .clone()
                    .ok_or_else(|| anyhow!("storage bucket missing"))?,
                region: self
                    .storage_region
                    .clone()
                    .ok_or_else(|| anyhow!("storage region missing"))?,
                endpoint: self.storage_endpoint.clone(),
                public_base_url: self
                    .storage_public_url
                    .clone()
                    .ok_or_else(|| anyhow!("storage public URL missing"))?,
            },
            other => return Err(anyhow!("unknown storage backend '{other}'")),
        };

        Ok(config)
    }

    /// Returns the terminal-record TTL.
    pub fn task_ttl(&self) -> Duration {
        Duration::from_secs(self.task_ttl)
    }

    /// Sweep period for the task table.
    pub fn task_sweep_interval(&self) -> Duration {
        Duration::from_secs(300)
    }

    /// Logs the effective collaborator configuration.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            tailor_provider = self.tailor_provider.as_deref().unwrap_or("disabled"),
            storage_backend = %self.storage_backend,
            renderer = self.renderer_url.as_deref().unwrap_or("disabled"),
            task_ttl_secs = self.task_ttl,
            "collaborators configured"
        );
    }
}
