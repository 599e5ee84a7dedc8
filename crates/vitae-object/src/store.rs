//! OpenDAL-backed object store.

use bytes::Bytes;
use opendal::{Operator, services};
use vitae_core::{ErrorKind, Result};

use crate::TRACING_TARGET;
use crate::config::StoreConfig;

/// Unified store over the configured OpenDAL operator.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    operator: Operator,
    public_base_url: String,
}

impl ObjectStore {
    /// Creates a store from configuration.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let operator = match config {
            StoreConfig::Memory { .. } => build_operator(services::Memory::default())?,
            StoreConfig::Fs { root, .. } => {
                build_operator(services::Fs::default().root(root))?
            }
            StoreConfig::S3 {
                bucket,
                region,
                endpoint,
                ..
            } => {
                let mut builder = services::S3::default().bucket(bucket).region(region);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }
                build_operator(builder)?
            }
        };

        tracing::info!(
            target: TRACING_TARGET,
            backend = config.backend_name(),
            "object store initialized"
        );

        Ok(Self {
            operator,
            public_base_url: config.public_base_url().trim_end_matches('/').to_string(),
        })
    }

    /// Writes `bytes` under `key` and returns the object's public URL.
    pub async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        let size = bytes.len();

        self.operator
            .write_with(key, bytes)
            .content_type(content_type)
            .await
            .map_err(|error| {
                ErrorKind::UpstreamFailure
                    .with_message(format!("upload of {key} failed"))
                    .with_source(error)
            })?;

        tracing::debug!(
            target: TRACING_TARGET,
            key,
            bytes = size,
            content_type,
            "object uploaded"
        );

        Ok(self.url_for(key))
    }

    /// Deletes the object under `key`; missing objects are not an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        self.operator.delete(key).await.map_err(|error| {
            ErrorKind::UpstreamFailure
                .with_message(format!("delete of {key} failed"))
                .with_source(error)
        })
    }

    /// Removes every object under `prefix`.
    pub async fn remove_prefix(&self, prefix: &str) -> Result<()> {
        self.operator.remove_all(prefix).await.map_err(|error| {
            ErrorKind::UpstreamFailure
                .with_message(format!("prefix removal of {prefix} failed"))
                .with_source(error)
        })
    }

    /// Replaces everything under `prefix` with a single object at `key`.
    ///
    /// This is the screenshot write path: stale renders for a resume are
    /// removed before the fresh one lands, so repeated uploads stay
    /// idempotent per resume.
    pub async fn replace_prefix(
        &self,
        prefix: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String> {
        self.remove_prefix(prefix).await?;
        self.upload(key, bytes, content_type).await
    }

    /// Lists the keys currently stored under `prefix`.
    pub async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.operator.list(prefix).await.map_err(|error| {
            ErrorKind::UpstreamFailure
                .with_message(format!("list of {prefix} failed"))
                .with_source(error)
        })?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.path().ends_with('/'))
            .map(|entry| entry.path().to_string())
            .collect())
    }

    /// True when the backend answers a liveness probe.
    pub async fn health(&self) -> bool {
        match self.operator.check().await {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "object store health check failed"
                );
                false
            }
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key.trim_start_matches('/'))
    }
}

fn build_operator(builder: impl opendal::Builder) -> Result<Operator> {
    Ok(Operator::new(builder)
        .map_err(|error| {
            ErrorKind::ConfigurationError
                .with_message("object store configuration rejected")
                .with_source(error)
        })?
        .finish())
}
