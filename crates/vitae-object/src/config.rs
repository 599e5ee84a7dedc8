//! Storage backend selection.

use serde::{Deserialize, Serialize};

/// Which OpenDAL service backs the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// In-process memory store, used by tests and local development.
    Memory {
        /// Base URL prefixed onto object keys in returned locations.
        #[serde(default = "default_memory_base")]
        public_base_url: String,
    },
    /// Local filesystem store.
    Fs {
        root: String,
        public_base_url: String,
    },
    /// S3-compatible store.
    S3 {
        bucket: String,
        region: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        public_base_url: String,
    },
}

fn default_memory_base() -> String {
    "memory://vitae".to_string()
}

impl StoreConfig {
    /// In-memory configuration with the default base URL.
    pub fn memory() -> Self {
        Self::Memory {
            public_base_url: default_memory_base(),
        }
    }

    /// Returns the backend name for logs.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory { .. } => "memory",
            Self::Fs { .. } => "fs",
            Self::S3 { .. } => "s3",
        }
    }

    pub(crate) fn public_base_url(&self) -> &str {
        match self {
            Self::Memory { public_base_url }
            | Self::Fs {
                public_base_url, ..
            }
            | Self::S3 {
                public_base_url, ..
            } => public_base_url,
        }
    }
}
