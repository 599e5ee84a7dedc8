#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod store;

pub use config::StoreConfig;
pub use store::ObjectStore;

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "vitae_object";
