#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod error;
pub mod health;
pub mod model;
pub mod retry;
pub mod task;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{ServiceHealth, ServiceStatus};
pub use task::{ProcessId, TaskKind, TaskRecord, TaskStatus};

/// Tracing target for the core library.
pub const TRACING_TARGET: &str = "vitae_core";
