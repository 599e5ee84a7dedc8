//! Middleware applied around the HTTP surface.

mod recovery;

pub use recovery::{RecoveryConfig, RouterRecoveryExt};
