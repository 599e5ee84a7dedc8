#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod conversation;
mod provider;
mod tailor;

pub use conversation::{ConversationStore, ThreadMessage, ThreadRole};
pub use provider::{CompletionBackend, RigBackend, TailorModel, TailorProviderConfig};
pub use tailor::{TailorOutcome, TailorService};

/// Tracing target for the AI adapter.
pub const TRACING_TARGET: &str = "vitae_ai";
