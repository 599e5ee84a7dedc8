#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod clean;
mod client;
mod engine;
mod parse;

pub use client::FetchClient;
pub use engine::HttpScraper;

/// Tracing target for extraction operations.
pub const TRACING_TARGET: &str = "vitae_scrape";
