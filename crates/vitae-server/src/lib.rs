#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod handler;
pub mod middleware;
pub mod rpc;
pub mod service;
pub mod task;

pub use handler::routes;
pub use rpc::grpc_router;
pub use service::{ServiceConfig, ServiceState};
pub use task::TaskManager;
