#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Generated bindings for the `vitae.v1` package.
#[allow(clippy::all)]
pub mod v1 {
    tonic::include_proto!("vitae.v1");
}
