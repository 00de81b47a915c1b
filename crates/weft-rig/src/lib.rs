#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
pub mod provider;
mod request;
mod router;

pub use error::{RigError, RigResult};
pub use request::CompletionRequest;
pub use router::{CompletionRouter, ProviderKeys};

/// Tracing target for completion provider operations.
pub const TRACING_TARGET: &str = "weft_rig";
