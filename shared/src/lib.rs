//! Shared types for the image enrichment pipeline
//!
//! Contains the image record model, the artifact written by the write-once
//! variant, environment configuration and the tracing setup used by every crate.

pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod types;

pub use config::{PipelineConfig, ServiceEndpoints};
pub use errors::*;
pub use types::*;
