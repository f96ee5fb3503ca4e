//! Enricher library for the image enrichment pipeline
//!
//! This library provides the capability providers the orchestrator sequences:
//! credentials, perception (labels and colors), description generation and
//! multimodal embeddings, each behind a mockable trait.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use error::{EnricherError, EnricherResult};
pub use services::*;
pub use traits::*;
pub use types::*;
