//! Enricher error types

use shared::{ApiFailure, SharedError};
use thiserror::Error;

/// Result type for enricher operations
pub type EnricherResult<T> = Result<T, EnricherError>;

/// Enricher error types
#[derive(Error, Debug)]
pub enum EnricherError {
    #[error("{service} request failed: {failure}")]
    Api { service: &'static str, failure: ApiFailure },

    #[error("Could not obtain token for {audience}: {message}")]
    Authentication { audience: String, message: String },

    #[error("Failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("Prediction response contained no predictions")]
    EmptyPredictions,

    #[error("Embedding dimension mismatch: expected {expected}, got image={image} text={text}")]
    DimensionMismatch { expected: usize, image: usize, text: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),
}

impl EnricherError {
    pub(crate) fn api(service: &'static str, failure: ApiFailure) -> Self {
        EnricherError::Api { service, failure }
    }

    pub(crate) fn decode(what: &'static str, message: impl Into<String>) -> Self {
        EnricherError::Decode {
            what,
            message: message.into(),
        }
    }
}
