//! Orchestrator-specific error types

use thiserror::Error;
use enricher::EnricherError;
use shared::{ApiFailure, SharedError};

use crate::types::EnrichmentStage;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Store operation {operation} failed for {id}: {failure}")]
    Store { operation: &'static str, id: String, failure: ApiFailure },

    #[error("Document {id} failed while {stage}: {source}")]
    StepFailed {
        id: String,
        stage: EnrichmentStage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Record {id} could not be decoded: {message}")]
    RecordDecode { id: String, message: String },

    #[error("Batch finished with {failed} of {fetched} documents failed")]
    BatchIncomplete { failed: usize, fetched: usize },

    #[error("Artifact encoding error: {0}")]
    ArtifactEncoding(#[from] serde_json::Error),

    #[error("File system operation failed: {operation} on {path}: {source}")]
    Io {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Enricher error: {0}")]
    Enricher(#[from] EnricherError),

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

impl OrchestratorError {
    pub(crate) fn store(operation: &'static str, id: impl Into<String>, failure: ApiFailure) -> Self {
        OrchestratorError::Store {
            operation,
            id: id.into(),
            failure,
        }
    }

    pub(crate) fn io(operation: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        OrchestratorError::Io {
            operation,
            path: path.display().to_string(),
            source,
        }
    }
}
