//! Storage trait definitions with mockall annotations for testing
//!
//! The enrichment capabilities themselves (perception, description,
//! embeddings) are defined in the `enricher` crate; this module only holds
//! the two stores the orchestrator reads from and writes to.

use async_trait::async_trait;

use shared::ImageRecord;
use crate::error::OrchestratorResult;

/// Write-once artifact store keyed by `<id>.json`
#[mockall::automock]
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Whether an artifact already exists for the document
    ///
    /// A "not found" lookup is `Ok(false)`; any other failure is an error so
    /// callers can tell absence from an unknown state.
    async fn exists(&self, id: &str) -> OrchestratorResult<bool>;

    /// Serialize the enriched record and write it, overwriting any prior artifact
    async fn put(&self, record: &ImageRecord) -> OrchestratorResult<()>;
}

/// Canonical document store holding image records
#[mockall::automock]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Up to `limit` records in store order
    async fn fetch_candidates(&self, limit: usize) -> OrchestratorResult<Vec<ImageRecord>>;

    /// Field-scoped update of the pipeline-owned fields
    async fn persist(&self, record: &ImageRecord) -> OrchestratorResult<()>;
}
