//! Orchestrator library for batch image enrichment
//!
//! This library sequences the enricher's capability providers over a batch of
//! image records: an idempotency check, labels, colors, a description and
//! embeddings, then persistence to either a write-once artifact store or the
//! canonical record store.

pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::Orchestrator;
pub use traits::{IdempotencyStore, MockIdempotencyStore, MockRecordStore, RecordStore};
pub use types::{BatchReport, EnrichmentStage, FailurePolicy, PipelineVariant, StepFailure};
