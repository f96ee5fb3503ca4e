//! Main orchestrator implementation
//!
//! Drives each fetched record through the enrichment state machine one
//! document at a time, using the injected stores and enrichment services.

use enricher::{DescriptionGenerator, EmbeddingGenerator, EnricherError, PerceptionAdapter};
use shared::{doc_debug, doc_error, doc_info, Enrichment, ImageRecord};

use crate::{
    error::{OrchestratorError, OrchestratorResult},
    traits::{IdempotencyStore, RecordStore},
    types::{BatchReport, EnrichmentStage, FailurePolicy, PipelineVariant, StepFailure},
};

/// Batch orchestrator that sequences the enrichment services per document
pub struct Orchestrator<I, R, P, D, E>
where
    I: IdempotencyStore,
    R: RecordStore,
    P: PerceptionAdapter,
    D: DescriptionGenerator,
    E: EmbeddingGenerator,
{
    /// Injected services
    idempotency: I,
    records: R,
    perception: P,
    describer: D,
    embedder: E,

    policy: FailurePolicy,
    variant: PipelineVariant,
}

impl<I, R, P, D, E> Orchestrator<I, R, P, D, E>
where
    I: IdempotencyStore,
    R: RecordStore,
    P: PerceptionAdapter,
    D: DescriptionGenerator,
    E: EmbeddingGenerator,
{
    /// Create new orchestrator with injected dependencies
    pub fn new(idempotency: I, records: R, perception: P, describer: D, embedder: E) -> Self {
        Self {
            idempotency,
            records,
            perception,
            describer,
            embedder,
            policy: FailurePolicy::default(),
            variant: PipelineVariant::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_variant(mut self, variant: PipelineVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Fetch up to `limit` records and enrich them in store order
    ///
    /// Under `FailurePolicy::Abort` the first document failure is returned as
    /// `OrchestratorError::StepFailed`. Under `Continue` failures are collected
    /// in the report and the batch runs to the end.
    pub async fn run_batch(&self, limit: usize) -> OrchestratorResult<BatchReport> {
        let records = self.records.fetch_candidates(limit).await?;
        let mut report = BatchReport {
            fetched: records.len(),
            ..Default::default()
        };
        tracing::info!(
            fetched = report.fetched,
            limit,
            variant = %self.variant,
            policy = %self.policy,
            "📥 Fetched candidate records"
        );

        for record in records {
            match self.process_document(record).await {
                Ok(EnrichmentStage::SkippedExisting) => report.skipped += 1,
                Ok(_) => report.persisted += 1,
                Err(OrchestratorError::StepFailed { id, stage, source }) => {
                    doc_error!(id, stage = %stage, error = %source, "❌ Enrichment failed");
                    if self.policy == FailurePolicy::Abort {
                        return Err(OrchestratorError::StepFailed { id, stage, source });
                    }
                    report.failures.push(StepFailure {
                        id,
                        stage,
                        error: source.to_string(),
                    });
                }
                Err(other) => return Err(other),
            }
        }

        tracing::info!(
            fetched = report.fetched,
            persisted = report.persisted,
            skipped = report.skipped,
            failed = report.failures.len(),
            "📊 Batch finished: {}",
            report
        );
        Ok(report)
    }

    /// Run one record to a terminal stage
    ///
    /// Returns `Persisted` or `SkippedExisting`; every failure is a
    /// `StepFailed` naming the stage that was being attempted.
    pub async fn process_document(&self, mut record: ImageRecord) -> OrchestratorResult<EnrichmentStage> {
        let id = record.id.clone();
        doc_debug!(id, stage = %EnrichmentStage::Fetched, "Processing document");

        if self.variant == PipelineVariant::WriteOnce {
            let exists = self
                .idempotency
                .exists(&id)
                .await
                .map_err(|e| step_failed(&id, EnrichmentStage::CheckedIdempotency, e))?;
            if exists {
                doc_info!(id, "⏭️  Artifact already exists, skipping");
                return Ok(EnrichmentStage::SkippedExisting);
            }
        }

        let locator = record
            .locator()
            .map_err(|e| step_failed(&id, EnrichmentStage::LabelsDetected, e))?;

        let labels = self
            .perception
            .detect_labels(&locator)
            .await
            .map_err(|e| step_failed(&id, EnrichmentStage::LabelsDetected, e))?;
        doc_debug!(id, count = labels.len(), "Labels detected");

        let colors = self
            .perception
            .detect_colors(&locator)
            .await
            .map_err(|e| step_failed(&id, EnrichmentStage::ColorsDetected, e))?;
        doc_debug!(id, count = colors.len(), "Colors detected");

        let description = self
            .describer
            .describe(&locator, &labels)
            .await
            .map_err(|e| step_failed(&id, EnrichmentStage::DescriptionGenerated, e))?;
        doc_debug!(id, chars = description.len(), "Description generated");

        let embeddings = self
            .embedder
            .embed(&description, &labels, &locator)
            .await
            .map_err(|e| step_failed(&id, EnrichmentStage::EmbeddingsGenerated, e))?;

        let dimension = self.embedder.dimension();
        if !embeddings.has_dimension(dimension) {
            let mismatch = EnricherError::DimensionMismatch {
                expected: dimension,
                image: embeddings.image_embedding.len(),
                text: embeddings.text_embedding.len(),
            };
            return Err(step_failed(&id, EnrichmentStage::EmbeddingsGenerated, mismatch));
        }

        record.apply_enrichment(Enrichment {
            labels,
            colors,
            description,
            embeddings,
        });

        let persisted = match self.variant {
            PipelineVariant::WriteOnce => self.idempotency.put(&record).await,
            PipelineVariant::Mutable => self.records.persist(&record).await,
        };
        persisted.map_err(|e| step_failed(&id, EnrichmentStage::Persisted, e))?;

        doc_info!(id, variant = %self.variant, "✅ Document enriched");
        Ok(EnrichmentStage::Persisted)
    }
}

fn step_failed<Err>(id: &str, stage: EnrichmentStage, error: Err) -> OrchestratorError
where
    Err: std::error::Error + Send + Sync + 'static,
{
    OrchestratorError::StepFailed {
        id: id.to_string(),
        stage,
        source: Box::new(error),
    }
}
