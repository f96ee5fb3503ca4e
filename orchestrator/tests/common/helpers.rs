//! Test helpers and builder patterns for orchestrator tests
//!
//! The builder holds plain scenario data (records, existing artifacts,
//! injected failures) and turns it into mocks with a single expectation per
//! method at build time. Every call the mocks receive is recorded in a
//! shared `CallLog`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use enricher::{
    EnricherError, MockDescriptionGenerator, MockEmbeddingGenerator, MockPerceptionAdapter,
};
use ::orchestrator::*;
use shared::{ApiFailure, ImageLocator, ImageRecord};

use super::fixtures::TestFixtures;

/// Type alias for test orchestrator with all mocks
pub type TestOrchestrator = Orchestrator<
    MockIdempotencyStore,
    MockRecordStore,
    MockPerceptionAdapter,
    MockDescriptionGenerator,
    MockEmbeddingGenerator,
>;

/// Calls observed by the mocks during a run
#[derive(Default)]
pub struct CallLog {
    pub exists_checks: AtomicUsize,
    pub label_calls: AtomicUsize,
    pub color_calls: AtomicUsize,
    pub describe_calls: AtomicUsize,
    pub embed_calls: AtomicUsize,
    /// Labels handed to the describer, in call order
    pub describe_labels: Mutex<Vec<Vec<String>>>,
    /// Records written through `IdempotencyStore::put`
    pub artifacts: Mutex<Vec<ImageRecord>>,
    /// Records written through `RecordStore::persist`
    pub updates: Mutex<Vec<ImageRecord>>,
}

impl CallLog {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn perception_calls(&self) -> usize {
        Self::count(&self.label_calls) + Self::count(&self.color_calls)
    }

    pub fn artifacts(&self) -> Vec<ImageRecord> {
        self.artifacts.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<ImageRecord> {
        self.updates.lock().unwrap().clone()
    }
}

/// Builder pattern for creating test orchestrators with sensible defaults
pub struct OrchestratorBuilder {
    records: Vec<ImageRecord>,
    existing: Vec<String>,
    failures: Vec<(String, EnrichmentStage)>,
    description: String,
    embedding_len: usize,
    policy: FailurePolicy,
    variant: PipelineVariant,
    log: Arc<CallLog>,
}

impl OrchestratorBuilder {
    /// Reference scenario: one record, no existing artifacts, no failures
    pub fn new() -> Self {
        Self {
            records: vec![TestFixtures::scenario_record()],
            existing: Vec::new(),
            failures: Vec::new(),
            description: TestFixtures::DESCRIPTION.to_string(),
            embedding_len: TestFixtures::DIMENSION,
            policy: FailurePolicy::default(),
            variant: PipelineVariant::default(),
            log: Arc::new(CallLog::default()),
        }
    }

    /// Replace the records returned by the record store
    pub fn with_records(mut self, records: Vec<ImageRecord>) -> Self {
        self.records = records;
        self
    }

    /// Mark an artifact as already present
    pub fn with_existing(mut self, id: &str) -> Self {
        self.existing.push(id.to_string());
        self
    }

    /// Make the step leading to `stage` fail for document `id`
    pub fn failing_at(mut self, id: &str, stage: EnrichmentStage) -> Self {
        self.failures.push((id.to_string(), stage));
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Length of the vectors the embedder returns; the configured dimension stays 512
    pub fn with_embedding_len(mut self, len: usize) -> Self {
        self.embedding_len = len;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_variant(mut self, variant: PipelineVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Shared call log; grab it before `build`
    pub fn log(&self) -> Arc<CallLog> {
        self.log.clone()
    }

    /// Build the orchestrator with all configured mocks
    pub fn build(self) -> TestOrchestrator {
        // Enrichment services only see locators, so failures are keyed by image URI
        let locator_ids: HashMap<String, String> = self
            .records
            .iter()
            .filter_map(|r| r.locator().ok().map(|l| (l.to_string(), r.id.clone())))
            .collect();
        let failures = Arc::new(self.failures);
        let fails = {
            let failures = failures.clone();
            move |id: &str, stage: EnrichmentStage| failures.iter().any(|(f, s)| f == id && *s == stage)
        };
        let locator_ids = Arc::new(locator_ids);

        let mut idempotency = MockIdempotencyStore::new();
        let mut records = MockRecordStore::new();
        let mut perception = MockPerceptionAdapter::new();
        let mut describer = MockDescriptionGenerator::new();
        let mut embedder = MockEmbeddingGenerator::new();

        let fetched = self.records;
        records
            .expect_fetch_candidates()
            .returning(move |limit| Ok(fetched.iter().take(limit).cloned().collect()));

        {
            let log = self.log.clone();
            let existing = self.existing;
            let fails = fails.clone();
            idempotency.expect_exists().returning(move |id| {
                log.exists_checks.fetch_add(1, Ordering::SeqCst);
                if fails(id, EnrichmentStage::CheckedIdempotency) {
                    return Err(OrchestratorError::Store {
                        operation: "exists",
                        id: id.to_string(),
                        failure: ApiFailure::ServiceUnavailable,
                    });
                }
                Ok(existing.iter().any(|e| e == id))
            });
        }
        {
            let log = self.log.clone();
            let fails = fails.clone();
            idempotency.expect_put().returning(move |record| {
                if fails(&record.id, EnrichmentStage::Persisted) {
                    return Err(OrchestratorError::Store {
                        operation: "put",
                        id: record.id.clone(),
                        failure: ApiFailure::Timeout,
                    });
                }
                log.artifacts.lock().unwrap().push(record.clone());
                Ok(())
            });
        }
        {
            let log = self.log.clone();
            let fails = fails.clone();
            records.expect_persist().returning(move |record| {
                if fails(&record.id, EnrichmentStage::Persisted) {
                    return Err(OrchestratorError::Store {
                        operation: "persist",
                        id: record.id.clone(),
                        failure: ApiFailure::Timeout,
                    });
                }
                log.updates.lock().unwrap().push(record.clone());
                Ok(())
            });
        }

        {
            let log = self.log.clone();
            let fails = fails.clone();
            let ids = locator_ids.clone();
            perception.expect_detect_labels().returning(move |locator| {
                log.label_calls.fetch_add(1, Ordering::SeqCst);
                if fails(&id_for(&ids, locator), EnrichmentStage::LabelsDetected) {
                    return Err(EnricherError::Api {
                        service: "vision",
                        failure: ApiFailure::RateLimitExceeded,
                    });
                }
                Ok(TestFixtures::labels())
            });
        }
        {
            let log = self.log.clone();
            let fails = fails.clone();
            let ids = locator_ids.clone();
            perception.expect_detect_colors().returning(move |locator| {
                log.color_calls.fetch_add(1, Ordering::SeqCst);
                if fails(&id_for(&ids, locator), EnrichmentStage::ColorsDetected) {
                    return Err(EnricherError::Decode {
                        what: "color response",
                        message: "expected value at line 1 column 1".to_string(),
                    });
                }
                Ok(TestFixtures::colors())
            });
        }
        {
            let log = self.log.clone();
            let fails = fails.clone();
            let ids = locator_ids.clone();
            let description = self.description;
            describer.expect_describe().returning(move |locator, labels| {
                log.describe_calls.fetch_add(1, Ordering::SeqCst);
                log.describe_labels.lock().unwrap().push(labels.to_vec());
                if fails(&id_for(&ids, locator), EnrichmentStage::DescriptionGenerated) {
                    return Err(EnricherError::Api {
                        service: "gemini",
                        failure: ApiFailure::ServiceUnavailable,
                    });
                }
                Ok(description.clone())
            });
        }
        {
            let log = self.log.clone();
            let ids = locator_ids.clone();
            let len = self.embedding_len;
            embedder.expect_embed().returning(move |_, _, locator| {
                log.embed_calls.fetch_add(1, Ordering::SeqCst);
                if fails(&id_for(&ids, locator), EnrichmentStage::EmbeddingsGenerated) {
                    return Err(EnricherError::EmptyPredictions);
                }
                Ok(TestFixtures::embeddings(len))
            });
            embedder.expect_dimension().return_const(TestFixtures::DIMENSION);
        }

        Orchestrator::new(idempotency, records, perception, describer, embedder)
            .with_policy(self.policy)
            .with_variant(self.variant)
    }
}

fn id_for(ids: &HashMap<String, String>, locator: &ImageLocator) -> String {
    ids.get(&locator.to_string()).cloned().unwrap_or_default()
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
