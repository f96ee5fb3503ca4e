//! Batch configuration and reporting types

use std::fmt;
use std::str::FromStr;

/// Per-document progress through one enrichment pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrichmentStage {
    Fetched,
    CheckedIdempotency,
    SkippedExisting,
    LabelsDetected,
    ColorsDetected,
    DescriptionGenerated,
    EmbeddingsGenerated,
    Persisted,
    Failed,
}

impl EnrichmentStage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EnrichmentStage::SkippedExisting | EnrichmentStage::Persisted | EnrichmentStage::Failed
        )
    }
}

// Phrased as the work leading to the stage, so failures read "failed while detecting labels"
impl fmt::Display for EnrichmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EnrichmentStage::Fetched => "fetching",
            EnrichmentStage::CheckedIdempotency => "checking idempotency",
            EnrichmentStage::SkippedExisting => "skipping existing",
            EnrichmentStage::LabelsDetected => "detecting labels",
            EnrichmentStage::ColorsDetected => "detecting colors",
            EnrichmentStage::DescriptionGenerated => "generating description",
            EnrichmentStage::EmbeddingsGenerated => "generating embeddings",
            EnrichmentStage::Persisted => "persisting",
            EnrichmentStage::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// What the batch does after a document fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure
    #[default]
    Abort,
    /// Record the failure and move on
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            _ => Err(format!("Unknown failure policy '{s}'. Valid options: abort, continue")),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => write!(f, "abort"),
            FailurePolicy::Continue => write!(f, "continue"),
        }
    }
}

/// Where enriched results go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineVariant {
    /// Idempotency check, then one artifact per document
    #[default]
    WriteOnce,
    /// No check, field-scoped update of the canonical record
    Mutable,
}

impl FromStr for PipelineVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "write-once" | "write_once" | "writeonce" => Ok(PipelineVariant::WriteOnce),
            "mutable" => Ok(PipelineVariant::Mutable),
            _ => Err(format!("Unknown pipeline variant '{s}'. Valid options: write-once, mutable")),
        }
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineVariant::WriteOnce => write!(f, "write-once"),
            PipelineVariant::Mutable => write!(f, "mutable"),
        }
    }
}

/// One failed document, as collected under `FailurePolicy::Continue`
#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    pub id: String,
    pub stage: EnrichmentStage,
    pub error: String,
}

/// Outcome counts of one batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub fetched: usize,
    pub persisted: usize,
    pub skipped: usize,
    pub failures: Vec<StepFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched {}, persisted {}, skipped {}, failed {}",
            self.fetched,
            self.persisted,
            self.skipped,
            self.failures.len()
        )
    }
}
