//! Main entry point for the orchestrator binary
//!
//! Builds the real services from environment configuration, injects them
//! into the orchestrator and runs one enrichment batch.

use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;

use enricher::{
    DefaultCredentials, DescriptionGenerator, EmbeddingGenerator, PerceptionAdapter, RealDescriptionGenerator,
    RealEmbeddingGenerator, RealGenerativeClient, RealPerceptionAdapter, RealVisionClient,
};
use orchestrator::{
    services::{FirestoreRecordStore, GcsArtifactStore, LocalArtifactStore},
    BatchReport, FailurePolicy, IdempotencyStore, Orchestrator, OrchestratorError, OrchestratorResult,
    PipelineVariant, RecordStore,
};
use shared::logging::{self, LogFormat};
use shared::{http::build_client, PipelineConfig};

/// Batch enrichment of image records with labels, colors, descriptions and embeddings
#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Enriches image records with labels, colors, descriptions and multimodal embeddings")]
pub struct Args {
    /// Maximum number of records to fetch
    #[arg(long, default_value = "2000")]
    pub limit: usize,

    /// Failure policy (abort, continue)
    #[arg(long, default_value = "abort")]
    pub on_error: FailurePolicy,

    /// Persistence variant (write-once, mutable)
    #[arg(long, default_value = "write-once")]
    pub variant: PipelineVariant,

    /// Write artifacts to this directory instead of Cloud Storage
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,
}

#[tokio::main]
async fn main() -> OrchestratorResult<()> {
    let args = Args::parse();
    logging::init_tracing(&args.log_level, args.log_format);

    let result = run(&args).await;
    if let Err(error) = &result {
        logging::log_error("Enrichment batch", error);
    }
    result
}

async fn run(args: &Args) -> OrchestratorResult<()> {
    let config = PipelineConfig::from_env()?;
    logging::log_startup(&format!(
        "image enrichment (project: {}, variant: {}, on-error: {}, limit: {})",
        config.project_id, args.variant, args.on_error, args.limit
    ));

    let client = build_client(config.request_timeout)?;
    let credentials = Arc::new(DefaultCredentials::from_config(&config)?);

    let generator = Arc::new(RealGenerativeClient::new(
        client.clone(),
        config.endpoints.vertex.clone(),
        config.project_id.clone(),
        config.region.clone(),
        config.gemini_model.clone(),
        credentials.clone(),
    ));
    let vision = RealVisionClient::new(client.clone(), config.endpoints.vision.clone(), credentials.clone());
    let perception = RealPerceptionAdapter::new(vision, generator.clone(), config.max_labels);
    let describer = RealDescriptionGenerator::new(generator, config.description_context.clone());
    let embedder = RealEmbeddingGenerator::new(
        client.clone(),
        config.endpoints.vertex.clone(),
        config.project_id.clone(),
        config.region.clone(),
        config.embedding_model.clone(),
        config.embedding_dimension,
        credentials.clone(),
    );
    let records = FirestoreRecordStore::new(
        client.clone(),
        config.endpoints.firestore.clone(),
        config.project_id.clone(),
        config.collection.clone(),
        credentials.clone(),
    );

    let report = match &args.output_dir {
        Some(dir) => {
            let store = LocalArtifactStore::new(dir.clone());
            tracing::info!(dir = %store.base_dir().display(), "📁 Writing artifacts to local directory");
            run_with_store(store, records, perception, describer, embedder, args).await?
        }
        None => {
            let store = GcsArtifactStore::new(client, config.endpoints.storage.clone(), config.artifact_bucket.clone(), credentials);
            run_with_store(store, records, perception, describer, embedder, args).await?
        }
    };

    if report.is_complete() {
        logging::log_success(&format!("Batch complete: {report}"));
        Ok(())
    } else {
        for failure in &report.failures {
            tracing::warn!(document = %failure.id, stage = %failure.stage, error = %failure.error, "Document not enriched");
        }
        Err(OrchestratorError::BatchIncomplete {
            failed: report.failures.len(),
            fetched: report.fetched,
        })
    }
}

async fn run_with_store<I, R, P, D, E>(
    idempotency: I,
    records: R,
    perception: P,
    describer: D,
    embedder: E,
    args: &Args,
) -> OrchestratorResult<BatchReport>
where
    I: IdempotencyStore,
    R: RecordStore,
    P: PerceptionAdapter,
    D: DescriptionGenerator,
    E: EmbeddingGenerator,
{
    Orchestrator::new(idempotency, records, perception, describer, embedder)
        .with_policy(args.on_error)
        .with_variant(args.variant)
        .run_batch(args.limit)
        .await
}
