//! Enricher trait definitions for dependency injection

use async_trait::async_trait;

use shared::{Color, EmbeddingPair, ImageLocator};
use crate::error::EnricherResult;
use crate::types::{ColorCluster, GenerateRequest, GenerateResponse, LabelAnnotation};

/// Bearer token source for Google APIs
#[mockall::automock]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Token valid for the given audience, e.g. `https://vision.googleapis.com/`
    async fn token(&self, audience: &str) -> EnricherResult<String>;
}

/// Raw Cloud Vision annotations
#[mockall::automock]
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Label annotations, at most `max_results`
    async fn detect_labels(&self, locator: &ImageLocator, max_results: usize) -> EnricherResult<Vec<LabelAnnotation>>;

    /// Dominant color clusters from the image properties feature
    async fn dominant_colors(&self, locator: &ImageLocator) -> EnricherResult<Vec<ColorCluster>>;
}

/// Gemini generateContent transport
#[mockall::automock]
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> EnricherResult<GenerateResponse>;
}

/// Labels and named colors for an image
#[mockall::automock]
#[async_trait]
pub trait PerceptionAdapter: Send + Sync {
    /// Label descriptions in the order Vision returned them
    async fn detect_labels(&self, locator: &ImageLocator) -> EnricherResult<Vec<String>>;

    /// Dominant colors normalized to name/shade/weight triples
    async fn detect_colors(&self, locator: &ImageLocator) -> EnricherResult<Vec<Color>>;
}

/// Short marketplace description for an image
#[mockall::automock]
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    /// Generated text, or one of the sentinel strings when the model yields nothing usable
    async fn describe(&self, locator: &ImageLocator, labels: &[String]) -> EnricherResult<String>;
}

/// Paired image/text embeddings
#[mockall::automock]
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    async fn embed(&self, description: &str, labels: &[String], locator: &ImageLocator) -> EnricherResult<EmbeddingPair>;

    /// Configured vector length
    fn dimension(&self) -> usize;
}
