//! Multimodal embeddings from the Vertex AI prediction endpoint

use std::sync::Arc;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use shared::http::{audience_for, endpoint, ensure_success};
use shared::{ApiFailure, EmbeddingPair, ImageLocator};
use crate::error::{EnricherError, EnricherResult};
use crate::traits::{CredentialProvider, EmbeddingGenerator};
use crate::types::{EmbeddingInstance, EmbeddingParameters, ImageInput, PredictRequest, PredictResponse};

const SERVICE: &str = "embedding";

pub struct RealEmbeddingGenerator<C: CredentialProvider> {
    client: Client,
    base_url: String,
    project_id: String,
    region: String,
    model: String,
    dimension: usize,
    credentials: Arc<C>,
}

impl<C: CredentialProvider> RealEmbeddingGenerator<C> {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        region: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
        credentials: Arc<C>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            region: region.into(),
            model: model.into(),
            dimension,
            credentials,
        }
    }
}

#[async_trait]
impl<C: CredentialProvider> EmbeddingGenerator for RealEmbeddingGenerator<C> {
    async fn embed(&self, description: &str, labels: &[String], locator: &ImageLocator) -> EnricherResult<EmbeddingPair> {
        let body = serde_json::to_vec(&build_request(description, labels, locator, self.dimension))?;
        let token = self.credentials.token(&audience_for(&self.base_url)).await?;

        let action = format!("{}:predict", self.model);
        let url = endpoint(
            &self.base_url,
            [
                "v1",
                "projects",
                self.project_id.as_str(),
                "locations",
                self.region.as_str(),
                "publishers",
                "google",
                "models",
                action.as_str(),
            ],
        )?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| EnricherError::api(SERVICE, ApiFailure::from_reqwest(&e)))?;
        let response = ensure_success(response).await.map_err(|f| EnricherError::api(SERVICE, f))?;

        let predictions: PredictResponse = response
            .json()
            .await
            .map_err(|e| EnricherError::decode("prediction response", e.to_string()))?;

        let pair = into_pair(predictions, self.dimension)?;
        debug!(image = %locator, dimension = self.dimension, "Embeddings generated");
        Ok(pair)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Description followed by the comma-joined labels
pub fn embedding_text(description: &str, labels: &[String]) -> String {
    if labels.is_empty() {
        description.to_string()
    } else {
        format!("{} {}", description, labels.join(", "))
    }
}

pub fn build_request(description: &str, labels: &[String], locator: &ImageLocator, dimension: usize) -> PredictRequest {
    PredictRequest {
        instances: vec![EmbeddingInstance {
            text: embedding_text(description, labels),
            image: ImageInput::from_locator(locator),
            parameters: EmbeddingParameters { dimension },
        }],
    }
}

/// First prediction as a pair, checked against the expected dimension
pub fn into_pair(response: PredictResponse, dimension: usize) -> EnricherResult<EmbeddingPair> {
    let prediction = response
        .predictions
        .into_iter()
        .next()
        .ok_or(EnricherError::EmptyPredictions)?;

    let pair = EmbeddingPair {
        image_embedding: prediction.image_embedding,
        text_embedding: prediction.text_embedding,
    };
    if !pair.has_dimension(dimension) {
        return Err(EnricherError::DimensionMismatch {
            expected: dimension,
            image: pair.image_embedding.len(),
            text: pair.text_embedding.len(),
        });
    }
    Ok(pair)
}
