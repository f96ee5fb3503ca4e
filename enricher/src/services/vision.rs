//! Cloud Vision `images:annotate` client

use std::sync::Arc;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use shared::http::{audience_for, endpoint, ensure_success};
use shared::{ApiFailure, ImageLocator};
use crate::error::{EnricherError, EnricherResult};
use crate::traits::{CredentialProvider, VisionClient};
use crate::types::{AnnotateImageResponse, BatchAnnotateResponse, ColorCluster, LabelAnnotation};

const SERVICE: &str = "vision";

pub struct RealVisionClient<C: CredentialProvider> {
    client: Client,
    base_url: String,
    credentials: Arc<C>,
}

impl<C: CredentialProvider> RealVisionClient<C> {
    pub fn new(client: Client, base_url: impl Into<String>, credentials: Arc<C>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            credentials,
        }
    }

    /// Run one feature against one image and return its single response
    async fn annotate(&self, locator: &ImageLocator, feature: serde_json::Value) -> EnricherResult<AnnotateImageResponse> {
        let token = self.credentials.token(&audience_for(&self.base_url)).await?;
        let url = endpoint(&self.base_url, ["v1", "images:annotate"])?;

        let body = json!({
            "requests": [{
                "image": {"source": {"imageUri": locator.to_string()}},
                "features": [feature]
            }]
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| EnricherError::api(SERVICE, ApiFailure::from_reqwest(&e)))?;
        let response = ensure_success(response).await.map_err(|f| EnricherError::api(SERVICE, f))?;

        let batch: BatchAnnotateResponse = response
            .json()
            .await
            .map_err(|e| EnricherError::decode("vision response", e.to_string()))?;

        let first = batch
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| EnricherError::decode("vision response", "no responses"))?;

        if let Some(status) = first.error.as_ref().filter(|s| s.code != 0) {
            return Err(EnricherError::api(SERVICE, ApiFailure::from_rpc_code(status.code, &status.message)));
        }
        Ok(first)
    }
}

#[async_trait]
impl<C: CredentialProvider> VisionClient for RealVisionClient<C> {
    async fn detect_labels(&self, locator: &ImageLocator, max_results: usize) -> EnricherResult<Vec<LabelAnnotation>> {
        let response = self
            .annotate(locator, json!({"type": "LABEL_DETECTION", "maxResults": max_results}))
            .await?;
        let mut labels = response.label_annotations;
        labels.truncate(max_results);
        Ok(labels)
    }

    async fn dominant_colors(&self, locator: &ImageLocator) -> EnricherResult<Vec<ColorCluster>> {
        let response = self.annotate(locator, json!({"type": "IMAGE_PROPERTIES"})).await?;
        Ok(response
            .image_properties_annotation
            .map(|properties| properties.dominant_colors.colors)
            .unwrap_or_default())
    }
}
