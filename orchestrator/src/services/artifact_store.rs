//! Cloud Storage artifact store for the write-once variant

use std::sync::Arc;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use enricher::CredentialProvider;
use shared::http::{audience_for, endpoint, ensure_success};
use shared::{artifact_key, ApiFailure, EnrichmentArtifact, ImageRecord};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::IdempotencyStore;

/// One `<id>.json` object per document in a bucket
pub struct GcsArtifactStore<C: CredentialProvider> {
    client: Client,
    base_url: String,
    bucket: String,
    credentials: Arc<C>,
}

impl<C: CredentialProvider> GcsArtifactStore<C> {
    pub fn new(client: Client, base_url: impl Into<String>, bucket: impl Into<String>, credentials: Arc<C>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            bucket: bucket.into(),
            credentials,
        }
    }

    async fn token(&self) -> OrchestratorResult<String> {
        Ok(self.credentials.token(&audience_for(&self.base_url)).await?)
    }
}

#[async_trait]
impl<C: CredentialProvider> IdempotencyStore for GcsArtifactStore<C> {
    async fn exists(&self, id: &str) -> OrchestratorResult<bool> {
        let key = artifact_key(id);
        let url = endpoint(&self.base_url, ["storage", "v1", "b", self.bucket.as_str(), "o", key.as_str()])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.token().await?)
            .send()
            .await
            .map_err(|e| OrchestratorError::store("exists", id, ApiFailure::from_reqwest(&e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(response)
            .await
            .map_err(|f| OrchestratorError::store("exists", id, f))?;
        Ok(true)
    }

    async fn put(&self, record: &ImageRecord) -> OrchestratorResult<()> {
        let key = artifact_key(&record.id);
        let body = serde_json::to_vec(&EnrichmentArtifact::from(record))?;

        let mut url = endpoint(&self.base_url, ["upload", "storage", "v1", "b", self.bucket.as_str(), "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", &key);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token().await?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| OrchestratorError::store("put", &record.id, ApiFailure::from_reqwest(&e)))?;
        ensure_success(response)
            .await
            .map_err(|f| OrchestratorError::store("put", &record.id, f))?;

        debug!(document = %record.id, bucket = %self.bucket, key = %key, "Artifact uploaded");
        Ok(())
    }
}
