//! Firestore REST record store

use std::sync::Arc;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::json;
use tracing::debug;

use enricher::CredentialProvider;
use shared::http::{audience_for, endpoint, ensure_success};
use shared::{ApiFailure, ImageRecord};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::services::firestore_codec::{decode_record, encode_owned_fields, Document, RunQueryItem, OWNED_FIELD_PATHS};
use crate::traits::RecordStore;

/// Image records in one Firestore collection
pub struct FirestoreRecordStore<C: CredentialProvider> {
    client: Client,
    base_url: String,
    project_id: String,
    collection: String,
    credentials: Arc<C>,
}

impl<C: CredentialProvider> FirestoreRecordStore<C> {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        collection: impl Into<String>,
        credentials: Arc<C>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            collection: collection.into(),
            credentials,
        }
    }

    /// `.../databases/(default)/<leaf>`
    fn database_url(&self, leaf: &[&str]) -> OrchestratorResult<Url> {
        let mut segments = vec!["v1", "projects", self.project_id.as_str(), "databases", "(default)"];
        segments.extend_from_slice(leaf);
        Ok(endpoint(&self.base_url, segments)?)
    }

    async fn token(&self) -> OrchestratorResult<String> {
        Ok(self.credentials.token(&audience_for(&self.base_url)).await?)
    }
}

#[async_trait]
impl<C: CredentialProvider> RecordStore for FirestoreRecordStore<C> {
    async fn fetch_candidates(&self, limit: usize) -> OrchestratorResult<Vec<ImageRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let url = self.database_url(&["documents:runQuery"])?;
        let body = json!({
            "structuredQuery": {
                "from": [{"collectionId": self.collection}],
                "limit": limit
            }
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token().await?)
            .json(&body)
            .send()
            .await
            .map_err(|e| OrchestratorError::store("fetch", &self.collection, ApiFailure::from_reqwest(&e)))?;
        let response = ensure_success(response)
            .await
            .map_err(|f| OrchestratorError::store("fetch", &self.collection, f))?;

        let items: Vec<RunQueryItem> = response.json().await.map_err(|e| OrchestratorError::RecordDecode {
            id: self.collection.clone(),
            message: e.to_string(),
        })?;

        let records = items
            .iter()
            .filter_map(|item| item.document.as_ref())
            .take(limit)
            .map(decode_record)
            .collect::<OrchestratorResult<Vec<_>>>()?;

        debug!(collection = %self.collection, count = records.len(), "Fetched records");
        Ok(records)
    }

    async fn persist(&self, record: &ImageRecord) -> OrchestratorResult<()> {
        let mut url = self.database_url(&["documents", self.collection.as_str(), record.id.as_str()])?;
        {
            let mut query = url.query_pairs_mut();
            for path in OWNED_FIELD_PATHS {
                query.append_pair("updateMask.fieldPaths", path);
            }
        }

        let document = Document {
            fields: encode_owned_fields(record),
            ..Default::default()
        };
        let body = serde_json::to_vec(&document)?;

        let response = self
            .client
            .patch(url)
            .bearer_auth(self.token().await?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| OrchestratorError::store("persist", &record.id, ApiFailure::from_reqwest(&e)))?;
        ensure_success(response)
            .await
            .map_err(|f| OrchestratorError::store("persist", &record.id, f))?;

        debug!(document = %record.id, "Record updated");
        Ok(())
    }
}
