//! Vertex AI Gemini `generateContent` client

use std::sync::Arc;
use async_trait::async_trait;
use reqwest::Client;

use shared::http::{audience_for, endpoint, ensure_success};
use shared::ApiFailure;
use crate::error::{EnricherError, EnricherResult};
use crate::traits::{CredentialProvider, GenerativeClient};
use crate::types::{GenerateRequest, GenerateResponse};

const SERVICE: &str = "gemini";

pub struct RealGenerativeClient<C: CredentialProvider> {
    client: Client,
    base_url: String,
    project_id: String,
    region: String,
    model: String,
    credentials: Arc<C>,
}

impl<C: CredentialProvider> RealGenerativeClient<C> {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        region: impl Into<String>,
        model: impl Into<String>,
        credentials: Arc<C>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            region: region.into(),
            model: model.into(),
            credentials,
        }
    }
}

#[async_trait]
impl<C: CredentialProvider> GenerativeClient for RealGenerativeClient<C> {
    async fn generate(&self, request: GenerateRequest) -> EnricherResult<GenerateResponse> {
        let token = self.credentials.token(&audience_for(&self.base_url)).await?;
        let action = format!("{}:generateContent", self.model);
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

        let body = serde_json::to_vec(&request)?;
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

        response
            .json()
            .await
            .map_err(|e| EnricherError::decode("gemini response", e.to_string()))
    }
}
