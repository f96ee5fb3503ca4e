//! Bearer token providers: a static token or the GCE metadata server

use std::time::{Duration, Instant};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use shared::http::{build_client, endpoint, ensure_success};
use shared::{ApiFailure, PipelineConfig};
use crate::error::{EnricherError, EnricherResult};
use crate::traits::CredentialProvider;

/// Tokens are refreshed this long before the server-reported expiry
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Fixed token, typically from `GOOGLE_OAUTH_ACCESS_TOKEN`
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn token(&self, audience: &str) -> EnricherResult<String> {
        if self.token.is_empty() {
            return Err(EnricherError::Authentication {
                audience: audience.to_string(),
                message: "static token is empty".to_string(),
            });
        }
        Ok(self.token.clone())
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Default service account token from the instance metadata server
pub struct MetadataServerTokenProvider {
    client: Client,
    base_url: String,
    cached: RwLock<Option<CachedToken>>,
}

impl MetadataServerTokenProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            cached: RwLock::new(None),
        }
    }

    async fn fetch(&self, audience: &str) -> EnricherResult<MetadataToken> {
        let auth_error = |message: String| EnricherError::Authentication {
            audience: audience.to_string(),
            message,
        };

        let url = endpoint(
            &self.base_url,
            ["computeMetadata", "v1", "instance", "service-accounts", "default", "token"],
        )?;

        let response = self
            .client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| auth_error(ApiFailure::from_reqwest(&e).to_string()))?;
        let response = ensure_success(response).await.map_err(|f| auth_error(f.to_string()))?;

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| auth_error(format!("malformed token response: {e}")))?;
        if token.access_token.is_empty() {
            return Err(auth_error("metadata server returned an empty token".to_string()));
        }
        Ok(token)
    }
}

#[async_trait]
impl CredentialProvider for MetadataServerTokenProvider {
    async fn token(&self, audience: &str) -> EnricherResult<String> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
                return Ok(token.value.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch(audience).await?;
        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(REFRESH_MARGIN);
        debug!(expires_in = fresh.expires_in, "Fetched access token from metadata server");

        let value = fresh.access_token;
        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(value)
    }
}

/// Credential source chosen from configuration
pub enum DefaultCredentials {
    Static(StaticTokenProvider),
    Metadata(MetadataServerTokenProvider),
}

impl DefaultCredentials {
    /// Static token when one is configured, otherwise the metadata server
    pub fn from_config(config: &PipelineConfig) -> EnricherResult<Self> {
        match &config.access_token {
            Some(token) => Ok(DefaultCredentials::Static(StaticTokenProvider::new(token.clone()))),
            None => {
                let client = build_client(config.request_timeout)?;
                Ok(DefaultCredentials::Metadata(MetadataServerTokenProvider::new(
                    client,
                    config.endpoints.metadata.clone(),
                )))
            }
        }
    }
}

#[async_trait]
impl CredentialProvider for DefaultCredentials {
    async fn token(&self, audience: &str) -> EnricherResult<String> {
        match self {
            DefaultCredentials::Static(provider) => provider.token(audience).await,
            DefaultCredentials::Metadata(provider) => provider.token(audience).await,
        }
    }
}
