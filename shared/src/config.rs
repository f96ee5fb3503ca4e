//! Environment-based pipeline configuration
//!
//! Values are loaded from:
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//!
//! ## Required
//! - `GCP_PROJECT_ID`, `GCP_REGION`, `VERTEX_BUCKET`
//!
//! ## Optional
//! - `FIRESTORE_COLLECTION` (default `image-data`)
//! - `GEMINI_MODEL` (default `gemini-1.5-flash-001`)
//! - `EMBEDDING_MODEL` (default `multimodalembedding@001`)
//! - `EMBEDDING_DIMENSION` (default 512; one of 128, 256, 512, 1408)
//! - `MAX_LABELS` (default 10)
//! - `REQUEST_TIMEOUT_SECS` (default 30)
//! - `DESCRIPTION_CONTEXT`: domain framing handed to the description model
//! - `GOOGLE_OAUTH_ACCESS_TOKEN`: static bearer token, skips the metadata server
//! - `VISION_BASE_URL`, `VERTEX_BASE_URL`, `FIRESTORE_BASE_URL`,
//!   `STORAGE_BASE_URL`, `METADATA_BASE_URL`: endpoint overrides for emulators

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{SharedError, SharedResult};
use crate::types::{DEFAULT_EMBEDDING_DIMENSION, SUPPORTED_EMBEDDING_DIMENSIONS};

pub const DEFAULT_COLLECTION: &str = "image-data";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-001";
pub const DEFAULT_EMBEDDING_MODEL: &str = "multimodalembedding@001";
pub const DEFAULT_MAX_LABELS: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DESCRIPTION_CONTEXT: &str = "The images come from a home improvement marketplace and usually show home improvement projects. \
Assess each image carefully so the description matches what is actually shown.";

/// Base URLs of every Google service the pipeline talks to
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceEndpoints {
    pub vision: String,
    pub vertex: String,
    pub firestore: String,
    pub storage: String,
    pub metadata: String,
}

impl ServiceEndpoints {
    /// Production endpoints for a Vertex AI region
    pub fn for_region(region: &str) -> Self {
        Self {
            vision: "https://vision.googleapis.com".to_string(),
            vertex: format!("https://{region}-aiplatform.googleapis.com"),
            firestore: "https://firestore.googleapis.com".to_string(),
            storage: "https://storage.googleapis.com".to_string(),
            metadata: "http://metadata.google.internal".to_string(),
        }
    }
}

/// Process-wide pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub project_id: String,
    pub region: String,
    pub collection: String,
    /// Bucket receiving `<id>.json` artifacts in the write-once variant
    pub artifact_bucket: String,
    pub gemini_model: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub max_labels: usize,
    pub request_timeout: Duration,
    pub description_context: String,
    pub access_token: Option<String>,
    pub endpoints: ServiceEndpoints,
}

impl PipelineConfig {
    /// Load from `.env` and the process environment
    pub fn from_env() -> SharedResult<Self> {
        // Silently ignored when no .env file exists
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an explicit key/value map
    pub fn from_map(values: &HashMap<String, String>) -> SharedResult<Self> {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> SharedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| SharedError::MissingConfig { field: key.to_string() })
        };

        let project_id = required("GCP_PROJECT_ID")?;
        let region = required("GCP_REGION")?;
        let artifact_bucket = required("VERTEX_BUCKET")?;

        let embedding_dimension = parse_or("EMBEDDING_DIMENSION", get("EMBEDDING_DIMENSION"), DEFAULT_EMBEDDING_DIMENSION)?;
        if !SUPPORTED_EMBEDDING_DIMENSIONS.contains(&embedding_dimension) {
            return Err(SharedError::InvalidConfig {
                field: "EMBEDDING_DIMENSION".to_string(),
                value: embedding_dimension.to_string(),
            });
        }

        let max_labels = parse_or("MAX_LABELS", get("MAX_LABELS"), DEFAULT_MAX_LABELS)?;
        if max_labels == 0 {
            return Err(SharedError::InvalidConfig {
                field: "MAX_LABELS".to_string(),
                value: "0".to_string(),
            });
        }

        let timeout_secs = parse_or("REQUEST_TIMEOUT_SECS", get("REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(SharedError::InvalidConfig {
                field: "REQUEST_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
            });
        }

        let defaults = ServiceEndpoints::for_region(&region);
        let endpoints = ServiceEndpoints {
            vision: get("VISION_BASE_URL").unwrap_or(defaults.vision),
            vertex: get("VERTEX_BASE_URL").unwrap_or(defaults.vertex),
            firestore: get("FIRESTORE_BASE_URL").unwrap_or(defaults.firestore),
            storage: get("STORAGE_BASE_URL").unwrap_or(defaults.storage),
            metadata: get("METADATA_BASE_URL").unwrap_or(defaults.metadata),
        };

        Ok(Self {
            project_id,
            region,
            collection: get("FIRESTORE_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            artifact_bucket,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            embedding_model: get("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimension,
            max_labels,
            request_timeout: Duration::from_secs(timeout_secs),
            description_context: get("DESCRIPTION_CONTEXT").unwrap_or_else(|| DEFAULT_DESCRIPTION_CONTEXT.to_string()),
            access_token: get("GOOGLE_OAUTH_ACCESS_TOKEN"),
            endpoints,
        })
    }
}

fn parse_or<T: FromStr>(field: &str, value: Option<String>, default: T) -> SharedResult<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| SharedError::InvalidConfig {
            field: field.to_string(),
            value: raw,
        }),
    }
}
