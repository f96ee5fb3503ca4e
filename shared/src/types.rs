//! Core image record types shared between the enricher and the orchestrator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{SharedError, SharedResult};

/// Embedding dimensionality used when none is configured
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 512;

/// Dimensions accepted by the multimodal embedding model
pub const SUPPORTED_EMBEDDING_DIMENSIONS: &[usize] = &[128, 256, 512, 1408];

/// Stored when the model returns no usable candidate
pub const EMPTY_DESCRIPTION: &str = "Empty Description";

/// Stored when the model withholds its answer for safety reasons
pub const SAFETY_DESCRIPTION: &str = "Finish with SafetyReason";

/// An image record as held in the canonical document store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    pub bucket: String,
    pub name: String,
    /// Object path inside the bucket, including the file name
    pub path: String,
    /// Public URL of the image
    pub url: String,
    pub description: String,
    pub published: bool,
    pub valid: bool,
    pub time_created: Option<DateTime<Utc>>,
    pub time_updated: Option<DateTime<Utc>>,
    pub metadata: Metadata,
    pub text_embeddings: Vec<f64>,
    pub image_embeddings: Vec<f64>,
}

impl ImageRecord {
    /// Storage locator of the image object
    pub fn locator(&self) -> SharedResult<ImageLocator> {
        ImageLocator::new(&self.bucket, &self.path)
    }

    /// Copy the derived fields of one enrichment pass into the record
    pub fn apply_enrichment(&mut self, enrichment: Enrichment) {
        self.description = enrichment.description;
        self.metadata.labels = enrichment.labels;
        self.metadata.colors = enrichment.colors;
        self.text_embeddings = enrichment.embeddings.text_embedding;
        self.image_embeddings = enrichment.embeddings.image_embedding;
    }
}

/// Image metadata block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub labels: Vec<String>,
    pub colors: Vec<Color>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A named dominant color, e.g. dark brown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub name: String,
    pub shade: String,
    /// Relative dominance, never negative
    pub weight: f32,
}

impl Color {
    pub fn new(name: impl Into<String>, shade: impl Into<String>, weight: f32) -> Self {
        Self {
            name: name.into(),
            shade: shade.into(),
            weight,
        }
    }
}

/// Paired vectors produced by one embedding prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingPair {
    pub image_embedding: Vec<f64>,
    pub text_embedding: Vec<f64>,
}

impl EmbeddingPair {
    /// Both vectors are present and have exactly `dimension` components
    pub fn has_dimension(&self, dimension: usize) -> bool {
        self.image_embedding.len() == dimension && self.text_embedding.len() == dimension
    }
}

/// Everything derived for one document in one enrichment pass
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub labels: Vec<String>,
    pub colors: Vec<Color>,
    pub description: String,
    pub embeddings: EmbeddingPair,
}

/// A `gs://<bucket>/<path>` reference to an image object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageLocator {
    bucket: String,
    path: String,
}

impl ImageLocator {
    pub fn new(bucket: &str, path: &str) -> SharedResult<Self> {
        let bucket = bucket.trim();
        let path = path.trim().trim_start_matches('/');
        if bucket.is_empty() || path.is_empty() || bucket.contains('/') {
            return Err(SharedError::InvalidLocator {
                input: format!("gs://{bucket}/{path}"),
            });
        }
        Ok(Self {
            bucket: bucket.to_string(),
            path: path.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// MIME type guessed from the object extension, JPEG when unknown
    pub fn mime_type(&self) -> &'static str {
        let extension = self
            .path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "bmp" => "image/bmp",
            "heic" => "image/heic",
            _ => "image/jpeg",
        }
    }
}

impl fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.path)
    }
}

/// Object key of the artifact written for a document
pub fn artifact_key(id: &str) -> String {
    format!("{id}.json")
}

/// The write-once persisted unit, one JSON object per document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentArtifact {
    pub id: String,
    pub url: String,
    pub description: String,
    pub metadata: ArtifactMetadata,
    pub text_embeddings: Vec<f64>,
    pub image_embeddings: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub labels: Vec<String>,
    pub colors: Vec<Color>,
}

impl From<&ImageRecord> for EnrichmentArtifact {
    fn from(record: &ImageRecord) -> Self {
        Self {
            id: record.id.clone(),
            url: record.url.clone(),
            description: record.description.clone(),
            metadata: ArtifactMetadata {
                labels: record.metadata.labels.clone(),
                colors: record.metadata.colors.clone(),
            },
            text_embeddings: record.text_embeddings.clone(),
            image_embeddings: record.image_embeddings.clone(),
        }
    }
}
