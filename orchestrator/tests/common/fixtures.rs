//! Test fixtures and data for orchestrator tests
//!
//! The default services answer with the reference scenario: a sofa photo
//! labelled "sofa" and "living room" with one dark brown color.

use shared::{Color, EmbeddingPair, ImageRecord};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Reference document
    pub const DOC_ID: &'static str = "abc123";
    pub const BUCKET: &'static str = "imgs";
    pub const PATH: &'static str = "a/b.jpg";

    pub const DESCRIPTION: &'static str = "A dark brown sofa in a living room.";
    pub const DIMENSION: usize = 512;

    /// The reference document as fetched from the record store
    pub fn scenario_record() -> ImageRecord {
        Self::record_at(Self::DOC_ID, Self::PATH)
    }

    /// A fetched record whose image lives under `<id>/photo.jpg`
    pub fn record(id: &str) -> ImageRecord {
        Self::record_at(id, &format!("{id}/photo.jpg"))
    }

    pub fn record_at(id: &str, path: &str) -> ImageRecord {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        ImageRecord {
            id: id.to_string(),
            bucket: Self::BUCKET.to_string(),
            name,
            path: path.to_string(),
            url: format!("https://storage.googleapis.com/{}/{}", Self::BUCKET, path),
            published: true,
            valid: true,
            ..Default::default()
        }
    }

    /// Several records with distinct image paths
    pub fn records(ids: &[&str]) -> Vec<ImageRecord> {
        ids.iter().map(|id| Self::record(id)).collect()
    }

    pub fn labels() -> Vec<String> {
        vec!["sofa".to_string(), "living room".to_string()]
    }

    pub fn colors() -> Vec<Color> {
        vec![Color::new("brown", "dark", 0.8)]
    }

    pub fn embeddings(len: usize) -> EmbeddingPair {
        EmbeddingPair {
            image_embedding: (0..len).map(|i| i as f64 / 1000.0).collect(),
            text_embedding: (0..len).map(|i| -(i as f64) / 1000.0).collect(),
        }
    }
}
