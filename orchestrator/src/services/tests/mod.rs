//! Service-specific tests
//!
//! HTTP-backed stores run against wiremock servers; the local store runs in
//! tempfile directories.

#[cfg(test)]
mod firestore;

// Common test utilities for services
#[cfg(test)]
pub mod common {
    use std::sync::Arc;
    use std::time::Duration;

    use enricher::StaticTokenProvider;
    use shared::{Color, ImageRecord, Metadata};

    pub const TEST_TOKEN: &str = "ya29.test";

    pub fn client() -> reqwest::Client {
        shared::http::build_client(Duration::from_secs(5)).expect("client")
    }

    pub fn credentials() -> Arc<StaticTokenProvider> {
        Arc::new(StaticTokenProvider::new(TEST_TOKEN))
    }

    /// A fully enriched record
    pub fn enriched_record(id: &str) -> ImageRecord {
        ImageRecord {
            id: id.to_string(),
            bucket: "imgs".to_string(),
            name: "b.jpg".to_string(),
            path: "a/b.jpg".to_string(),
            url: "https://storage.googleapis.com/imgs/a/b.jpg".to_string(),
            description: "A dark brown sofa in a living room.".to_string(),
            published: true,
            valid: true,
            metadata: Metadata {
                labels: vec!["sofa".to_string(), "living room".to_string()],
                colors: vec![Color::new("brown", "dark", 0.8)],
                width: Some(640),
                height: Some(480),
            },
            text_embeddings: vec![0.1, 0.2],
            image_embeddings: vec![0.3, 0.4],
            ..Default::default()
        }
    }
}
