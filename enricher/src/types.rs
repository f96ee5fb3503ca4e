//! Wire types for the Vision, Gemini and multimodal embedding APIs

use serde::{Deserialize, Serialize};
use shared::ImageLocator;

// ---------------------------------------------------------------------------
// Gemini generateContent
// ---------------------------------------------------------------------------

/// A generateContent request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    /// Single user turn made of the given parts
    pub fn user(parts: Vec<ContentPart>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: None,
            generation_config,
        }
    }

    pub fn with_system_instruction(mut self, instruction: &str) -> Self {
        self.system_instruction = Some(Content {
            role: None,
            parts: vec![ContentPart::text(instruction)],
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

/// One content part; anything unrecognized lands in `Other`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Text {
        text: String,
    },
    FileReference {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    Other(serde_json::Value),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Reference an image by its storage locator
    pub fn image(locator: &ImageLocator) -> Self {
        ContentPart::FileReference {
            file_data: FileData {
                mime_type: locator.mime_type().to_string(),
                file_uri: locator.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

/// A generateContent response body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// First part of the first candidate, if any
    pub fn first_part(&self) -> Option<&ContentPart> {
        self.candidates.first().and_then(|candidate| candidate.parts().first())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

impl Candidate {
    pub fn parts(&self) -> &[ContentPart] {
        self.content.as_ref().map(|c| c.parts.as_slice()).unwrap_or(&[])
    }

    pub fn finish_reason(&self) -> FinishReason {
        match self.finish_reason.as_deref() {
            None => FinishReason::Unspecified,
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::MaxTokens,
            Some("SAFETY") => FinishReason::Safety,
            Some(_) => FinishReason::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Unspecified,
    Stop,
    MaxTokens,
    Safety,
    Other,
}

// ---------------------------------------------------------------------------
// Vision images:annotate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub label_annotations: Vec<LabelAnnotation>,
    #[serde(default)]
    pub image_properties_annotation: Option<ImageProperties>,
    #[serde(default)]
    pub error: Option<RpcStatus>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelAnnotation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProperties {
    #[serde(default)]
    pub dominant_colors: DominantColors,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DominantColors {
    #[serde(default)]
    pub colors: Vec<ColorCluster>,
}

/// One raw dominant-color cluster as reported by Vision
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorCluster {
    #[serde(default)]
    pub color: Rgb,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub pixel_fraction: f32,
}

/// Channels in 0..=255; Vision omits channels that are zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Rgb {
    #[serde(default)]
    pub red: f32,
    #[serde(default)]
    pub green: f32,
    #[serde(default)]
    pub blue: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Multimodal embedding :predict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<EmbeddingInstance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingInstance {
    pub text: String,
    pub image: ImageInput,
    pub parameters: EmbeddingParameters,
}

/// Image reference; `gcs_uri` and `bytes_base64_encoded` are mutually exclusive
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_base64_encoded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcs_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ImageInput {
    pub fn from_locator(locator: &ImageLocator) -> Self {
        Self {
            bytes_base64_encoded: None,
            gcs_uri: Some(locator.to_string()),
            mime_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingParameters {
    pub dimension: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default)]
    pub image_embedding: Vec<f64>,
    #[serde(default)]
    pub text_embedding: Vec<f64>,
}
