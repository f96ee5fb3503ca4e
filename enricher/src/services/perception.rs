//! Labels from Vision, named colors from Vision clusters plus a Gemini translation pass

use std::sync::Arc;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use shared::{Color, ImageLocator};
use crate::error::{EnricherError, EnricherResult};
use crate::traits::{GenerativeClient, PerceptionAdapter, VisionClient};
use crate::types::{ColorCluster, GenerateRequest, GenerationConfig, ContentPart};

const COLOR_SYSTEM_INSTRUCTION: &str = "You are a computer who should calculate the colors and the color weight.";

const COLOR_INSTRUCTIONS: &[&str] = &[
    "Based on the input colors, give me the colors that the RGB values make.",
    "A color MUST be a single word, i.e. 'red', 'blue', 'green', etc.",
    "The response must be a list of objects with the following keys:",
    "name: name of color, shade: light, dark etc, weight: weight of color in float numbers",
    "The color MUST only appear once in the list with shade combinations.",
    "The colors are:",
];

pub struct RealPerceptionAdapter<V: VisionClient, G: GenerativeClient> {
    vision: V,
    generator: Arc<G>,
    max_labels: usize,
}

impl<V: VisionClient, G: GenerativeClient> RealPerceptionAdapter<V, G> {
    pub fn new(vision: V, generator: Arc<G>, max_labels: usize) -> Self {
        Self {
            vision,
            generator,
            max_labels,
        }
    }
}

#[async_trait]
impl<V: VisionClient, G: GenerativeClient> PerceptionAdapter for RealPerceptionAdapter<V, G> {
    async fn detect_labels(&self, locator: &ImageLocator) -> EnricherResult<Vec<String>> {
        let mut annotations = self.vision.detect_labels(locator, self.max_labels).await?;
        // Stable sort keeps Vision's order among equal scores
        annotations.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(annotations
            .into_iter()
            .map(|annotation| annotation.description.trim().to_string())
            .filter(|label| !label.is_empty())
            .take(self.max_labels)
            .collect())
    }

    async fn detect_colors(&self, locator: &ImageLocator) -> EnricherResult<Vec<Color>> {
        let clusters = self.vision.dominant_colors(locator).await?;
        if clusters.is_empty() {
            debug!(image = %locator, "No dominant colors reported");
            return Ok(Vec::new());
        }

        let raw = format_raw_colors(&clusters);
        let response = self.generator.generate(color_request(&raw)).await?;

        let part = response
            .first_part()
            .ok_or_else(|| EnricherError::decode("color response", "no candidates"))?;
        match part {
            ContentPart::Text { text } => parse_color_response(text),
            _ => Err(EnricherError::decode("color response", "first part is not text")),
        }
    }
}

/// Render clusters as `RGB: (r, g, b), weight: w` segments joined by ` - `
pub fn format_raw_colors(clusters: &[ColorCluster]) -> String {
    clusters
        .iter()
        .map(|cluster| {
            format!(
                "RGB: ({}, {}, {}), weight: {}",
                cluster.color.red.round() as u8,
                cluster.color.green.round() as u8,
                cluster.color.blue.round() as u8,
                cluster.score
            )
        })
        .collect::<Vec<_>>()
        .join(" - ")
}

/// Prompt translating raw clusters into named colors
pub fn color_request(raw_colors: &str) -> GenerateRequest {
    let mut parts: Vec<ContentPart> = COLOR_INSTRUCTIONS.iter().map(|line| ContentPart::text(*line)).collect();
    parts.push(ContentPart::text(raw_colors));

    GenerateRequest::user(
        parts,
        GenerationConfig {
            temperature: Some(0.1),
            max_output_tokens: Some(1024),
            response_mime_type: Some("application/json".to_string()),
            ..Default::default()
        },
    )
    .with_system_instruction(COLOR_SYSTEM_INSTRUCTION)
}

#[derive(Deserialize)]
struct RawColor {
    name: String,
    shade: String,
    weight: f32,
}

/// Decode the model's color list, normalizing names and merging duplicates
///
/// Every entry needs a single-word hue and a non-blank shade.
pub fn parse_color_response(text: &str) -> EnricherResult<Vec<Color>> {
    let raw: Vec<RawColor> = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| EnricherError::decode("color response", e.to_string()))?;

    let mut colors: Vec<Color> = Vec::with_capacity(raw.len());
    for entry in raw {
        let name = entry.name.trim().to_lowercase();
        let shade = entry.shade.trim().to_lowercase();

        if name.is_empty() {
            return Err(EnricherError::decode("color response", "color with empty name"));
        }
        if name.split_whitespace().count() > 1 {
            return Err(EnricherError::decode(
                "color response",
                format!("hue '{name}' is not a single word"),
            ));
        }
        if shade.is_empty() {
            return Err(EnricherError::decode("color response", format!("missing shade for {name}")));
        }
        if !entry.weight.is_finite() || entry.weight < 0.0 {
            return Err(EnricherError::decode(
                "color response",
                format!("invalid weight {} for {name}", entry.weight),
            ));
        }

        match colors.iter_mut().find(|c| c.name == name && c.shade == shade) {
            Some(existing) => existing.weight += entry.weight,
            None => colors.push(Color::new(name, shade, entry.weight)),
        }
    }
    Ok(colors)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag such as ```json
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
