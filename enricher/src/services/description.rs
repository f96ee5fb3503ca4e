//! Alt-text style image descriptions from Gemini

use std::sync::Arc;
use async_trait::async_trait;
use tracing::warn;

use shared::{ImageLocator, EMPTY_DESCRIPTION, SAFETY_DESCRIPTION};
use crate::error::EnricherResult;
use crate::traits::{DescriptionGenerator, GenerativeClient};
use crate::types::{FinishReason, GenerateRequest, GenerateResponse, GenerationConfig, ContentPart};

pub struct RealDescriptionGenerator<G: GenerativeClient> {
    generator: Arc<G>,
    context: String,
}

impl<G: GenerativeClient> RealDescriptionGenerator<G> {
    /// `context` frames the image domain for the model
    pub fn new(generator: Arc<G>, context: impl Into<String>) -> Self {
        Self {
            generator,
            context: context.into(),
        }
    }
}

#[async_trait]
impl<G: GenerativeClient> DescriptionGenerator for RealDescriptionGenerator<G> {
    async fn describe(&self, locator: &ImageLocator, labels: &[String]) -> EnricherResult<String> {
        let request = description_request(&self.context, locator, labels);
        let response = self.generator.generate(request).await?;

        let description = interpret_description(&response);
        if description == SAFETY_DESCRIPTION || description == EMPTY_DESCRIPTION {
            warn!(image = %locator, outcome = %description, "Model produced no usable description");
        }
        Ok(description)
    }
}

pub fn description_request(context: &str, locator: &ImageLocator, labels: &[String]) -> GenerateRequest {
    let mut parts = vec![
        ContentPart::text("Describe the image with only 150 tokens."),
        ContentPart::text(context),
        ContentPart::text("The description MUST be something that could be shown in an ALT IMG tag."),
    ];
    if !labels.is_empty() {
        parts.push(ContentPart::text(format!(
            "You can use the following labels to help you describe the image: {}",
            labels.join(", ")
        )));
    }
    parts.push(ContentPart::image(locator));

    GenerateRequest::user(
        parts,
        GenerationConfig {
            temperature: Some(0.9),
            top_p: Some(0.95),
            top_k: Some(20),
            max_output_tokens: Some(512),
            ..Default::default()
        },
    )
}

/// Map a response to its description text or a sentinel
///
/// Leading and trailing whitespace is stripped from the model text; the
/// interior is kept as returned. Text that is blank after stripping counts
/// as empty.
pub fn interpret_description(response: &GenerateResponse) -> String {
    let Some(candidate) = response.candidates.first() else {
        return EMPTY_DESCRIPTION.to_string();
    };
    if candidate.finish_reason() == FinishReason::Safety {
        return SAFETY_DESCRIPTION.to_string();
    }

    match candidate.parts().first() {
        Some(ContentPart::Text { text }) if !text.trim().is_empty() => text.trim().to_string(),
        _ => EMPTY_DESCRIPTION.to_string(),
    }
}
