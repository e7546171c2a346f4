//! Semantic description generation for ingested documents.

use std::sync::Arc;

use llm_client::{CompletionOptions, LlmClient};
use prompt::{build_description_prompt, ChatMessage, DESCRIBE_SYSTEM};
use tracing::error;

/// Fixed text stored when description generation fails; the document is still
/// saved and remains reachable through the lexical fallback.
pub const DESCRIPTION_ERROR: &str = "Error al generar la descripción semántica";

const DESCRIBE_TEMPERATURE: f32 = 0.3;

/// Produces the structured semantic description (topic, key concepts,
/// keywords, summary) used as the retrieval surrogate for full content.
pub struct DescriptionGenerator {
    llm: Arc<dyn LlmClient>,
}

impl DescriptionGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Best-effort description of `text`; returns [`DESCRIPTION_ERROR`]
    /// instead of raising on failure.
    pub async fn describe(&self, text: &str) -> String {
        let messages = vec![
            ChatMessage::system(DESCRIBE_SYSTEM),
            ChatMessage::user(build_description_prompt(text)),
        ];

        match self
            .llm
            .complete(messages, CompletionOptions::new(DESCRIBE_TEMPERATURE))
            .await
        {
            Ok(description) => description,
            Err(e) => {
                error!(error = %e, "Semantic description generation failed");
                DESCRIPTION_ERROR.to_string()
            }
        }
    }
}
