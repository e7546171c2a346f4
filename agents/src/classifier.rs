//! Document-vs-personal query classification.

use std::sync::Arc;

use llm_client::{CompletionOptions, LlmClient};
use prompt::{build_classification_prompt, ChatMessage, CLASSIFY_SYSTEM};
use tracing::{info, warn};

/// Temperature for the classification call; the answer is one word.
const CLASSIFY_TEMPERATURE: f32 = 0.0;
const CLASSIFY_MAX_TOKENS: u32 = 5;

/// Decides whether a query needs document retrieval.
///
/// Fails open: on any upstream error or unrecognizable reply the query is
/// treated as a document query, since running retrieval needlessly is less
/// harmful than silently skipping it.
pub struct QueryClassifier {
    llm: Arc<dyn LlmClient>,
}

impl QueryClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// True when the query should go through retrieval.
    pub async fn is_document_query(&self, query: &str) -> bool {
        let messages = vec![
            ChatMessage::system(CLASSIFY_SYSTEM),
            ChatMessage::user(build_classification_prompt(query)),
        ];
        let options =
            CompletionOptions::new(CLASSIFY_TEMPERATURE).with_max_tokens(CLASSIFY_MAX_TOKENS);

        match self.llm.complete(messages, options).await {
            Ok(reply) => {
                let verdict = reply.trim().to_uppercase();
                let is_document = if verdict.starts_with("NO") {
                    false
                } else if verdict.starts_with("SI") || verdict.starts_with("SÍ") {
                    true
                } else {
                    warn!(reply = %reply, "Unrecognizable classification reply, assuming document query");
                    true
                };
                info!(is_document = is_document, "Query classified");
                is_document
            }
            Err(e) => {
                warn!(error = %e, "Classification call failed, assuming document query");
                true
            }
        }
    }
}
