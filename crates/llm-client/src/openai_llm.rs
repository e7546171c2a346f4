//! OpenAI implementation of [`LlmClient`]: wraps openai-client.

use anyhow::Result;
use async_trait::async_trait;
use openai_client::StreamChunk as OpenAIStreamChunk;
use prompt::ChatMessage;
use tracing::instrument;

use super::{to_openai_messages, CompletionOptions, LlmClient, StreamChunk, StreamChunkCallback};

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// LlmClient implementation backed by openai-client.
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: openai_client::OpenAIClient,
    model: String,
}

impl OpenAILlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::new(api_key),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: openai_client::OpenAIClient::with_base_url(api_key, base_url),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, messages))]
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String> {
        let openai_messages = to_openai_messages(&messages)?;
        self.client
            .chat_completion(&self.model, openai_messages, options)
            .await
    }

    #[instrument(skip(self, messages, callback))]
    async fn complete_stream(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
        callback: &mut StreamChunkCallback,
    ) -> Result<String> {
        let openai_messages = to_openai_messages(&messages)?;
        self.client
            .chat_completion_stream(
                &self.model,
                openai_messages,
                options,
                |chunk: OpenAIStreamChunk| {
                    callback(StreamChunk {
                        content: chunk.content,
                        done: chunk.done,
                    })
                },
            )
            .await
            .map_err(|e| anyhow::anyhow!("Stream error: {}", e))
    }
}
