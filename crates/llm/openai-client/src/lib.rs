//! # OpenAI API client
//!
//! Thin wrapper around [async-openai] for chat completion, non-stream and
//! stream. Every call carries [`CompletionOptions`] because the agents use
//! different sampling settings per task (ranking runs cold, synthesis warmer).
//! API keys never reach the logs unmasked.

use async_openai::{types::CreateChatCompletionRequestArgs, Client};
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};

/// Interval between stream callback flushes.
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Masks an API key for logging: first 7 characters, `***`, last 4. Anything
/// of length 11 or less is reduced to `***` outright so no segment leaks.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 11 {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[token.len() - 4..])
}

/// Per-call sampling options for chat completion requests.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    /// Sampling temperature passed to the API.
    pub temperature: f32,
    /// Optional completion token cap; None lets the API default apply.
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: None,
        }
    }
}

impl CompletionOptions {
    pub fn new(temperature: f32) -> Self {
        Self {
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A batch of streamed completion content and whether the stream is finished.
pub struct StreamChunk {
    /// Text accumulated since the previous callback. May be empty on the
    /// final chunk when everything was already flushed mid-stream.
    pub content: String,
    /// True on the final chunk of the response.
    pub done: bool,
}

/// Accumulates stream deltas and decides when a callback flush is due.
/// Pure state; the caller performs the actual callback.
struct ChunkBatcher {
    pending: String,
    full: String,
    last_flush: Instant,
    done_sent: bool,
}

impl ChunkBatcher {
    fn new() -> Self {
        Self {
            pending: String::new(),
            full: String::new(),
            last_flush: Instant::now(),
            done_sent: false,
        }
    }

    fn push(&mut self, delta: &str) {
        self.pending.push_str(delta);
        self.full.push_str(delta);
    }

    /// Returns the pending batch when the flush interval elapsed, or the
    /// final batch when the stream finished. Intermediate flushes are never
    /// empty; the `done` chunk is emitted exactly once even when nothing is
    /// pending, so every consumer observes the completion event.
    fn take_due(&mut self, finished: bool) -> Option<StreamChunk> {
        if finished {
            if self.done_sent {
                return None;
            }
            self.done_sent = true;
            return Some(StreamChunk {
                content: std::mem::take(&mut self.pending),
                done: true,
            });
        }
        if self.last_flush.elapsed() < FLUSH_INTERVAL || self.pending.is_empty() {
            return None;
        }
        self.last_flush = Instant::now();
        Some(StreamChunk {
            content: std::mem::take(&mut self.pending),
            done: false,
        })
    }

    fn into_full_text(self) -> String {
        self.full
    }
}

/// OpenAI chat client over a shared [async-openai] client.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Arc<Client<async_openai::config::OpenAIConfig>>,
    /// Kept only so requests can log the masked key.
    api_key_for_logging: String,
}

impl OpenAIClient {
    /// Builds a client against the default API base URL.
    pub fn new(api_key: String) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key.clone());
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key_for_logging: api_key,
        }
    }

    /// Builds a client against a custom base URL (proxies, compatible endpoints).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let config = async_openai::config::OpenAIConfig::new()
            .with_api_key(api_key.clone())
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            api_key_for_logging: api_key,
        }
    }

    fn build_request(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        options: CompletionOptions,
        kind: &str,
    ) -> anyhow::Result<async_openai::types::CreateChatCompletionRequest> {
        tracing::info!(
            model = %model,
            message_count = messages.len(),
            temperature = options.temperature,
            api_key = %mask_token(&self.api_key_for_logging),
            "OpenAI {} request",
            kind
        );

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(model)
            .messages(messages)
            .temperature(options.temperature);
        if let Some(max_tokens) = options.max_tokens {
            args.max_tokens(max_tokens);
        }
        let request = args.build()?;

        if let Ok(json) = serde_json::to_string_pretty(&request) {
            tracing::debug!(request_json = %json, "OpenAI request JSON");
        }
        Ok(request)
    }

    /// Sends a chat completion request and returns the full assistant reply.
    ///
    /// Returns the first choice's content, or an error when the response
    /// carries no choices.
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        options: CompletionOptions,
    ) -> anyhow::Result<String> {
        let request = self.build_request(model, messages, options, "chat_completion")?;

        let response = self.client.chat().create(request).await?;
        if let Some(usage) = &response.usage {
            log_usage(usage.prompt_tokens, usage.completion_tokens, usage.total_tokens);
        }

        match response.choices.first() {
            Some(choice) => Ok(choice.message.content.clone().unwrap_or_default()),
            None => anyhow::bail!("No response from OpenAI"),
        }
    }

    /// Streams a chat completion, invoking `callback` roughly once per second
    /// (and on finish) with the content accumulated since the last call.
    /// Returns the full concatenated reply; stream errors propagate.
    pub async fn chat_completion_stream<F, Fut>(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        options: CompletionOptions,
        mut callback: F,
    ) -> anyhow::Result<String>
    where
        F: FnMut(StreamChunk) -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<()>>,
    {
        let request = self.build_request(model, messages, options, "chat_completion_stream")?;
        let mut stream = self.client.chat().create_stream(request).await?;
        let mut batcher = ChunkBatcher::new();

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| anyhow::anyhow!("Stream error: {}", e))?;

            // Usage typically arrives on the last chunk.
            if let Some(usage) = &chunk.usage {
                log_usage(usage.prompt_tokens, usage.completion_tokens, usage.total_tokens);
            }

            let Some(choice) = chunk.choices.first() else {
                continue;
            };
            if let Some(content) = &choice.delta.content {
                batcher.push(content);
            }
            if let Some(batch) = batcher.take_due(choice.finish_reason.is_some()) {
                callback(batch).await?;
            }
        }

        // Whatever the finish chunk left behind still has to reach the caller.
        if let Some(batch) = batcher.take_due(true) {
            callback(batch).await?;
        }

        Ok(batcher.into_full_text())
    }
}

fn log_usage(prompt_tokens: u32, completion_tokens: u32, total_tokens: u32) {
    tracing::info!(
        prompt_tokens = prompt_tokens,
        completion_tokens = completion_tokens,
        total_tokens = total_tokens,
        "OpenAI completion usage"
    );
}
