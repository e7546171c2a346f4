//! # LLM client abstraction
//!
//! The [`LlmClient`] trait behind which every model call in the system sits,
//! plus its OpenAI implementation. Retrieval, memory, and the agents depend
//! only on this crate, never on the transport below it.
//!
//! The stream method takes a boxed callback instead of a generic parameter so
//! the trait stays object-safe and can be shared as `Arc<dyn LlmClient>`.

use anyhow::Result;
use async_trait::async_trait;
use prompt::{ChatMessage, MessageRole};
use std::future::Future;
use std::pin::Pin;

mod config;
mod openai_llm;
mod parse;

pub use config::EnvLlmConfig;
pub use openai_client::CompletionOptions;
pub use openai_llm::OpenAILlmClient;
pub use parse::{parse_with_fallback, ParseError};

/// A chunk of streamed LLM output; mirrors `openai_client::StreamChunk`.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub content: String,
    pub done: bool,
}

/// Type-erased stream callback, required for `dyn LlmClient`.
pub type StreamChunkCallback =
    dyn FnMut(StreamChunk) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send;

/// A chat model: one-shot completion or streamed completion over a message list.
///
/// `options` carries per-call temperature and token cap; callers choose them
/// per task (ranking runs cold at 0.1, synthesis at 0.3).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the full reply text for the given messages.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String>;

    /// Streamed completion: invokes `callback` per chunk, returns the full reply.
    async fn complete_stream(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
        callback: &mut StreamChunkCallback,
    ) -> Result<String>;
}

/// Maps our role/content messages onto the OpenAI request message types.
fn to_openai_messages(
    messages: &[ChatMessage],
) -> Result<Vec<openai_client::ChatCompletionRequestMessage>> {
    use openai_client::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs,
    };

    messages
        .iter()
        .map(|msg| {
            let content = msg.content.clone();
            let converted = match msg.role {
                MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(content)
                    .build()?
                    .into(),
                MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(content)
                    .build()?
                    .into(),
                MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content)
                    .build()?
                    .into(),
            };
            Ok(converted)
        })
        .collect()
}
