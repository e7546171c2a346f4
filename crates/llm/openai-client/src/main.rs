//! Smoke binary: sends one chat completion against the configured endpoint.

use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use anyhow::Context;
use openai_client::{CompletionOptions, OpenAIClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
    let client = match std::env::var("OPENAI_BASE_URL") {
        Ok(base_url) => OpenAIClient::with_base_url(api_key, base_url),
        Err(_) => OpenAIClient::new(api_key),
    };

    let messages = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content("Eres un asistente amable.")
            .build()?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content("Hola, ¿cómo estás?")
            .build()?
            .into(),
    ];

    let response = client
        .chat_completion("gpt-4o-mini", messages, CompletionOptions::default())
        .await?;
    println!("{response}");

    Ok(())
}
