//! LLM configuration loaded from environment variables.

use anyhow::{Context, Result};
use std::env;

use crate::OpenAILlmClient;

/// LLM config for OpenAI-compatible APIs, loaded from the environment.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub model: String,
}

impl EnvLlmConfig {
    /// Load from environment variables: OPENAI_API_KEY (required),
    /// OPENAI_BASE_URL (optional), MODEL (default gpt-4o-mini).
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        let openai_base_url = env::var("OPENAI_BASE_URL").ok().filter(|s| !s.is_empty());
        let model = env::var("MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        Ok(Self {
            openai_api_key,
            openai_base_url,
            model,
        })
    }

    /// Builds the OpenAI client described by this config.
    pub fn build_client(&self) -> OpenAILlmClient {
        let client = match &self.openai_base_url {
            Some(base_url) => {
                OpenAILlmClient::with_base_url(self.openai_api_key.clone(), base_url.clone())
            }
            None => OpenAILlmClient::new(self.openai_api_key.clone()),
        };
        client.with_model(self.model.clone())
    }
}
