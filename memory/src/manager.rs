//! The memory manager itself: load, mutate, render, persist.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use llm_client::{parse_with_fallback, CompletionOptions, LlmClient};
use prompt::{build_fact_extraction_prompt, build_summary_prompt, ChatMessage};
use storage::{ConversationRepository, MemoryType};
use tracing::{info, warn};

use crate::{CONTEXT_SUMMARIES, MAX_SUMMARIES};

/// Temperature for summary and fact-extraction calls; both want terse output.
const MEMORY_TEMPERATURE: f32 = 0.1;
/// Token cap for the one-sentence summary.
const SUMMARY_MAX_TOKENS: u32 = 100;
/// Token cap for the fact-extraction JSON object.
const EXTRACTION_MAX_TOKENS: u32 = 200;

/// Maintains the two memory layers of the bound conversation.
///
/// Exactly one conversation is bound at a time; rebinding discards in-memory
/// state and reloads from storage, so two conversations' memories are never
/// merged.
pub struct MemoryManager {
    llm: Arc<dyn LlmClient>,
    store: ConversationRepository,
    conversation_id: Option<i64>,
    /// BTreeMap so rendered context is stable across runs.
    personal: BTreeMap<String, String>,
    /// Most recent last.
    summaries: Vec<String>,
}

impl MemoryManager {
    pub fn new(llm: Arc<dyn LlmClient>, store: ConversationRepository) -> Self {
        Self {
            llm,
            store,
            conversation_id: None,
            personal: BTreeMap::new(),
            summaries: Vec::new(),
        }
    }

    /// The currently bound conversation, if any.
    pub fn conversation_id(&self) -> Option<i64> {
        self.conversation_id
    }

    /// Binds a conversation, discarding any in-memory state and reloading
    /// both layers from storage.
    pub async fn bind(&mut self, conversation_id: i64) -> Result<()> {
        self.conversation_id = Some(conversation_id);
        self.personal.clear();
        self.summaries.clear();
        self.load(conversation_id).await;
        info!(
            conversation_id = conversation_id,
            facts = self.personal.len(),
            summaries = self.summaries.len(),
            "Memory loaded"
        );
        Ok(())
    }

    /// Loads both blobs; missing or corrupt data resets to empty defaults.
    async fn load(&mut self, conversation_id: i64) {
        match self.store.get_memory(conversation_id, MemoryType::Personal).await {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(facts) => self.personal = facts,
                Err(e) => warn!(error = %e, "Corrupt personal memory blob, resetting"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read personal memory, starting empty"),
        }

        match self
            .store
            .get_memory(conversation_id, MemoryType::Conversation)
            .await
        {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(summaries) => self.summaries = summaries,
                Err(e) => warn!(error = %e, "Corrupt conversation memory blob, resetting"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read conversation memory, starting empty"),
        }
    }

    /// Summarizes the turn in one sentence and appends it to the rolling log.
    ///
    /// A failed summary call leaves the log untouched (the turn is simply not
    /// remembered); a failed save propagates.
    pub async fn record_interaction(&mut self, query: &str, response: &str) -> Result<()> {
        let messages = vec![ChatMessage::user(build_summary_prompt(query, response))];
        let options =
            CompletionOptions::new(MEMORY_TEMPERATURE).with_max_tokens(SUMMARY_MAX_TOKENS);

        let summary = match self.llm.complete(messages, options).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Interaction summary failed, turn not recorded");
                return Ok(());
            }
        };
        if summary.is_empty() {
            return Ok(());
        }

        self.summaries.push(summary);
        if self.summaries.len() > MAX_SUMMARIES {
            let excess = self.summaries.len() - MAX_SUMMARIES;
            self.summaries.drain(..excess);
        }
        self.persist_summaries().await
    }

    /// Extracts newly disclosed personal facts from the turn and merges them
    /// key-wise into the personal layer (overwrite, no deep merge).
    ///
    /// Malformed extraction output means "no new facts"; it is logged, never
    /// raised.
    pub async fn extract_and_merge_personal_facts(
        &mut self,
        query: &str,
        response: &str,
    ) -> Result<()> {
        let messages = vec![ChatMessage::user(build_fact_extraction_prompt(query, response))];
        let options =
            CompletionOptions::new(MEMORY_TEMPERATURE).with_max_tokens(EXTRACTION_MAX_TOKENS);

        let reply = match self.llm.complete(messages, options).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Fact extraction call failed, no facts recorded");
                return Ok(());
            }
        };

        let facts: BTreeMap<String, String> = match parse_with_fallback(&reply) {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, "Fact extraction returned no usable JSON, ignoring");
                return Ok(());
            }
        };
        if facts.is_empty() {
            return Ok(());
        }

        info!(new_facts = facts.len(), "Merging personal facts");
        self.personal.extend(facts);
        self.persist_personal().await
    }

    /// Renders all personal facts plus the last three summaries as plain text
    /// for prompt injection.
    pub fn render_context(&self) -> String {
        let mut sections = Vec::new();
        let personal = self.render_personal();
        if !personal.is_empty() {
            sections.push(personal);
        }
        let recent = self.render_recent();
        if !recent.is_empty() {
            sections.push(recent);
        }
        sections.join("\n")
    }

    /// `"clave: valor"` lines, alphabetical by key.
    pub fn render_personal(&self) -> String {
        self.personal
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `"Interacción previa: <summary>"` lines for the last three summaries,
    /// oldest of the three first.
    pub fn render_recent(&self) -> String {
        let start = self.summaries.len().saturating_sub(CONTEXT_SUMMARIES);
        self.summaries[start..]
            .iter()
            .map(|summary| format!("Interacción previa: {summary}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Read access for tests and metrics.
    pub fn personal_facts(&self) -> &BTreeMap<String, String> {
        &self.personal
    }

    pub fn summaries(&self) -> &[String] {
        &self.summaries
    }

    fn bound_id(&self) -> Result<i64> {
        self.conversation_id
            .context("no conversation bound to the memory manager")
    }

    async fn persist_personal(&self) -> Result<()> {
        let id = self.bound_id()?;
        let blob = serde_json::to_string(&self.personal)?;
        self.store
            .save_memory(id, MemoryType::Personal, &blob)
            .await
            .context("failed to persist personal memory")?;
        Ok(())
    }

    async fn persist_summaries(&self) -> Result<()> {
        let id = self.bound_id()?;
        let blob = serde_json::to_string(&self.summaries)?;
        self.store
            .save_memory(id, MemoryType::Conversation, &blob)
            .await
            .context("failed to persist conversation memory")?;
        Ok(())
    }
}
