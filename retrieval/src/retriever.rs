//! LLM-backed document selection with deterministic degradation.

use std::collections::BTreeMap;
use std::sync::Arc;

use llm_client::{parse_with_fallback, CompletionOptions, LlmClient};
use prompt::{build_ranking_prompt, format_document_entry, ChatMessage, RANKING_SYSTEM};
use serde_json::Value;
use storage::DocumentRecord;
use tracing::{info, warn};

use crate::fallback::fallback_rank;
use crate::types::{DocumentMeta, RankedCandidate, RetrievalResult};
use crate::RELEVANCE_FLOOR;

/// Temperature for the ranking call; kept low so the model sticks to scoring.
const RANKING_TEMPERATURE: f32 = 0.1;
/// Token cap for the ranking call; the reply is a short JSON array.
const RANKING_MAX_TOKENS: u32 = 500;

/// Selects and scores the documents of a collection relevant to a query.
///
/// The LLM ranks every document over its semantic description; candidates
/// below the relevance floor are dropped. Any failure of that path — the
/// call itself, unparseable output, or zero survivors — degrades to
/// [`fallback_rank`], and an empty fallback degrades to the sentinel.
/// `select` therefore never errors.
pub struct Retriever {
    llm: Arc<dyn LlmClient>,
}

impl Retriever {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Returns the relevant subset of `documents` for `query`, best first.
    pub async fn select(&self, query: &str, documents: &[DocumentRecord]) -> Vec<RetrievalResult> {
        info!(document_count = documents.len(), "Selecting relevant documents");

        if documents.is_empty() {
            return vec![RetrievalResult::sentinel()];
        }

        // Index by stringified id; BTreeMap keeps the prompt order stable.
        let index: BTreeMap<String, &DocumentRecord> = documents
            .iter()
            .map(|doc| (doc.id.to_string(), doc))
            .collect();

        let candidates = match self.rank_with_llm(query, &index).await {
            Ok(ranked) if !ranked.is_empty() => ranked,
            Ok(_) => {
                warn!("LLM ranking left no candidate above the floor, using fallback");
                fallback_rank(query, documents)
            }
            Err(e) => {
                warn!(error = %e, "LLM ranking failed, using fallback");
                fallback_rank(query, documents)
            }
        };

        let results: Vec<RetrievalResult> = candidates
            .into_iter()
            .filter_map(|candidate| {
                index.get(&candidate.doc_id).map(|doc| RetrievalResult {
                    doc_id: candidate.doc_id,
                    content: doc.content.clone(),
                    relevance_score: candidate.score,
                    metadata: DocumentMeta {
                        title: doc.title.clone(),
                    },
                })
            })
            .collect();

        if results.is_empty() {
            // Nothing cleared the bar on either path: one unambiguous signal.
            return vec![RetrievalResult::sentinel()];
        }

        info!(selected = results.len(), "Documents selected");
        results
    }

    /// Primary path: ask the model to score all documents, then validate.
    async fn rank_with_llm(
        &self,
        query: &str,
        index: &BTreeMap<String, &DocumentRecord>,
    ) -> anyhow::Result<Vec<RankedCandidate>> {
        let mut formatted = String::new();
        for (doc_id, doc) in index {
            formatted.push_str(&format_document_entry(
                doc_id,
                &doc.title,
                &doc.semantic_description,
            ));
        }

        let messages = vec![
            ChatMessage::system(RANKING_SYSTEM),
            ChatMessage::user(build_ranking_prompt(query, &formatted)),
        ];
        let options =
            CompletionOptions::new(RANKING_TEMPERATURE).with_max_tokens(RANKING_MAX_TOKENS);

        let reply = self.llm.complete(messages, options).await?;
        let raw: Vec<Value> = parse_with_fallback(&reply)?;

        let mut candidates: Vec<RankedCandidate> = raw
            .iter()
            .filter_map(|element| validate_candidate(element, index))
            .collect();
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(candidates)
    }
}

/// Validates one ranking element: object shape, known doc_id, score coerced
/// into [0, 1] and at or above the floor. Malformed elements vanish silently.
fn validate_candidate(
    element: &Value,
    index: &BTreeMap<String, &DocumentRecord>,
) -> Option<RankedCandidate> {
    let object = element.as_object()?;

    let doc_id = match object.get("doc_id")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if doc_id.is_empty() || !index.contains_key(&doc_id) {
        return None;
    }

    let score = object.get("score")?.as_f64()?.clamp(0.0, 1.0);
    if score < RELEVANCE_FLOOR {
        return None;
    }

    Some(RankedCandidate { doc_id, score })
}
