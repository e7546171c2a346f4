//! Result types produced per query. Ephemeral; nothing here is persisted.

use serde::{Deserialize, Serialize};

/// Doc id of the sentinel result meaning "no relevant context available".
pub const SENTINEL_DOC_ID: &str = "0";

/// User-facing content carried by the sentinel result.
pub const SENTINEL_CONTENT: &str =
    "Lo siento, no encontré documentos relevantes para responder tu consulta.";

/// An intermediate `{doc_id, score}` pair out of either ranking path.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub doc_id: String,
    /// Relevance in [0, 1]; already clamped by the producer.
    pub score: f64,
}

/// Metadata attached to a retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: String,
}

/// One selected document with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub doc_id: String,
    pub content: String,
    pub relevance_score: f64,
    pub metadata: DocumentMeta,
}

impl RetrievalResult {
    /// The singleton "no relevant documents" marker. A result list is either
    /// exactly this one element or contains no sentinel at all.
    pub fn sentinel() -> Self {
        Self {
            doc_id: SENTINEL_DOC_ID.to_string(),
            content: SENTINEL_CONTENT.to_string(),
            relevance_score: 0.0,
            metadata: DocumentMeta {
                title: "Sin resultados".to_string(),
            },
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.doc_id == SENTINEL_DOC_ID
    }
}

/// True when `results` is the singleton sentinel list.
pub fn is_sentinel_list(results: &[RetrievalResult]) -> bool {
    results.len() == 1 && results[0].is_sentinel()
}
