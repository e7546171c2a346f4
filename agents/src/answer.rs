//! The uniform answer shape returned for every turn, plus citation
//! reconciliation over the generated text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A completed turn: reply text, the references actually cited, and the
/// stage timing metrics. Serialized as-is into the message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub response: String,
    /// `"[n] <title>"` lines, ordinal order, only ordinals cited in `response`.
    pub references: Vec<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, String>,
}

impl Answer {
    /// Decodes a persisted message body. Returns None for plain-text (legacy)
    /// messages, which callers render verbatim.
    pub fn from_stored(content: &str) -> Option<Self> {
        serde_json::from_str(content).ok()
    }

    /// Encodes for persistence in the message history.
    pub fn to_stored(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Restricts the offered references to ordinals whose `[n]` marker actually
/// appears in the generated text.
///
/// `offered` is the (ordinal, title) map handed to the model, in ordinal
/// order. An ordinal the model ignored must not be reported, otherwise the
/// answer would claim sources it never used.
pub(crate) fn reconcile_citations(response: &str, offered: &[(usize, String)]) -> Vec<String> {
    offered
        .iter()
        .filter(|(ordinal, _)| response.contains(&format!("[{ordinal}]")))
        .map(|(ordinal, title)| format!("[{ordinal}] {title}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offered() -> Vec<(usize, String)> {
        vec![
            (1, "Manual de uso".to_string()),
            (2, "Contrato marco".to_string()),
            (3, "Acta de reunión".to_string()),
        ]
    }

    #[test]
    fn only_cited_ordinals_survive() {
        let response = "Según el manual [1], el plazo es de dos años [3].";
        let references = reconcile_citations(response, &offered());
        assert_eq!(
            references,
            vec!["[1] Manual de uso", "[3] Acta de reunión"]
        );
    }

    #[test]
    fn unused_offer_yields_no_references() {
        let references = reconcile_citations("No encontré esa información.", &offered());
        assert!(references.is_empty());
    }

    #[test]
    fn ordinal_matching_is_literal_brackets() {
        // "1" appearing outside brackets does not count as a citation.
        let references = reconcile_citations("El artículo 1 no aplica. Ver [2].", &offered());
        assert_eq!(references, vec!["[2] Contrato marco"]);
    }

    #[test]
    fn stored_roundtrip_and_plain_fallback() {
        let answer = Answer {
            response: "hola [1]".to_string(),
            references: vec!["[1] Manual".to_string()],
            metrics: BTreeMap::from([("tipo".to_string(), "Respuesta Documental".to_string())]),
        };
        let stored = answer.to_stored().unwrap();
        let decoded = Answer::from_stored(&stored).unwrap();
        assert_eq!(decoded.response, "hola [1]");
        assert_eq!(decoded.references.len(), 1);

        assert!(Answer::from_stored("un mensaje antiguo en texto plano").is_none());
    }
}
