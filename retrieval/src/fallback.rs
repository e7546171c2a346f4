//! Deterministic lexical ranking used when the LLM path is unavailable.
//!
//! Pure function of the query and document set: same inputs, same scores,
//! same order. Runs fully offline.

use crate::types::RankedCandidate;
use crate::RELEVANCE_FLOOR;
use storage::DocumentRecord;

/// Weight per query word found in the document content.
const CONTENT_WORD_WEIGHT: f64 = 0.15;
/// Weight per query word found in the semantic description.
const DESCRIPTION_WORD_WEIGHT: f64 = 0.10;
/// Bonus when the content contains the query as an exact substring.
const EXACT_PHRASE_BONUS: f64 = 0.30;

/// Ranks `documents` against `query` lexically.
///
/// Per document: `relevance = 0.15 * content word hits + 0.10 * description
/// word hits + 0.30 exact-phrase bonus`, then `score = clamp(0.5 + relevance,
/// 0.3, 1.0)`. Only documents at or above the relevance floor survive,
/// ordered by score descending (stable for equal scores).
pub fn fallback_rank(query: &str, documents: &[DocumentRecord]) -> Vec<RankedCandidate> {
    let query_lower = query.to_lowercase();
    let query_words: Vec<&str> = query_lower.split_whitespace().collect();

    let mut candidates: Vec<RankedCandidate> = documents
        .iter()
        .filter_map(|doc| {
            let content = doc.content.to_lowercase();
            let description = doc.semantic_description.to_lowercase();

            let content_matches = query_words.iter().filter(|w| content.contains(**w)).count();
            let description_matches = query_words
                .iter()
                .filter(|w| description.contains(**w))
                .count();

            let phrase_bonus = if content.contains(&query_lower) {
                EXACT_PHRASE_BONUS
            } else {
                0.0
            };

            let relevance = content_matches as f64 * CONTENT_WORD_WEIGHT
                + description_matches as f64 * DESCRIPTION_WORD_WEIGHT
                + phrase_bonus;
            let score = (0.5 + relevance).clamp(0.3, 1.0);

            (score >= RELEVANCE_FLOOR).then(|| RankedCandidate {
                doc_id: doc.id.to_string(),
                score,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(id: i64, content: &str, description: &str) -> DocumentRecord {
        DocumentRecord {
            id,
            collection: "manuales".to_string(),
            title: format!("Documento {id}"),
            content: content.to_string(),
            semantic_description: description.to_string(),
            filename: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn deterministic_across_invocations() {
        let docs = vec![
            doc(1, "mantenimiento preventivo de equipos", "manual de mantenimiento"),
            doc(2, "política de vacaciones", "recursos humanos"),
        ];
        let first = fallback_rank("mantenimiento de equipos", &docs);
        let second = fallback_rank("mantenimiento de equipos", &docs);
        assert_eq!(first, second);
    }

    #[test]
    fn all_scores_respect_the_floor() {
        let docs = vec![
            doc(1, "mantenimiento de equipos industriales", "manual técnico"),
            doc(2, "sin relación alguna", "otro tema"),
        ];
        for candidate in fallback_rank("mantenimiento de equipos", &docs) {
            assert!(candidate.score >= RELEVANCE_FLOOR);
        }
    }

    #[test]
    fn exact_phrase_scores_higher_than_word_overlap_alone() {
        // Same word hits in both; only doc 1 contains the query verbatim.
        let docs = vec![
            doc(1, "el plazo de garantía es de dos años", "contrato"),
            doc(2, "garantía: el plazo vigente es de dos años", "contrato"),
        ];
        let ranked = fallback_rank("plazo de garantía", &docs);
        let with_phrase = ranked.iter().find(|c| c.doc_id == "1").unwrap();
        let without_phrase = ranked.iter().find(|c| c.doc_id == "2").unwrap();

        // The bonus is worth the full 0.30 except where the 1.0 ceiling cuts it.
        let expected = (without_phrase.score + EXACT_PHRASE_BONUS).min(1.0);
        assert!(with_phrase.score >= expected - 1e-9);
        assert_eq!(ranked[0].doc_id, "1");
    }

    #[test]
    fn irrelevant_documents_are_dropped() {
        let docs = vec![doc(1, "nada que ver", "otro asunto totalmente distinto")];
        assert!(fallback_rank("mantenimiento preventivo", &docs).is_empty());
    }

    #[test]
    fn ordering_is_score_descending() {
        let docs = vec![
            doc(1, "garantía", "condiciones de garantía"),
            doc(2, "la garantía cubre el plazo completo de garantía", "garantía y plazo"),
        ];
        let ranked = fallback_rank("plazo de garantía", &docs);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
