//! Retrieval crate: selects and scores the documents relevant to a query.
//!
//! The primary path asks the LLM to rank every document of the active
//! collection over its semantic descriptions; when that call fails, returns
//! malformed output, or leaves no candidate above the relevance floor, a
//! deterministic lexical fallback takes over. Callers always get a usable
//! list: either real matches or the single sentinel result.
//!
//! ## Modules
//!
//! - [`types`] – RetrievalResult, RankedCandidate, sentinel helpers
//! - [`fallback`] – pure lexical scoring, no network involved
//! - [`retriever`] – the Retriever itself

mod fallback;
mod retriever;
mod types;

pub use fallback::fallback_rank;
pub use llm_client::{parse_with_fallback, ParseError};
pub use retriever::Retriever;
pub use types::{
    is_sentinel_list, DocumentMeta, RankedCandidate, RetrievalResult, SENTINEL_CONTENT,
    SENTINEL_DOC_ID,
};

/// Minimum relevance score a candidate must reach to be returned at all.
/// This is a hard floor on both ranking paths, not a tie-break.
pub const RELEVANCE_FLOOR: f64 = 0.6;
