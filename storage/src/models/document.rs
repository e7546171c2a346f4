//! Document model for persistence.
//!
//! Maps to the `documents` table. Immutable after creation except deletion;
//! the retriever only reads these records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentRecord {
    pub id: i64,
    pub collection: String,
    pub title: String,
    pub content: String,
    /// LLM-generated semantic description used as the retrieval surrogate for full content.
    pub semantic_description: String,
    /// Source filename when the document was ingested from a file.
    pub filename: Option<String>,
    pub created_at: DateTime<Utc>,
}
