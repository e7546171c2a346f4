//! Collection metadata model.
//!
//! Maps to the `collections` table and is used by DocumentRepository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, independently stored set of documents.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CollectionRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
