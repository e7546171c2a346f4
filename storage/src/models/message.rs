//! Message model for persistence.
//!
//! Maps to the `messages` table. `content` is either plain text (user turns,
//! legacy rows) or a JSON-encoded structured answer; decoding is the caller's
//! concern so that storage stays schema-agnostic about answer shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: i64,
    pub conversation_id: i64,
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
