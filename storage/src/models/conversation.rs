//! Conversation model for persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationRecord {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}
