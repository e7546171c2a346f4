//! Conversation repository: conversations, ordered message history, and the
//! two-slot memory blob per conversation.
//!
//! Memory writes use a single atomic upsert keyed by
//! (conversation_id, memory_type), so at most one current blob exists per
//! slot even under a future concurrent deployment.

use crate::error::StorageError;
use crate::models::{ConversationRecord, MemoryType, MessageRecord};
use crate::sqlite_pool::SqlitePoolManager;
use chrono::{Local, Utc};
use tracing::info;

#[derive(Clone)]
pub struct ConversationRepository {
    pool_manager: SqlitePoolManager,
}

impl ConversationRepository {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        Self::with_pool(pool_manager).await
    }

    /// Builds a repository over an existing pool (shared with other repositories).
    pub async fn with_pool(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating conversation tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (conversation_id) REFERENCES conversations (id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_memory (
                conversation_id INTEGER NOT NULL,
                memory_type TEXT NOT NULL,
                memory_data TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (conversation_id, memory_type)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Creates a conversation; the default title carries the current date.
    pub async fn create_conversation(&self, title: Option<&str>) -> Result<i64, StorageError> {
        let title = match title {
            Some(t) => t.to_string(),
            None => format!("Conversación {}", Local::now().format("%d/%m/%Y")),
        };

        let result =
            sqlx::query("INSERT INTO conversations (title, created_at) VALUES (?, ?)")
                .bind(&title)
                .bind(Utc::now())
                .execute(self.pool_manager.pool())
                .await?;

        let id = result.last_insert_rowid();
        info!(conversation_id = id, title = %title, "Conversation created");
        Ok(id)
    }

    /// Lists conversations, newest first.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationRecord>, StorageError> {
        let rows = sqlx::query_as::<_, ConversationRecord>(
            "SELECT id, title, created_at FROM conversations ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool_manager.pool())
        .await?;
        Ok(rows)
    }

    /// Appends a message to a conversation's history.
    pub async fn save_message(
        &self,
        conversation_id: i64,
        role: &str,
        content: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO messages (conversation_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(role)
        .bind(content)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;
        Ok(())
    }

    /// Returns the ordered message history of a conversation.
    pub async fn get_messages(
        &self,
        conversation_id: i64,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let rows = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages WHERE conversation_id = ? ORDER BY id
            "#,
        )
        .bind(conversation_id)
        .fetch_all(self.pool_manager.pool())
        .await?;
        Ok(rows)
    }

    /// Deletes a conversation, cascading to its messages and memory blobs.
    pub async fn delete_conversation(&self, conversation_id: i64) -> Result<(), StorageError> {
        let mut tx = self.pool_manager.pool().begin().await?;

        sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM conversation_memory WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(conversation_id = conversation_id, "Conversation deleted");
        Ok(())
    }

    /// Fetches one memory blob, or None when the slot was never written.
    pub async fn get_memory(
        &self,
        conversation_id: i64,
        memory_type: MemoryType,
    ) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT memory_data FROM conversation_memory WHERE conversation_id = ? AND memory_type = ?",
        )
        .bind(conversation_id)
        .bind(memory_type.as_str())
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(row.map(|(data,)| data))
    }

    /// Upserts one memory blob atomically (insert-or-replace in a single statement).
    pub async fn save_memory(
        &self,
        conversation_id: i64,
        memory_type: MemoryType,
        memory_data: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO conversation_memory (conversation_id, memory_type, memory_data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (conversation_id, memory_type)
            DO UPDATE SET memory_data = excluded.memory_data, updated_at = excluded.updated_at
            "#,
        )
        .bind(conversation_id)
        .bind(memory_type.as_str())
        .bind(memory_data)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;
        Ok(())
    }

    /// Drops both memory slots of a conversation.
    pub async fn delete_memory(&self, conversation_id: i64) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM conversation_memory WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(self.pool_manager.pool())
            .await?;
        Ok(())
    }
}
