//! Document repository: persistence and queries for collections and documents.
//!
//! Uses SqlitePoolManager and the models (CollectionRecord, DocumentRecord).
//! External: SQLite via sqlx; callers use create_collection/save_document/
//! list_documents etc.

use crate::error::StorageError;
use crate::models::{CollectionRecord, DocumentRecord};
use crate::sqlite_pool::SqlitePoolManager;
use chrono::Utc;
use tracing::info;

#[derive(Clone)]
pub struct DocumentRepository {
    pool_manager: SqlitePoolManager,
}

impl DocumentRepository {
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
        info!("Creating collection/document tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                semantic_description TEXT NOT NULL,
                filename TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Registers a new named collection. Duplicate names yield `AlreadyExists`.
    pub async fn create_collection(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO collections (name, description, created_at) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;

        info!(collection = %name, "Collection created");
        Ok(result.last_insert_rowid())
    }

    /// Lists collections, newest first.
    pub async fn list_collections(&self) -> Result<Vec<CollectionRecord>, StorageError> {
        let rows = sqlx::query_as::<_, CollectionRecord>(
            "SELECT id, name, description, created_at FROM collections ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.pool_manager.pool())
        .await?;
        Ok(rows)
    }

    /// Looks up a collection by name.
    pub async fn get_collection(&self, name: &str) -> Result<Option<CollectionRecord>, StorageError> {
        let row = sqlx::query_as::<_, CollectionRecord>(
            "SELECT id, name, description, created_at FROM collections WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(self.pool_manager.pool())
        .await?;
        Ok(row)
    }

    /// Deletes a collection and all of its documents.
    pub async fn delete_collection(&self, id: i64) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        let name: Option<(String,)> = sqlx::query_as("SELECT name FROM collections WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        let Some((name,)) = name else {
            return Err(StorageError::NotFound(format!("collection id {}", id)));
        };

        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(&name)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM collections WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(collection = %name, "Collection deleted");
        Ok(())
    }

    /// Stores a document in a collection with its semantic description.
    pub async fn save_document(
        &self,
        collection: &str,
        title: &str,
        content: &str,
        semantic_description: &str,
        filename: Option<&str>,
    ) -> Result<i64, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, title, content, semantic_description, filename, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(collection)
        .bind(title)
        .bind(content)
        .bind(semantic_description)
        .bind(filename)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;

        info!(collection = %collection, title = %title, "Document saved");
        Ok(result.last_insert_rowid())
    }

    /// Lists documents, newest first. `None` means across all collections.
    pub async fn list_documents(
        &self,
        collection: Option<&str>,
    ) -> Result<Vec<DocumentRecord>, StorageError> {
        let rows = match collection {
            Some(name) => {
                sqlx::query_as::<_, DocumentRecord>(
                    r#"
                    SELECT id, collection, title, content, semantic_description, filename, created_at
                    FROM documents WHERE collection = ? ORDER BY created_at DESC, id DESC
                    "#,
                )
                .bind(name)
                .fetch_all(self.pool_manager.pool())
                .await?
            }
            None => {
                sqlx::query_as::<_, DocumentRecord>(
                    r#"
                    SELECT id, collection, title, content, semantic_description, filename, created_at
                    FROM documents ORDER BY created_at DESC, id DESC
                    "#,
                )
                .fetch_all(self.pool_manager.pool())
                .await?
            }
        };
        Ok(rows)
    }

    /// Deletes one document of a collection.
    pub async fn delete_document(&self, collection: &str, doc_id: i64) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(doc_id)
            .execute(self.pool_manager.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "document {} in collection {}",
                doc_id, collection
            )));
        }
        Ok(())
    }
}
