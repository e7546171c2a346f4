//! Storage crate: SQLite persistence for collections, documents, conversations,
//! messages, and per-conversation memory blobs.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – CollectionRecord, DocumentRecord, ConversationRecord, MessageRecord, MemoryType
//! - [`document_repo`] – DocumentRepository (collections + documents)
//! - [`conversation_repo`] – ConversationRepository (conversations, messages, memory)
//! - [`sqlite_pool`] – SqlitePoolManager

mod conversation_repo;
mod document_repo;
mod error;
mod models;
mod sqlite_pool;

pub use conversation_repo::ConversationRepository;
pub use document_repo::DocumentRepository;
pub use error::StorageError;
pub use models::{
    CollectionRecord, ConversationRecord, DocumentRecord, MemoryType, MessageRecord,
};
pub use sqlite_pool::SqlitePoolManager;
