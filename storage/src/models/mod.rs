//! Data models for the storage crate.

mod collection;
mod conversation;
mod document;
mod memory_type;
mod message;

pub use collection::CollectionRecord;
pub use conversation::ConversationRecord;
pub use document::DocumentRecord;
pub use memory_type::MemoryType;
pub use message::MessageRecord;
