//! # Memory
//!
//! Layered conversational memory for one conversation at a time:
//!
//! - **Personal facts** – durable key→value data the user has disclosed
//!   ("nombre" → "Juan"). Merged key-wise on every update, never replaced
//!   wholesale, unbounded.
//! - **Interaction summaries** – one-sentence rolling log of recent turns,
//!   bounded to the last five (FIFO eviction).
//!
//! Both layers live in the `conversation_memory` table via
//! [`storage::ConversationRepository`] and are written through synchronously
//! after every mutation. Load failures degrade to empty state; save failures
//! propagate, since silent loss of a successful turn is worse than a visible
//! error.

mod manager;

pub use manager::MemoryManager;

/// Maximum number of interaction summaries retained (oldest evicted first).
pub const MAX_SUMMARIES: usize = 5;

/// Number of recent summaries rendered into prompt context.
pub const CONTEXT_SUMMARIES: usize = 3;
