//! Memory slot discriminator for the `conversation_memory` table.

/// The two memory slots a conversation carries: durable personal facts and
/// the rolling interaction-summary log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryType {
    Personal,
    Conversation,
}

impl MemoryType {
    /// Value stored in the `memory_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Personal => "personal",
            MemoryType::Conversation => "conversation",
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
