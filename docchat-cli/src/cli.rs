//! Argument definitions and environment-based configuration for `docchat`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Asistente conversacional sobre tus documentos", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat over one collection (streams the reply as it arrives).
    Chat {
        /// Collection to answer from.
        #[arg(short, long)]
        collection: String,
        /// Existing conversation id to continue; omit to start a new one.
        #[arg(long)]
        conversation: Option<i64>,
    },
    /// Manage document collections.
    #[command(subcommand)]
    Collections(CollectionsCommand),
    /// Manage documents inside collections.
    #[command(subcommand)]
    Docs(DocsCommand),
    /// Manage stored conversations.
    #[command(subcommand)]
    Conversations(ConversationsCommand),
}

#[derive(Subcommand)]
pub enum CollectionsCommand {
    /// List collections, newest first.
    List,
    /// Create a named collection.
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a collection and all of its documents.
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum DocsCommand {
    /// List documents (all collections unless one is given).
    List {
        #[arg(short, long)]
        collection: Option<String>,
    },
    /// Ingest a plain-text file: generates its semantic description and stores it.
    Add {
        #[arg(short, long)]
        collection: String,
        /// Path to the text file to ingest.
        file: PathBuf,
        /// Title; defaults to the file name.
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Delete one document of a collection.
    Delete {
        #[arg(short, long)]
        collection: String,
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ConversationsCommand {
    /// List conversations, newest first.
    List,
    /// Print the full message history of a conversation.
    History { id: i64 },
    /// Delete a conversation with its messages and memory.
    Delete { id: i64 },
}

/// Database location from DOCCHAT_DB; a plain file path is fine.
pub fn database_url() -> String {
    std::env::var("DOCCHAT_DB").unwrap_or_else(|_| "docchat.db".to_string())
}
