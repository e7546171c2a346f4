//! # docchat-cli
//!
//! Base CLI foundation: argument parsing, config loading. No LLM logic.

pub mod cli;

pub use cli::{database_url, Cli, Commands, CollectionsCommand, ConversationsCommand, DocsCommand};
