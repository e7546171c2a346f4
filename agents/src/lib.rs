//! # Agents
//!
//! The decision layer of the assistant: classifies each query, routes it
//! through the personal or document branch, synthesizes a cited answer, and
//! keeps conversational memory up to date.
//!
//! ## Modules
//!
//! - [`answer`] – the uniform `Answer` shape and citation reconciliation
//! - [`classifier`] – document-vs-personal query classification
//! - [`describer`] – semantic description generation for ingested documents
//! - [`metrics`] – wall-clock stage timing for observability
//! - [`orchestrator`] – the per-turn state machine

mod answer;
mod classifier;
mod describer;
mod metrics;
mod orchestrator;

pub use answer::Answer;
pub use classifier::QueryClassifier;
pub use describer::{DescriptionGenerator, DESCRIPTION_ERROR};
pub use metrics::TurnMetrics;
pub use orchestrator::{Orchestrator, SessionContext, NO_CONTEXT_APOLOGY, NO_DATABASE_SELECTED};
