//! Error types for the research pipeline.
//!
//! Expected conditions (off-topic questions, missing context, tool failures)
//! are answered with a [`Response`](crate::state::Response), never an error.
//! `PipelineError` is reserved for internal faults.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// An internal invariant of the reasoning state was violated.
    #[error("Reasoning state invariant violated: {0}")]
    StateInvariant(String),

    /// The tool registry could not be built.
    #[error("Tool registry error: {0}")]
    Registry(#[from] crate::tools::ToolError),

    /// Configuration rejected at pipeline construction.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
