//! Error types for tool invocations.

use thiserror::Error;

/// Errors a tool can report. All of them are recoverable from the pipeline's
/// point of view; criticality depends on the capability, not the error.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Remote service returned an error response (4xx, 5xx).
    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Response doesn't match the expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Operation not supported by this tool implementation.
    #[error("'{0}' is not supported by this tool")]
    Unsupported(String),

    /// Referenced document could not be found.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Tool configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ToolError {
    pub fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            ToolError::Timeout(timeout_ms)
        } else {
            ToolError::Network(e.to_string())
        }
    }
}
