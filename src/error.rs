//! Error types for the mention graph pipeline.
//!
//! Malformed names and degenerate graphs are not errors: they are dropped or
//! yield empty results. Only caller bugs (bad configuration) and unreadable
//! input surface here.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type for pipeline operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// Configuration rejected before any processing started.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input could not be interpreted as a batch of articles.
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Alias matcher could not be built.
    #[error("Alias matcher error: {0}")]
    Matcher(#[from] aho_corasick::BuildError),
}

impl PipelineError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
