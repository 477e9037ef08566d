//! Error types for the wellness assistant.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! language-model, literature search, parsing and prompt errors.

use thiserror::Error;

/// Unified error type for the wellness assistant.
///
/// Library functions return `Result<T, AppError>`. Recoverable failures are
/// handled where the pipeline allows degrading; everything else propagates.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors (transport, non-2xx, malformed payload)
    #[error("LLM error: {0}")]
    Llm(String),

    /// A credential needed for a model call is not configured
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Literature search (esearch) failures
    #[error("Search error: {0}")]
    Search(String),

    /// Literature record fetch (efetch) failures
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Record parsing errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Caller supplied input the pipeline cannot process
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error is a missing credential, which is never recovered.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, AppError::MissingCredential(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
