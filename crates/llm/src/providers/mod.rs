//! Concrete LLM provider clients.

pub mod gemini;
pub mod ollama;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

use wellness_core::AppError;

/// Map a reqwest transport error to an `AppError::Llm`, naming timeouts.
///
/// The request URL is dropped from the message; it may carry credentials.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> AppError {
    let err = err.without_url();
    if err.is_timeout() {
        AppError::Llm(format!("{} request timed out: {}", provider, err))
    } else {
        AppError::Llm(format!("Failed to send request to {}: {}", provider, err))
    }
}
