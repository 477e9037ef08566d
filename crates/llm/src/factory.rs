//! LLM provider factory.
//!
//! Builds the configured client once at startup. A missing API key does not
//! fail here: the client reports it when a call is attempted.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::{ClientOptions, ProviderType};
use std::sync::Arc;
use wellness_core::{AppError, AppResult};

/// Create an LLM client for the named provider.
///
/// # Arguments
/// * `provider` - Provider identifier ("gemini", "ollama")
/// * `options` - Endpoint, API key and timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or the HTTP client
/// cannot be built.
pub fn create_client(provider: &str, options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    tracing::debug!(
        "Creating {} client (timeout: {:?})",
        provider_type.as_str(),
        options.timeout
    );

    match provider_type {
        ProviderType::Gemini => {
            if options.api_key.is_none() {
                tracing::warn!("No Gemini API key configured; model calls will fail");
            }
            let client = GeminiClient::with_options(
                options.endpoint.as_deref(),
                options.api_key.clone(),
                options.timeout,
            )?;
            Ok(Arc::new(client))
        }
        ProviderType::Ollama => {
            let client = OllamaClient::with_options(options.endpoint.as_deref(), options.timeout)?;
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gemini_client() {
        let options = ClientOptions {
            api_key: Some("key".to_string()),
            ..ClientOptions::default()
        };
        let client = create_client("gemini", &options).unwrap();
        assert_eq!(client.provider_name(), "gemini");
    }

    #[test]
    fn test_create_gemini_without_key_is_deferred() {
        let client = create_client("gemini", &ClientOptions::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let options = ClientOptions {
            endpoint: Some("http://localhost:8080".to_string()),
            ..ClientOptions::default()
        };
        let client = create_client("ollama", &options).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", &ClientOptions::default()) {
            Err(AppError::Config(msg)) => assert!(msg.contains("Unknown provider")),
            Err(other) => panic!("Unexpected error: {}", other),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
