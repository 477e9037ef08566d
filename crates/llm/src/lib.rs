//! LLM integration crate for the wellness assistant.
//!
//! Provides a provider-agnostic abstraction over generative language models.
//! Every call is a single request/response exchange bounded by a timeout.
//!
//! # Providers
//! - **Gemini**: Google Generative Language API (default)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use wellness_llm::{providers::GeminiClient, LlmClient, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::with_options(None, Some("key".to_string()), Duration::from_secs(60))?;
//! let request = LlmRequest::new("Is walking good for sleep?", "gemini-2.0-flash-exp")
//!     .with_system("You are a wellness guide.");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use types::{ClientOptions, ProviderType};
