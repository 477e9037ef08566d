//! LLM provider selection types.

use std::time::Duration;

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Gemini,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }
}

/// Settings shared by every provider client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Custom endpoint; provider default when `None`
    pub endpoint: Option<String>,

    /// API key, for providers that need one
    pub api_key: Option<String>,

    /// Upper bound for one request
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ClientOptions {
    /// Options with a given timeout in seconds.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}
