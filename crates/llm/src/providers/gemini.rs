//! Google Gemini provider implementation.
//!
//! Uses the REST `generateContent` method of the Generative Language API:
//! https://ai.google.dev/api/generate-content

use std::time::Duration;

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::providers::transport_error;
use serde::{Deserialize, Serialize};
use wellness_core::{AppError, AppResult};

/// Default API root.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header carrying the API key, kept out of the URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart {
                text: text.to_string(),
            }],
        }
    }
}

/// Gemini LLM client.
pub struct GeminiClient {
    /// API root, without trailing slash
    base_url: String,

    /// API key; checked when a call is attempted
    api_key: Option<String>,

    /// HTTP client carrying the request timeout
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client for `base_url` (default API root when `None`).
    pub fn with_options(
        base_url: Option<&str>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url
                .unwrap_or(DEFAULT_GEMINI_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            client,
        })
    }

    /// Convert LlmRequest to Gemini format.
    fn to_gemini_request(&self, request: &LlmRequest) -> GeminiRequest {
        let generation_config = if request.temperature.is_some()
            || request.top_p.is_some()
            || request.max_tokens.is_some()
        {
            Some(GenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        GeminiRequest {
            system_instruction: request
                .system
                .as_deref()
                .map(|system| GeminiContent::text(None, system)),
            contents: vec![GeminiContent::text(Some("user"), &request.prompt)],
            generation_config,
        }
    }

    /// Convert Gemini response to LlmResponse.
    fn convert_response(&self, response: GeminiResponse, model: &str) -> AppResult<LlmResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("Gemini returned no candidates".to_string()))?;

        let content = candidate.content.ok_or_else(|| {
            AppError::Llm(format!(
                "Gemini returned an empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

        let text: String = content.parts.into_iter().map(|p| p.text).collect();

        let usage = response
            .usage_metadata
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content: text,
            model: response.model_version.unwrap_or_else(|| model.to_string()),
            usage,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::MissingCredential(
                "Gemini API key is not configured (set GOOGLE_API_KEY)".to_string(),
            )
        })?;

        tracing::debug!("Sending completion request to Gemini model {}", request.model);

        let gemini_request = self.to_gemini_request(request);
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| transport_error("Gemini", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| {
                AppError::Llm(format!(
                    "Failed to parse Gemini response: {}",
                    e.without_url()
                ))
            })?;

        let converted = self.convert_response(gemini_response, &request.model)?;

        tracing::debug!(
            "Received completion from Gemini ({} prompt / {} completion tokens)",
            converted.usage.prompt_tokens,
            converted.usage.completion_tokens
        );

        Ok(converted)
    }
}
