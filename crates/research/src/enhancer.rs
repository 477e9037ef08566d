//! LLM query enhancement: natural-language question to PubMed keyword query.

use std::collections::HashMap;
use std::sync::Arc;

use wellness_core::AppResult;
use wellness_llm::LlmClient;
use wellness_prompt::{PromptLibrary, QUERY_ENHANCE};

/// Rewrites questions into compact boolean PubMed queries.
pub struct QueryEnhancer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    model: String,
}

impl QueryEnhancer {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            prompts,
            model: model.into(),
        }
    }

    /// Produce a search query for `question`.
    ///
    /// Model failures and empty output degrade to the question itself. A
    /// missing credential is returned as an error.
    pub async fn enhance(&self, question: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        let prompt = self.prompts.build(QUERY_ENHANCE, variables)?;

        let request = crate::llm_request(prompt, &self.model);

        let query = match self.llm.complete(&request).await {
            Ok(response) => clean_query(&response.content),
            Err(e) if e.is_missing_credential() => return Err(e),
            Err(e) => {
                tracing::warn!("Query enhancement failed, searching with the question: {}", e);
                return Ok(question.to_string());
            }
        };

        if query.is_empty() {
            tracing::warn!("Query enhancement returned nothing, searching with the question");
            return Ok(question.to_string());
        }

        tracing::debug!("Original question: {}", question);
        tracing::debug!("Enhanced search query: {}", query);
        Ok(query)
    }
}

/// Trim, strip surrounding quote characters, trim again.
pub fn clean_query(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_query() {
        assert_eq!(clean_query("  \"exercise AND anxiety\"\n"), "exercise AND anxiety");
        assert_eq!(clean_query("'sleep OR insomnia'"), "sleep OR insomnia");
        // one strip pass only
        assert_eq!(clean_query("\" 'caffeine' \""), "'caffeine'");
        assert_eq!(clean_query("\"\""), "");
    }
}
