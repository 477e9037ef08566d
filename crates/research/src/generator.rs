//! Answer generation, research-backed or general.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::citations::CitationMarkers;
use crate::types::{format_context, DocumentRecord};
use serde::Serialize;
use wellness_core::AppResult;
use wellness_llm::LlmClient;
use wellness_prompt::{PromptLibrary, ANSWER_GENERAL, ANSWER_RESEARCH};

/// Which generation variant runs, with the data it needs.
#[derive(Debug, Clone)]
pub enum GenerationRoute {
    HasResearch {
        question: String,
        documents: Vec<DocumentRecord>,
    },
    NoResearch {
        question: String,
    },
}

impl GenerationRoute {
    /// Research when at least one document was retrieved.
    pub fn select(question: &str, documents: Vec<DocumentRecord>) -> Self {
        if documents.is_empty() {
            GenerationRoute::NoResearch {
                question: question.to_string(),
            }
        } else {
            GenerationRoute::HasResearch {
                question: question.to_string(),
                documents,
            }
        }
    }

    pub fn kind(&self) -> RouteKind {
        match self {
            GenerationRoute::HasResearch { .. } => RouteKind::Research,
            GenerationRoute::NoResearch { .. } => RouteKind::General,
        }
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        match self {
            GenerationRoute::HasResearch { documents, .. } => documents,
            GenerationRoute::NoResearch { .. } => &[],
        }
    }
}

/// Route label without payload, for responses and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Research,
    General,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Research => write!(f, "research"),
            RouteKind::General => write!(f, "general"),
        }
    }
}

/// Produces the final answer text for a route.
pub struct AnswerGenerator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
    model: String,
    citations: CitationMarkers,
}

impl AnswerGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
        model: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            llm,
            prompts,
            model: model.into(),
            citations: CitationMarkers::new()?,
        })
    }

    /// One model call, no retry. Model errors propagate.
    pub async fn generate(&self, route: &GenerationRoute) -> AppResult<String> {
        match route {
            GenerationRoute::HasResearch {
                question,
                documents,
            } => self.generate_research(question, documents).await,
            GenerationRoute::NoResearch { question } => self.generate_general(question).await,
        }
    }

    async fn generate_research(
        &self,
        question: &str,
        documents: &[DocumentRecord],
    ) -> AppResult<String> {
        tracing::info!("Generating research answer from {} articles", documents.len());

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("context".to_string(), format_context(documents));
        let prompt = self.prompts.build(ANSWER_RESEARCH, variables)?;

        let response = self
            .llm
            .complete(&crate::llm_request(prompt, &self.model))
            .await?;

        let known: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        let answer = self.citations.normalize(&response.content, &known);

        tracing::debug!("Answer cites {:?}", self.citations.cited_ids(&answer));
        Ok(answer)
    }

    async fn generate_general(&self, question: &str) -> AppResult<String> {
        tracing::info!("Generating general answer (no research articles found)");

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        let prompt = self.prompts.build(ANSWER_GENERAL, variables)?;

        let response = self
            .llm
            .complete(&crate::llm_request(prompt, &self.model))
            .await?;

        Ok(self.citations.strip(&response.content))
    }
}
