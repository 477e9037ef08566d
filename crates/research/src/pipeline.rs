//! Question-to-answer orchestration.
//!
//! The flow is fixed and acyclic:
//!
//! ```text
//! Start -> EnhanceQuery -> Retrieve -> GenerateResearch -> End
//!                                   \-> GenerateGeneral  -> End
//! ```
//!
//! Exactly one generation stage runs per question. The pipeline holds no
//! per-request state and is shared behind an `Arc`.

use std::sync::Arc;
use std::time::Instant;

use crate::enhancer::QueryEnhancer;
use crate::generator::{AnswerGenerator, GenerationRoute, RouteKind};
use crate::pubmed::{LiteratureSource, PubMedClient};
use crate::retrieval::Retriever;
use crate::types::{DocumentRecord, SourceRef};
use serde::Serialize;
use wellness_core::{AppConfig, AppError, AppResult};
use wellness_llm::{create_client, ClientOptions, LlmClient};
use wellness_prompt::PromptLibrary;

/// A step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    EnhanceQuery,
    Retrieve,
    GenerateResearch,
    GenerateGeneral,
    End,
}

/// Mutable record for one invocation. Never shared between questions.
#[derive(Debug)]
pub struct PipelineState {
    pub question: String,
    pub search_query: Option<String>,
    pub context: Vec<DocumentRecord>,
    pub answer: String,
    pub stages: Vec<Stage>,
}

impl PipelineState {
    fn new(question: &str) -> Self {
        Self {
            question: question.to_string(),
            search_query: None,
            context: Vec::new(),
            answer: String::new(),
            stages: vec![Stage::Start],
        }
    }

    fn enter(&mut self, stage: Stage) {
        tracing::debug!("Pipeline stage: {:?}", stage);
        self.stages.push(stage);
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub question: String,
    pub search_query: String,
    pub route: RouteKind,
    pub answer: String,
    pub documents: Vec<DocumentRecord>,
    pub stages: Vec<Stage>,
}

impl PipelineOutcome {
    /// Public source list, one entry per retrieved document.
    pub fn sources(&self) -> Vec<SourceRef> {
        self.documents.iter().map(DocumentRecord::source_ref).collect()
    }
}

/// The RAG pipeline: enhance, retrieve, generate.
pub struct WellnessPipeline {
    enhancer: QueryEnhancer,
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl WellnessPipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        source: Arc<dyn LiteratureSource>,
        prompts: Arc<PromptLibrary>,
        model: &str,
        max_results: usize,
    ) -> AppResult<Self> {
        Ok(Self {
            enhancer: QueryEnhancer::new(llm.clone(), prompts.clone(), model),
            retriever: Retriever::new(source, max_results),
            generator: AnswerGenerator::new(llm, prompts, model)?,
        })
    }

    /// Build the production pipeline: configured LLM provider, PubMed and
    /// the prompt library (with overrides from `prompts_dir`, if set).
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let options = ClientOptions {
            endpoint: config.llm_endpoint.clone(),
            api_key: config.api_key.clone(),
            ..ClientOptions::default()
        }
        .with_timeout_secs(config.llm_timeout_secs);

        let llm = create_client(&config.provider, &options)?;
        let source: Arc<dyn LiteratureSource> = Arc::new(PubMedClient::new(&config.literature)?);
        let prompts = Arc::new(PromptLibrary::load(config.prompts_dir.as_deref())?);

        tracing::info!(
            "Pipeline ready (provider: {}, model: {}, max results: {})",
            llm.provider_name(),
            config.model,
            config.literature.max_results
        );

        Self::new(
            llm,
            source,
            prompts,
            &config.model,
            config.literature.max_results,
        )
    }

    /// Answer one question.
    ///
    /// # Errors
    /// `InvalidInput` for a blank question, `MissingCredential` when no model
    /// key is configured, and any error from the generation call.
    pub async fn run(&self, question: &str) -> AppResult<PipelineOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidInput(
                "Question must not be empty".to_string(),
            ));
        }

        let start = Instant::now();
        let mut state = PipelineState::new(question);

        state.enter(Stage::EnhanceQuery);
        let search_query = self.enhancer.enhance(&state.question).await?;
        state.search_query = Some(search_query);

        state.enter(Stage::Retrieve);
        state.context = self
            .retriever
            .retrieve(&state.question, state.search_query.as_deref())
            .await;

        let route = GenerationRoute::select(&state.question, state.context.clone());
        tracing::info!(
            "Routing to {} generation ({} articles)",
            route.kind(),
            route.documents().len()
        );

        state.enter(match route.kind() {
            RouteKind::Research => Stage::GenerateResearch,
            RouteKind::General => Stage::GenerateGeneral,
        });
        state.answer = self.generator.generate(&route).await?;
        state.enter(Stage::End);

        tracing::info!(
            "Answered in {:.2}s via {} path",
            start.elapsed().as_secs_f64(),
            route.kind()
        );

        Ok(PipelineOutcome {
            search_query: state.search_query.unwrap_or_else(|| state.question.clone()),
            question: state.question,
            route: route.kind(),
            answer: state.answer,
            documents: state.context,
            stages: state.stages,
        })
    }
}
