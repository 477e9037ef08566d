//! Pipeline wired to scripted collaborators.

use async_trait::async_trait;
use std::sync::Arc;
use wellness_core::{AppError, AppResult};
use wellness_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use wellness_prompt::PromptLibrary;
use wellness_research::{DocumentRecord, LiteratureSource, WellnessPipeline};

use crate::server::AppState;

/// How the scripted model answers generation prompts.
#[derive(Clone)]
pub enum Scripted {
    Answer(String),
    Failure,
}

struct ScriptedLlm {
    answer: Scripted,
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let content = if request.prompt.starts_with("Convert this to a PubMed search query:") {
            "walking AND sleep".to_string()
        } else {
            match &self.answer {
                Scripted::Answer(text) => text.clone(),
                Scripted::Failure => {
                    return Err(AppError::Llm("model unavailable".to_string()));
                }
            }
        };

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

struct OneArticle;

#[async_trait]
impl LiteratureSource for OneArticle {
    async fn search(&self, _query: &str, _max_results: usize) -> AppResult<Vec<String>> {
        Ok(vec!["111".to_string()])
    }

    async fn fetch(&self, ids: &[String]) -> AppResult<Vec<DocumentRecord>> {
        Ok(ids
            .iter()
            .map(|id| DocumentRecord {
                id: id.clone(),
                title: "Walking and sleep".to_string(),
                content: "Walking improved sleep.".to_string(),
                authors: "Lee K".to_string(),
                journal: "Sleep Med".to_string(),
                year: "2021".to_string(),
                url: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", id),
            })
            .collect())
    }
}

pub fn app_state(answer: Scripted) -> Arc<AppState> {
    let pipeline = WellnessPipeline::new(
        Arc::new(ScriptedLlm { answer }),
        Arc::new(OneArticle),
        Arc::new(PromptLibrary::builtin().unwrap()),
        "test-model",
        3,
    )
    .unwrap();

    Arc::new(AppState {
        pipeline: Arc::new(pipeline),
    })
}
