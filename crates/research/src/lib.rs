//! Research-grounded wellness answers.
//!
//! Turns a health question into an answer backed by PubMed abstracts:
//! the question is rewritten into a keyword query by an LLM, matching
//! articles are fetched from NCBI E-utilities, and the answer is generated
//! with `[Source: <PMID>]` citations. When no article is found the answer is
//! generated from general knowledge and carries no citations.

pub mod citations;
pub mod enhancer;
pub mod generator;
pub mod parser;
pub mod pipeline;
pub mod pubmed;
pub mod retrieval;
pub mod types;

#[cfg(test)]
mod tests;

pub use enhancer::QueryEnhancer;
pub use generator::{AnswerGenerator, GenerationRoute, RouteKind};
pub use pipeline::{PipelineOutcome, PipelineState, Stage, WellnessPipeline};
pub use pubmed::{LiteratureSource, PubMedClient};
pub use retrieval::{RetrievalStrategy, Retriever};
pub use types::{DocumentRecord, SourceRef};

use wellness_llm::LlmRequest;
use wellness_prompt::BuiltPrompt;

/// Turn a rendered prompt into a model request.
pub(crate) fn llm_request(prompt: BuiltPrompt, model: &str) -> LlmRequest {
    let mut request = LlmRequest::new(prompt.user, model);
    if let Some(system) = prompt.system {
        request = request.with_system(system);
    }
    if let Some(temperature) = prompt.metadata.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = prompt.metadata.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }
    request
}
