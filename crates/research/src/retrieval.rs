//! Retrieval: ordered search strategies, then a single fetch.

use std::fmt;
use std::sync::Arc;

use crate::pubmed::LiteratureSource;
use crate::types::DocumentRecord;
use wellness_core::AppResult;

/// Words dropped when simplifying a question into keywords.
pub const STOP_WORDS: [&str; 27] = [
    "what", "how", "does", "help", "with", "the", "for", "and", "are", "is", "can", "should",
    "would", "could", "about", "your", "have", "been", "this", "that", "from", "they", "will",
    "good", "best", "much", "many",
];

/// Tokens of this length or shorter are dropped by simplification.
const MIN_KEYWORD_LEN: usize = 3;

/// How a search query is derived for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStrategy {
    /// The enhanced query, or the question when enhancement left nothing.
    Enhanced,
    /// Question keywords without short tokens and stop words.
    Simplified,
}

impl RetrievalStrategy {
    /// Attempt order.
    pub const ORDER: [RetrievalStrategy; 2] =
        [RetrievalStrategy::Enhanced, RetrievalStrategy::Simplified];

    /// Query text for this strategy; may be empty.
    pub fn query(&self, question: &str, search_query: Option<&str>) -> String {
        match self {
            RetrievalStrategy::Enhanced => search_query
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .unwrap_or(question)
                .to_string(),
            RetrievalStrategy::Simplified => simplify_query(question),
        }
    }
}

impl fmt::Display for RetrievalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalStrategy::Enhanced => write!(f, "enhanced"),
            RetrievalStrategy::Simplified => write!(f, "simplified"),
        }
    }
}

/// Keep whitespace-separated tokens longer than three characters that are
/// not stop words (case-insensitive), in order, joined by single spaces.
///
/// Punctuation stays attached: `"anxiety?"` is kept as is.
pub fn simplify_query(question: &str) -> String {
    question
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_KEYWORD_LEN)
        .filter(|word| !STOP_WORDS.contains(&word.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs the strategy cascade against a literature source.
pub struct Retriever {
    source: Arc<dyn LiteratureSource>,
    max_results: usize,
}

impl Retriever {
    pub fn new(source: Arc<dyn LiteratureSource>, max_results: usize) -> Self {
        Self {
            source,
            max_results,
        }
    }

    /// Documents for the question. Never fails: any search or fetch error
    /// yields an empty set.
    pub async fn retrieve(
        &self,
        question: &str,
        search_query: Option<&str>,
    ) -> Vec<DocumentRecord> {
        match self.try_retrieve(question, search_query).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!("Literature retrieval failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_retrieve(
        &self,
        question: &str,
        search_query: Option<&str>,
    ) -> AppResult<Vec<DocumentRecord>> {
        for strategy in RetrievalStrategy::ORDER {
            let query = strategy.query(question, search_query);
            if query.is_empty() {
                tracing::debug!("Skipping {} search: empty query", strategy);
                continue;
            }

            tracing::debug!("Searching with {} query: {}", strategy, query);
            let ids = self.source.search(&query, self.max_results).await?;
            if ids.is_empty() {
                tracing::info!("No results for {} query", strategy);
                continue;
            }

            let documents = self.source.fetch(&ids).await?;
            if documents.is_empty() {
                tracing::warn!("Fetched no usable records for {} PMIDs", ids.len());
            } else {
                tracing::info!("Retrieved {} articles from PubMed", documents.len());
            }
            return Ok(documents);
        }

        tracing::info!("No PubMed results found");
        Ok(Vec::new())
    }
}
