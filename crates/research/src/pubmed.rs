//! NCBI E-utilities client.
//!
//! Endpoints used:
//!   esearch: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//!   efetch:  https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi

use crate::parser::parse_article_set;
use crate::types::DocumentRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use wellness_core::config::LiteratureConfig;
use wellness_core::{AppError, AppResult};

/// A searchable store of biomedical literature.
///
/// `search` ranks identifiers for a keyword query; `fetch` resolves
/// identifiers to records. Retrieval only talks to this trait.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Identifiers matching `query`, best first, at most `max_results`.
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<String>>;

    /// Records for `ids`, in response order. Unparseable entries are dropped.
    async fn fetch(&self, ids: &[String]) -> AppResult<Vec<DocumentRecord>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    esearchresult: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// PubMed over E-utilities.
pub struct PubMedClient {
    client: reqwest::Client,
    search_url: String,
    fetch_url: String,
    article_base_url: String,
    api_key: Option<String>,
    search_timeout: Duration,
    fetch_timeout: Duration,
}

impl PubMedClient {
    pub fn new(config: &LiteratureConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            search_url: config.search_url.clone(),
            fetch_url: config.fetch_url.clone(),
            article_base_url: config.article_base_url.clone(),
            api_key: config.api_key.clone(),
            search_timeout: Duration::from_secs(config.search_timeout_secs),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        })
    }

    fn search_params(&self, query: &str, max_results: usize) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("term", query.to_string()),
            ("retmax", max_results.to_string()),
            ("retmode", "json".to_string()),
            ("sort", "relevance".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    fn fetch_params(&self, ids: &[String]) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", ids.join(",")),
            ("retmode", "xml".to_string()),
            ("rettype", "abstract".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }
}

fn id_list(response: SearchResponse) -> Vec<String> {
    response
        .esearchresult
        .map(|result| result.idlist)
        .unwrap_or_default()
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<String>> {
        tracing::debug!("PubMed esearch: {:?} (retmax {})", query, max_results);

        let response = self
            .client
            .get(&self.search_url)
            .query(&self.search_params(query, max_results))
            .timeout(self.search_timeout)
            .send()
            .await
            .map_err(|e| {
                AppError::Search(format!("esearch request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Search(format!("esearch returned {}", status)));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| {
                AppError::Search(format!("Failed to parse esearch response: {}", e.without_url()))
            })?;

        let ids = id_list(body);
        tracing::debug!("PubMed esearch returned PMIDs: {:?}", ids);
        Ok(ids)
    }

    async fn fetch(&self, ids: &[String]) -> AppResult<Vec<DocumentRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("PubMed efetch for {} PMIDs", ids.len());

        let response = self
            .client
            .get(&self.fetch_url)
            .query(&self.fetch_params(ids))
            .timeout(self.fetch_timeout)
            .send()
            .await
            .map_err(|e| {
                AppError::Fetch(format!("efetch request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!("efetch returned {}", status)));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| {
                AppError::Fetch(format!("Failed to read efetch body: {}", e.without_url()))
            })?;

        Ok(parse_article_set(&xml, &self.article_base_url))
    }
}
