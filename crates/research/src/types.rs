//! Domain types for literature retrieval and answers.

use serde::{Deserialize, Serialize};

/// Default for a missing `ArticleTitle`.
pub const NO_TITLE: &str = "No title available";

/// Default for an article without `AbstractText`.
pub const NO_ABSTRACT: &str = "No abstract available.";

/// Default for an article without named authors.
pub const UNKNOWN_AUTHORS: &str = "Unknown authors";

/// Default for a missing `Journal/Title`.
pub const UNKNOWN_JOURNAL: &str = "Unknown journal";

/// Default for a missing publication year.
pub const UNKNOWN_YEAR: &str = "Unknown";

/// A parsed PubMed article. Immutable once built, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// PMID
    pub id: String,

    pub title: String,

    /// Abstract segments joined with single spaces
    pub content: String,

    /// Display string, e.g. `"Smith J, Doe A, Lee K, et al."`
    pub authors: String,

    pub journal: String,

    /// Four-character year, or `"Unknown"`
    pub year: String,

    /// Public article page
    pub url: String,
}

impl DocumentRecord {
    /// Block used in the research prompt context.
    pub fn to_context_block(&self) -> String {
        format!(
            "PMID: {}\nTitle: {}\nAuthors: {}\nJournal: {}\nYear: {}\nAbstract: {}",
            self.id, self.title, self.authors, self.journal, self.year, self.content
        )
    }

    pub fn source_ref(&self) -> SourceRef {
        SourceRef {
            id: self.id.clone(),
            title: self.title.clone(),
            authors: self.authors.clone(),
            journal: self.journal.clone(),
            year: self.year.clone(),
            url: self.url.clone(),
        }
    }
}

/// Public projection of a document returned alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub title: String,
    pub authors: String,
    pub journal: String,
    pub year: String,
    pub url: String,
}

/// Serialize documents for the research prompt, blank-line separated.
pub fn format_context(documents: &[DocumentRecord]) -> String {
    documents
        .iter()
        .map(DocumentRecord::to_context_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}
