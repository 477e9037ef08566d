//! Citation marker handling for generated answers.
//!
//! The only accepted form is `[Source: <id>]`, one id per bracket.

use regex::{Captures, Regex};
use std::collections::HashSet;
use wellness_core::{AppError, AppResult};

/// Matches a marker plus any spaces or tabs directly before it.
const MARKER_PATTERN: &str = r"([ \t]*)\[Source:\s*([^\]\n]*)\]";

/// Render the canonical marker for `id`.
pub fn marker(id: &str) -> String {
    format!("[Source: {}]", id)
}

/// Rewrites citation markers in model output.
#[derive(Debug, Clone)]
pub struct CitationMarkers {
    pattern: Regex,
}

impl CitationMarkers {
    pub fn new() -> AppResult<Self> {
        let pattern = Regex::new(MARKER_PATTERN)
            .map_err(|e| AppError::Other(format!("Invalid citation pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Remove every marker together with the whitespace before it.
    pub fn strip(&self, answer: &str) -> String {
        self.pattern.replace_all(answer, "").into_owned()
    }

    /// Split combined markers and drop ids that are not in `known_ids`.
    ///
    /// `[Source: 1, 2]` becomes `[Source: 1][Source: 2]`. A marker left with
    /// no known id is removed. Canonical markers for known ids are kept
    /// unchanged.
    pub fn normalize(&self, answer: &str, known_ids: &[&str]) -> String {
        let known: HashSet<&str> = known_ids.iter().copied().collect();

        self.pattern
            .replace_all(answer, |caps: &Captures<'_>| {
                let kept: String = split_ids(&caps[2])
                    .filter(|id| {
                        let ok = known.contains(id);
                        if !ok {
                            tracing::debug!("Dropping citation of unknown source {:?}", id);
                        }
                        ok
                    })
                    .map(marker)
                    .collect();

                if kept.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", &caps[1], kept)
                }
            })
            .into_owned()
    }

    /// Cited ids in order of first appearance.
    pub fn cited_ids(&self, answer: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for caps in self.pattern.captures_iter(answer) {
            for id in split_ids(&caps[2]) {
                if seen.insert(id.to_string()) {
                    ids.push(id.to_string());
                }
            }
        }
        ids
    }
}

/// Ids inside one marker body; tolerates `,`/`;` separators and a `PMID` prefix.
fn split_ids(body: &str) -> impl Iterator<Item = &str> {
    body.split([',', ';'])
        .map(|part| {
            let part = part.trim();
            part.strip_prefix("PMID")
                .map(|rest| rest.trim_start_matches(':').trim())
                .unwrap_or(part)
        })
        .filter(|id| !id.is_empty())
}
