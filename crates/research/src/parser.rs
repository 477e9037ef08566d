//! PubMed efetch XML parsing.
//!
//! Handles the `<PubmedArticleSet><PubmedArticle>` structure returned by
//! `efetch.fcgi?db=pubmed&retmode=xml&rettype=abstract`. Each article is
//! parsed independently: a bad entry is skipped, a malformed document yields
//! no records at all.

use crate::types::{
    DocumentRecord, NO_ABSTRACT, NO_TITLE, UNKNOWN_AUTHORS, UNKNOWN_JOURNAL, UNKNOWN_YEAR,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use wellness_core::{AppError, AppResult};

/// Authors listed by name before the list is cut to "et al.".
const MAX_LISTED_AUTHORS: usize = 3;

/// Parse an efetch response into document records.
///
/// Never fails: XML syntax errors, mismatched or unclosed tags return an
/// empty Vec; entries without a PMID are dropped. Both cases are logged.
pub fn parse_article_set(xml: &str, base_url: &str) -> Vec<DocumentRecord> {
    let articles = match read_articles(xml) {
        Ok(articles) => articles,
        Err(e) => {
            tracing::warn!("Discarding malformed PubMed XML: {}", e);
            return Vec::new();
        }
    };

    let base_url = base_url.trim_end_matches('/');
    let mut records = Vec::with_capacity(articles.len());

    for (position, article) in articles.into_iter().enumerate() {
        match article.into_record(base_url) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Skipping PubMed article #{}: {}", position + 1, e),
        }
    }

    tracing::debug!("Parsed {} PubMed articles", records.len());
    records
}

/// Fields collected for one `<PubmedArticle>` before defaults are applied.
#[derive(Debug, Default)]
struct RawArticle {
    pmid: Option<String>,
    title: Option<String>,
    abstract_parts: Vec<String>,
    authors: Vec<String>,
    journal: Option<String>,
    year: Option<String>,
    medline_date: Option<String>,
    error: Option<String>,
}

impl RawArticle {
    fn into_record(self, base_url: &str) -> AppResult<DocumentRecord> {
        if let Some(error) = self.error {
            return Err(AppError::Parse(error));
        }

        let id = self
            .pmid
            .filter(|pmid| !pmid.is_empty())
            .ok_or_else(|| AppError::Parse("article has no PMID".to_string()))?;

        let content = if self.abstract_parts.is_empty() {
            NO_ABSTRACT.to_string()
        } else {
            self.abstract_parts.join(" ")
        };

        let year = [self.year, self.medline_date]
            .into_iter()
            .flatten()
            .find(|date| !date.is_empty())
            .map(|date| date.chars().take(4).collect())
            .unwrap_or_else(|| UNKNOWN_YEAR.to_string());

        Ok(DocumentRecord {
            url: format!("{}/{}", base_url, id),
            id,
            title: non_empty_or(self.title, NO_TITLE),
            content,
            authors: format_authors(&self.authors),
            journal: non_empty_or(self.journal, UNKNOWN_JOURNAL),
            year,
        })
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// `"A, B, C"` for up to three names, `"A, B, C, et al."` beyond that.
pub fn format_authors(authors: &[String]) -> String {
    match authors.len() {
        0 => UNKNOWN_AUTHORS.to_string(),
        n if n > MAX_LISTED_AUTHORS => {
            format!("{}, et al.", authors[..MAX_LISTED_AUTHORS].join(", "))
        }
        _ => authors.join(", "),
    }
}

/// Element whose text is being collected.
#[derive(Debug)]
enum Field {
    Pmid,
    Title,
    Abstract { label: Option<String> },
    LastName,
    Initials,
    Journal,
    Year,
    MedlineDate,
}

#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

#[derive(Debug, Default)]
struct AuthorParts {
    last_name: Option<String>,
    initials: Option<String>,
}

/// Walk the document and collect one `RawArticle` per `<PubmedArticle>`.
fn read_articles(xml: &str) -> AppResult<Vec<RawArticle>> {
    let mut reader = Reader::from_str(xml);

    let mut articles = Vec::new();
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut article: Option<RawArticle> = None;
    let mut author: Option<AuthorParts> = None;
    let mut capture: Option<Capture> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"PubmedArticle" => article = Some(RawArticle::default()),
                    b"Author" if article.is_some() => author = Some(AuthorParts::default()),
                    _ => {}
                }

                if capture.is_none() {
                    if let Some(current) = article.as_mut() {
                        let parent = stack.last().map(Vec::as_slice);
                        match field_for(&e, parent, current, author.is_some()) {
                            Ok(Some(field)) => {
                                capture = Some(Capture {
                                    field,
                                    depth: stack.len() + 1,
                                    text: String::new(),
                                });
                            }
                            Ok(None) => {}
                            Err(err) => mark_failed(current, err),
                        }
                    }
                }

                stack.push(name);
            }
            Event::Empty(e) => {
                // Self-closing elements carry no text; only a labeled empty
                // abstract segment contributes anything.
                if capture.is_none() {
                    if let Some(current) = article.as_mut() {
                        let parent = stack.last().map(Vec::as_slice);
                        match field_for(&e, parent, current, author.is_some()) {
                            Ok(Some(field)) => finish_field(current, &mut author, field, ""),
                            Ok(None) => {}
                            Err(err) => mark_failed(current, err),
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let Some(cap) = capture.as_mut() {
                    match t.unescape() {
                        Ok(text) => cap.text.push_str(&text),
                        Err(err) => {
                            if let Some(current) = article.as_mut() {
                                mark_failed(current, format!("undecodable text: {}", err));
                            }
                        }
                    }
                }
            }
            Event::CData(c) => {
                if let Some(cap) = capture.as_mut() {
                    cap.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => {
                stack.pop();

                if capture.as_ref().is_some_and(|cap| cap.depth == stack.len() + 1) {
                    if let (Some(cap), Some(current)) = (capture.take(), article.as_mut()) {
                        finish_field(current, &mut author, cap.field, &cap.text);
                    }
                }

                match e.name().as_ref() {
                    b"Author" => {
                        if let (Some(parts), Some(current)) = (author.take(), article.as_mut()) {
                            if let Some(last) = parts.last_name.filter(|l| !l.is_empty()) {
                                let name = match parts.initials.filter(|i| !i.is_empty()) {
                                    Some(initials) => format!("{} {}", last, initials),
                                    None => last,
                                };
                                current.authors.push(name);
                            }
                        }
                    }
                    b"PubmedArticle" => {
                        if let Some(done) = article.take() {
                            articles.push(done);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(AppError::Parse(format!(
            "unexpected end of document inside <{}>",
            String::from_utf8_lossy(open)
        )));
    }

    Ok(articles)
}

/// Decide whether an element inside an article starts a field of interest.
fn field_for(
    e: &BytesStart<'_>,
    parent: Option<&[u8]>,
    article: &RawArticle,
    in_author: bool,
) -> Result<Option<Field>, String> {
    let field = match (e.name().as_ref(), parent) {
        (b"PMID", _) if article.pmid.is_none() => Field::Pmid,
        (b"ArticleTitle", _) if article.title.is_none() => Field::Title,
        (b"AbstractText", _) => Field::Abstract {
            label: label_of(e)?,
        },
        (b"LastName", Some(b"Author")) if in_author => Field::LastName,
        (b"Initials", Some(b"Author")) if in_author => Field::Initials,
        (b"Title", Some(b"Journal")) if article.journal.is_none() => Field::Journal,
        (b"Year", Some(b"PubDate")) if article.year.is_none() => Field::Year,
        (b"MedlineDate", Some(b"PubDate")) if article.medline_date.is_none() => {
            Field::MedlineDate
        }
        _ => return Ok(None),
    };
    Ok(Some(field))
}

fn label_of(e: &BytesStart<'_>) -> Result<Option<String>, String> {
    let attr = e
        .try_get_attribute("Label")
        .map_err(|err| format!("bad AbstractText attribute: {}", err))?;

    match attr {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|err| format!("bad AbstractText label: {}", err))?;
            let value = value.trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        }
        None => Ok(None),
    }
}

fn finish_field(
    article: &mut RawArticle,
    author: &mut Option<AuthorParts>,
    field: Field,
    text: &str,
) {
    let text = collapse_whitespace(text);
    match field {
        Field::Pmid => article.pmid = Some(text),
        Field::Title => article.title = Some(text),
        Field::Abstract { label } => {
            let segment = match label {
                Some(label) => format!("{}: {}", label, text),
                None => text,
            };
            article.abstract_parts.push(segment);
        }
        Field::LastName => {
            if let Some(parts) = author.as_mut() {
                parts.last_name = Some(text);
            }
        }
        Field::Initials => {
            if let Some(parts) = author.as_mut() {
                parts.initials = Some(text);
            }
        }
        Field::Journal => article.journal = Some(text),
        Field::Year => article.year = Some(text),
        Field::MedlineDate => article.medline_date = Some(text),
    }
}

fn mark_failed(article: &mut RawArticle, error: String) {
    if article.error.is_none() {
        article.error = Some(error);
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn xml_error(err: quick_xml::Error) -> AppError {
    AppError::Parse(format!("invalid XML: {}", err))
}
