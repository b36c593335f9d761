//! Offline content source backed by a JSON file.
//!
//! The file holds either a bare array of documents or an object with a
//! `results` array (so a saved API response works as-is). Documents are served
//! in file order; cursors have the form `fixture:{type}:{page}:{page_size}` and
//! are opaque to callers.

use super::{ContentSource, RawDocument, RawPage, SourceError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Documents(Vec<RawDocument>),
    Response { results: Vec<RawDocument> },
}

#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    documents: Vec<RawDocument>,
}

impl FixtureSource {
    pub fn from_documents(documents: Vec<RawDocument>) -> Self {
        Self { documents }
    }

    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let content = std::fs::read_to_string(path)?;
        let documents = match serde_json::from_str(&content)? {
            FixtureFile::Documents(docs) => docs,
            FixtureFile::Response { results } => results,
        };
        Ok(Self { documents })
    }

    fn of_type<'a>(&'a self, doc_type: &'a str) -> impl Iterator<Item = &'a RawDocument> + 'a {
        self.documents.iter().filter(move |d| d.doc_type == doc_type)
    }

    /// Page `page` (1-based) of `doc_type`.
    fn page(&self, doc_type: &str, page: u32, page_size: u32) -> RawPage {
        let size = page_size.max(1) as usize;
        let matching: Vec<&RawDocument> = self.of_type(doc_type).collect();
        let total = matching.len();
        let total_pages = total.div_ceil(size) as u32;
        let skip = (page.saturating_sub(1) as usize).saturating_mul(size);
        let results = matching
            .into_iter()
            .skip(skip)
            .take(size)
            .cloned()
            .collect();
        let next_page =
            (page < total_pages).then(|| format!("fixture:{doc_type}:{}:{page_size}", page + 1));
        RawPage {
            page,
            total_pages,
            total_results_size: total as u32,
            next_page,
            results,
        }
    }
}

fn parse_cursor(cursor: &str) -> Option<(&str, u32, u32)> {
    let rest = cursor.strip_prefix("fixture:")?;
    let mut parts = rest.rsplitn(3, ':');
    let page_size = parts.next()?.parse().ok()?;
    let page = parts.next()?.parse().ok()?;
    let doc_type = parts.next()?;
    Some((doc_type, page, page_size))
}

#[async_trait]
impl ContentSource for FixtureSource {
    async fn query_by_type(&self, doc_type: &str, page_size: u32) -> Result<RawPage, SourceError> {
        Ok(self.page(doc_type, 1, page_size))
    }

    async fn fetch_page(&self, cursor: &str) -> Result<RawPage, SourceError> {
        let (doc_type, page, page_size) =
            parse_cursor(cursor).ok_or_else(|| SourceError::Cursor(cursor.to_string()))?;
        Ok(self.page(doc_type, page, page_size))
    }

    async fn get_by_identifier(
        &self,
        doc_type: &str,
        id: &str,
    ) -> Result<RawDocument, SourceError> {
        self.of_type(doc_type)
            .find(|d| d.identifier() == Some(id) || d.slugs.iter().any(|s| s == id))
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                doc_type: doc_type.to_string(),
                id: id.to_string(),
            })
    }

    async fn list_all_identifiers(&self, doc_type: &str) -> Result<Vec<String>, SourceError> {
        Ok(self
            .of_type(doc_type)
            .filter_map(RawDocument::identifier)
            .map(str::to_string)
            .collect())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
