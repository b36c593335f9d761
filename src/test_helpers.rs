//! Shared test utilities for the headless-blog test suite.
//!
//! Provides raw document builders shaped like content API responses, a
//! scripted in-memory [`ContentSource`] with failure and latency injection,
//! and lookup helpers over fetch-stage data.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = ScriptedSource::default()
//!     .with_page("c2", raw_page(vec![raw_post("b", "B")], None))
//!     .failing_once("c2");
//!
//! let doc = raw_article("hooks", &[("Intro", 100), ("Body", 150)]);
//! ```

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::fetch::Manifest;
use crate::source::{ContentSource, RawDocument, RawPage, SourceError};
use crate::types::{Article, PostSummary};

// =========================================================================
// Raw document builders
// =========================================================================

/// A single-paragraph rich-text field.
pub fn rich(text: &str) -> Value {
    json!([{ "type": "paragraph", "text": text, "spans": [] }])
}

/// A listing-ready post document with fixed subtitle, author and date.
pub fn raw_post(slug: &str, title: &str) -> RawDocument {
    RawDocument {
        id: format!("doc-{slug}"),
        uid: Some(slug.to_string()),
        doc_type: "posts".to_string(),
        slugs: vec![slug.to_string()],
        first_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
        last_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
        data: json!({
            "title": [{ "type": "heading1", "text": title, "spans": [] }],
            "subtitle": rich("Pensando em sincronização em vez de ciclos de vida"),
            "author": rich("Joseph Oliveira"),
        }),
    }
}

/// `n` space-separated words.
pub fn words(n: usize) -> String {
    vec!["palavra"; n].join(" ")
}

/// A post with content sections of the given `(heading, word count)`.
pub fn raw_article(slug: &str, sections: &[(&str, usize)]) -> RawDocument {
    let mut doc = raw_post(slug, &format!("Article {slug}"));
    let content: Vec<Value> = sections
        .iter()
        .map(|(heading, n)| json!({ "heading": heading, "body": rich(&words(*n)) }))
        .collect();
    doc.data["content"] = Value::Array(content);
    doc.data["banner"] = json!({ "url": format!("https://images.example/{slug}.png") });
    doc
}

pub fn raw_page(results: Vec<RawDocument>, next_page: Option<&str>) -> RawPage {
    RawPage {
        page: 1,
        total_pages: 1,
        total_results_size: results.len() as u32,
        next_page: next_page.map(str::to_string),
        results,
    }
}

/// A normalized summary with placeholder fields.
pub fn summary(id: &str) -> PostSummary {
    PostSummary {
        id: id.to_string(),
        published_at: Some("19 mar 2021".to_string()),
        title: format!("Title {id}"),
        subtitle: format!("Subtitle {id}"),
        author: "Author".to_string(),
    }
}

// =========================================================================
// Scripted content source
// =========================================================================

/// In-memory source whose pages are keyed by cursor.
///
/// `query_by_type` serves the page registered under the cursor `"first"`.
/// Failures are injected per cursor; every `fetch_page` call is counted.
#[derive(Default)]
pub struct ScriptedSource {
    pages: HashMap<String, RawPage>,
    documents: Vec<RawDocument>,
    /// Remaining forced failures per cursor.
    failures: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn with_page(mut self, cursor: &str, page: RawPage) -> Self {
        self.pages.insert(cursor.to_string(), page);
        self
    }

    pub fn with_documents(mut self, documents: Vec<RawDocument>) -> Self {
        self.documents = documents;
        self
    }

    /// Every fetch of `cursor` times out.
    pub fn failing(self, cursor: &str) -> Self {
        self.fail_times(cursor, usize::MAX)
    }

    /// The first fetch of `cursor` times out.
    pub fn failing_once(self, cursor: &str) -> Self {
        self.fail_times(cursor, 1)
    }

    fn fail_times(self, cursor: &str, times: usize) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(cursor.to_string(), times);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn should_fail(&self, cursor: &str) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(cursor) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl ContentSource for ScriptedSource {
    async fn query_by_type(&self, _doc_type: &str, _page_size: u32) -> Result<RawPage, SourceError> {
        self.fetch_page("first").await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<RawPage, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail(cursor) {
            return Err(SourceError::Timeout);
        }
        self.pages
            .get(cursor)
            .cloned()
            .ok_or_else(|| SourceError::Cursor(cursor.to_string()))
    }

    async fn get_by_identifier(
        &self,
        doc_type: &str,
        id: &str,
    ) -> Result<RawDocument, SourceError> {
        if self.should_fail(id) {
            return Err(SourceError::Timeout);
        }
        self.documents
            .iter()
            .find(|d| d.identifier() == Some(id))
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                doc_type: doc_type.to_string(),
                id: id.to_string(),
            })
    }

    async fn list_all_identifiers(&self, _doc_type: &str) -> Result<Vec<String>, SourceError> {
        Ok(self
            .documents
            .iter()
            .filter_map(RawDocument::identifier)
            .map(str::to_string)
            .collect())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// =========================================================================
// Manifest lookups: panics with a clear message on miss
// =========================================================================

/// Find a rendered article by id. Panics if not found.
pub fn find_article<'a>(manifest: &'a Manifest, id: &str) -> &'a Article {
    manifest
        .articles
        .iter()
        .find(|a| a.id == id)
        .unwrap_or_else(|| {
            let ids: Vec<&str> = manifest.articles.iter().map(|a| a.id.as_str()).collect();
            panic!("article '{id}' not found. Available: {ids:?}")
        })
}

/// Listing ids per page, in fetch order.
pub fn listing_ids(manifest: &Manifest) -> Vec<Vec<&str>> {
    manifest
        .listing
        .iter()
        .map(|page| page.iter().map(|s| s.id.as_str()).collect())
        .collect()
}
