//! Content source abstraction.
//!
//! The blog never owns its content: documents live in a headless CMS and are
//! read through the [`ContentSource`] trait. Two implementations ship:
//!
//! - [`ApiClient`] talks to a Prismic-style REST API over HTTP.
//! - [`FixtureSource`] serves documents from a JSON file, for offline builds
//!   and tests.
//!
//! Sources are constructed explicitly and passed around as
//! `Arc<dyn ContentSource>`; nothing in the crate reaches for a global client.
//!
//! ## Wire Shapes
//!
//! Both implementations speak the same document and page shapes, which mirror
//! the CMS search API:
//!
//! ```json
//! {
//!   "page": 1,
//!   "total_pages": 3,
//!   "next_page": "https://repo.cdn.prismic.io/api/v2/documents/search?page=2&...",
//!   "results": [
//!     {
//!       "id": "YFT...",
//!       "uid": "como-utilizar-hooks",
//!       "type": "posts",
//!       "slugs": ["como-utilizar-hooks"],
//!       "first_publication_date": "2021-03-25T19:25:28+0000",
//!       "data": { "title": [...], "subtitle": [...], "author": [...], "content": [...] }
//!     }
//!   ]
//! }
//! ```

mod fixture;
mod http;

pub use fixture::FixtureSource;
pub use http::ApiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("content source request timed out")]
    Timeout,
    #[error("content source request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("content source returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("could not decode content source response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid content source URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("content source API exposes no master ref")]
    NoMasterRef,
    #[error("invalid page cursor: {0}")]
    Cursor(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{doc_type} document '{id}' not found")]
    NotFound { doc_type: String, id: String },
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. })
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else {
            SourceError::Transport(err)
        }
    }
}

/// A document as returned by the content API, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub slugs: Vec<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    /// Custom fields; their shape depends on the document type.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RawDocument {
    /// Identifier used for routes: the first slug.
    pub fn slug(&self) -> Option<&str> {
        self.slugs.first().map(String::as_str).filter(|s| !s.is_empty())
    }

    /// Identifier used for lookups: the UID, falling back to the first slug.
    pub fn identifier(&self) -> Option<&str> {
        self.uid
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.slug())
    }
}

/// One page of a search response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results_size: u32,
    /// Cursor of the following page; `None` (or empty) on the last page.
    #[serde(default)]
    pub next_page: Option<String>,
    pub results: Vec<RawDocument>,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// First page of all documents of `doc_type`.
    async fn query_by_type(&self, doc_type: &str, page_size: u32) -> Result<RawPage, SourceError>;

    /// The page a previous response's `next_page` cursor points to.
    async fn fetch_page(&self, cursor: &str) -> Result<RawPage, SourceError>;

    /// A single document, or [`SourceError::NotFound`].
    async fn get_by_identifier(&self, doc_type: &str, id: &str)
    -> Result<RawDocument, SourceError>;

    /// Identifiers of every document of `doc_type`, across all pages.
    async fn list_all_identifiers(&self, doc_type: &str) -> Result<Vec<String>, SourceError>;

    fn name(&self) -> &'static str;
}
