//! Article rendering and reading-time estimation.
//!
//! [`render`] is a pure function from one raw document to an [`Article`]:
//! title and author flattened to plain text, every content section's body
//! converted to HTML, and a reading time derived from the body word counts.
//!
//! ## Reading Time
//!
//! Each section body is flattened to plain text, trimmed and split on single
//! spaces; the counts are summed and divided by [`WORDS_PER_MINUTE`], rounding
//! up. An empty body counts zero words, so an article without sections (or
//! with only empty ones) reads in 0 minutes.
//!
//! ## Detail Page States
//!
//! ```text
//! Loading ──lookup ok──────▶ Ready(article)
//!    └──────unknown id─────▶ NotFound(id)
//! ```
//!
//! Both outcomes are terminal. An unknown identifier is an ordinary outcome,
//! not an error; only transport failures and malformed documents surface as
//! [`ArticleError`].

use crate::normalize::{self, MalformedDocument};
use crate::richtext::{self, Block, Mode};
use crate::source::{ContentSource, RawDocument, SourceError};
use crate::types::{Article, Section};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

pub const WORDS_PER_MINUTE: usize = 200;

#[derive(Error, Debug)]
pub enum ArticleError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("malformed article: {0}")]
    Malformed(#[from] MalformedDocument),
}

/// Section headings are plain key-text fields in most repositories, but a
/// rich-text heading is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Heading {
    Plain(String),
    Rich(Vec<Block>),
}

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(default)]
    heading: Option<Heading>,
    #[serde(default)]
    body: Option<Vec<Block>>,
}

/// Minutes needed to read `words` words, rounded up.
pub fn reading_time(words: usize) -> u32 {
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

fn render_section(raw: RawSection) -> Section {
    let heading = match raw.heading {
        Some(Heading::Plain(text)) => text,
        Some(Heading::Rich(blocks)) => richtext::flatten(&blocks, Mode::PlainText),
        None => String::new(),
    };
    let body = raw.body.unwrap_or_default();
    Section {
        heading,
        body_html: richtext::flatten(&body, Mode::Html),
        body_word_count: richtext::word_count(&richtext::flatten(&body, Mode::PlainText)),
    }
}

fn sections(raw: &RawDocument) -> Result<Vec<Section>, MalformedDocument> {
    let raw_sections: Vec<RawSection> = match raw.data.get("content") {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| MalformedDocument::new(raw, format!("field `content` is malformed: {e}")))?,
    };
    Ok(raw_sections.into_iter().map(render_section).collect())
}

/// Render a fetched document into an article. Pure: no I/O.
pub fn render(raw: &RawDocument) -> Result<Article, MalformedDocument> {
    // Pages live under the same id the listing links to.
    let id = raw
        .slug()
        .or_else(|| raw.identifier())
        .ok_or_else(|| MalformedDocument::new(raw, "document has no identifier"))?
        .to_string();
    let sections = sections(raw)?;
    let words = sections.iter().map(|s| s.body_word_count).sum();
    let banner_url = raw
        .data
        .pointer("/banner/url")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(Article {
        id,
        published_at: normalize::publication_date(raw)?,
        title: normalize::required_text(raw, "title")?,
        subtitle: normalize::optional_text(raw, "subtitle")?,
        author: normalize::optional_text(raw, "author")?,
        banner_url,
        sections,
        reading_time: reading_time(words),
    })
}

/// State of an article detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleState {
    Loading,
    Ready(Box<Article>),
    NotFound(String),
}

impl ArticleState {
    /// Look `id` up and move out of `Loading`. Terminal states are returned
    /// unchanged without touching the source.
    pub async fn resolve(
        self,
        source: &dyn ContentSource,
        doc_type: &str,
        id: &str,
    ) -> Result<Self, ArticleError> {
        if !matches!(self, ArticleState::Loading) {
            return Ok(self);
        }
        debug!(source = source.name(), %id, "looking up article");
        match source.get_by_identifier(doc_type, id).await {
            Ok(raw) => Ok(ArticleState::Ready(Box::new(render(&raw)?))),
            Err(err) if err.is_not_found() => {
                info!(%id, "article not found");
                Ok(ArticleState::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Convenience for a fresh lookup.
    pub async fn load(
        source: &dyn ContentSource,
        doc_type: &str,
        id: &str,
    ) -> Result<Self, ArticleError> {
        ArticleState::Loading.resolve(source, doc_type, id).await
    }

    pub fn article(&self) -> Option<&Article> {
        match self {
            ArticleState::Ready(article) => Some(article.as_ref()),
            _ => None,
        }
    }
}
