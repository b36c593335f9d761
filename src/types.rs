//! Shared types used across both pipeline stages.
//!
//! These types are serialized into the fetch manifest and read back by the
//! generate stage, so they carry only normalized, display-ready values. Raw
//! content API shapes live in [`crate::source`].

use serde::{Deserialize, Serialize};

/// One entry of the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    /// First slug of the source document. Never empty.
    pub id: String,
    /// Publication date formatted for display (`19 mar 2021`), `None` for drafts.
    pub published_at: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A fully rendered article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// First slug, matching the listing entry's id.
    pub id: String,
    pub published_at: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Banner image URL, empty when the document has none.
    pub banner_url: String,
    pub sections: Vec<Section>,
    /// Estimated reading time in whole minutes.
    pub reading_time: u32,
}

/// One heading + body group of an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    /// Body rendered to escaped HTML.
    pub body_html: String,
    pub body_word_count: usize,
}

/// Site-relative URL of an article page.
pub fn article_href(id: &str) -> String {
    format!("/post/{id}/")
}
