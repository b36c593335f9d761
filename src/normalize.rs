//! Raw document → display value normalization.
//!
//! Every listing entry, whether it comes from the first page fetched at build
//! time or from a later "load more", goes through [`summarize`]. There is no
//! second mapping anywhere in the crate.
//!
//! ## Malformed Documents
//!
//! A document that cannot be normalized (no slug, no title, a field of the
//! wrong shape, an unparseable date) is skipped: [`normalize_page`] logs a
//! warning, records a [`MalformedDocument`] and keeps the rest of the page.
//! Nothing half-normalized ever reaches a [`PostSummary`].

use crate::listing::ListingPage;
use crate::richtext::{self, Block, Mode};
use crate::source::{RawDocument, RawPage};
use crate::types::PostSummary;
use chrono::{DateTime, FixedOffset, Locale};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Display pattern for publication dates: `19 mar 2021`.
const DATE_FORMAT: &str = "%d %b %Y";
const DATE_LOCALE: Locale = Locale::pt_BR;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("document {document}: {reason}")]
pub struct MalformedDocument {
    /// Content API id of the offending document.
    pub document: String,
    pub reason: String,
}

impl MalformedDocument {
    pub fn new(raw: &RawDocument, reason: impl Into<String>) -> Self {
        Self {
            document: raw.id.clone(),
            reason: reason.into(),
        }
    }
}

/// Parse a content API timestamp.
///
/// Accepts RFC 3339 (`2021-03-19T00:00:00Z`) and the API's own offset style
/// without a colon (`2021-03-25T19:25:28+0000`).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
}

/// Format a timestamp for display, in the timestamp's own offset.
pub fn format_date(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp
        .format_localized(DATE_FORMAT, DATE_LOCALE)
        .to_string()
}

/// Parse and format an optional publication date. Absent stays absent.
pub fn publication_date(raw: &RawDocument) -> Result<Option<String>, MalformedDocument> {
    raw.first_publication_date
        .as_deref()
        .map(|ts| {
            parse_timestamp(ts)
                .map(|dt| format_date(&dt))
                .map_err(|e| MalformedDocument::new(raw, format!("bad publication date {ts:?}: {e}")))
        })
        .transpose()
}

/// Read a rich-text field from the document data.
///
/// `Ok(None)` when the field is absent or null; an error when it is present
/// but not a valid block list.
pub fn rich_text_field(
    raw: &RawDocument,
    field: &str,
) -> Result<Option<Vec<Block>>, MalformedDocument> {
    match raw.data.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| MalformedDocument::new(raw, format!("field `{field}` is not rich text: {e}"))),
    }
}

/// Plain text of a required rich-text field.
pub fn required_text(raw: &RawDocument, field: &str) -> Result<String, MalformedDocument> {
    rich_text_field(raw, field)?
        .map(|blocks| richtext::flatten(&blocks, Mode::PlainText))
        .ok_or_else(|| MalformedDocument::new(raw, format!("missing field `{field}`")))
}

/// Plain text of an optional rich-text field, empty when absent.
pub fn optional_text(raw: &RawDocument, field: &str) -> Result<String, MalformedDocument> {
    Ok(rich_text_field(raw, field)?
        .map(|blocks| richtext::flatten(&blocks, Mode::PlainText))
        .unwrap_or_default())
}

/// Normalize one raw document into a listing entry.
pub fn summarize(raw: &RawDocument) -> Result<PostSummary, MalformedDocument> {
    let id = raw
        .slug()
        .ok_or_else(|| MalformedDocument::new(raw, "document has no slug"))?
        .to_string();
    Ok(PostSummary {
        id,
        published_at: publication_date(raw)?,
        title: required_text(raw, "title")?,
        subtitle: optional_text(raw, "subtitle")?,
        author: optional_text(raw, "author")?,
    })
}

/// Normalize a fetched page. Malformed documents are skipped and returned
/// alongside the page.
pub fn normalize_page(raw: RawPage) -> (ListingPage, Vec<MalformedDocument>) {
    let mut results = Vec::with_capacity(raw.results.len());
    let mut skipped = Vec::new();
    for doc in &raw.results {
        match summarize(doc) {
            Ok(summary) => results.push(summary),
            Err(err) => {
                warn!(document = %err.document, reason = %err.reason, "skipping malformed document");
                skipped.push(err);
            }
        }
    }
    let page = ListingPage {
        results,
        next_cursor: raw.next_page.filter(|c| !c.is_empty()),
    };
    (page, skipped)
}
