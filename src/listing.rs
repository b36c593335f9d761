//! Incremental listing pagination.
//!
//! The content API returns posts a page at a time, each page carrying an
//! opaque cursor to the next one. [`Paginator`] keeps the posts seen so far
//! and walks the cursor chain one [`Paginator::load_more`] at a time:
//!
//! ```text
//! initialize(page 1)   results = [a]        cursor = c2
//! load_more()          results = [a, b]     cursor = c3
//! load_more()          results = [a, b, c]  cursor = None
//! load_more()          no-op, returns 0
//! ```
//!
//! Results are only ever appended. A failed fetch leaves both the results and
//! the cursor untouched so the caller can simply retry.
//!
//! ## Double Fetch Guard
//!
//! State sits behind an async mutex that `load_more` holds for the whole
//! fetch. A second `load_more` arriving while the first is still waiting on
//! the network finds the lock taken and returns `Ok(0)` immediately instead of
//! fetching (and appending) the same page twice.

use crate::normalize::{self, MalformedDocument};
use crate::source::{ContentSource, SourceError};
use crate::types::PostSummary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A window over the listing: the posts fetched so far plus where to go next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPage {
    pub results: Vec<PostSummary>,
    /// `None` once the last page has been fetched.
    pub next_cursor: Option<String>,
}

impl ListingPage {
    pub fn has_more(&self) -> bool {
        self.next_cursor.as_deref().is_some_and(|c| !c.is_empty())
    }
}

#[derive(Debug, Default)]
struct State {
    page: ListingPage,
    skipped: Vec<MalformedDocument>,
}

pub struct Paginator {
    source: Arc<dyn ContentSource>,
    state: Mutex<State>,
}

impl Paginator {
    /// An empty, exhausted paginator. Call [`Paginator::initialize`] to seed it.
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            state: Mutex::new(State::default()),
        }
    }

    /// Replace the state with an already fetched (and normalized) page.
    pub fn initialize(&mut self, page: ListingPage) {
        let state = self.state.get_mut();
        state.page = page;
        state.skipped.clear();
    }

    /// Fetch the next page and append its posts.
    ///
    /// Returns how many posts were appended: `0` when there is nothing left
    /// to load or another load is already in flight.
    pub async fn load_more(&self) -> Result<usize, SourceError> {
        let Ok(mut state) = self.state.try_lock() else {
            debug!("load_more already in flight, ignoring");
            return Ok(0);
        };
        let Some(cursor) = state.page.next_cursor.clone().filter(|c| !c.is_empty()) else {
            return Ok(0);
        };

        debug!(source = self.source.name(), %cursor, "loading next listing page");
        let raw = self.source.fetch_page(&cursor).await.inspect_err(|err| {
            warn!(%cursor, error = %err, "failed to load listing page");
        })?;

        let (next, skipped) = normalize::normalize_page(raw);
        let appended = next.results.len();
        state.page.results.extend(next.results);
        state.page.next_cursor = next.next_cursor;
        state.skipped.extend(skipped);
        Ok(appended)
    }

    pub async fn has_more(&self) -> bool {
        self.state.lock().await.page.has_more()
    }

    /// Snapshot of every post loaded so far, in fetch order.
    pub async fn results(&self) -> Vec<PostSummary> {
        self.state.lock().await.page.results.clone()
    }

    /// Documents dropped by normalization during `load_more` calls.
    pub async fn skipped(&self) -> Vec<MalformedDocument> {
        self.state.lock().await.skipped.clone()
    }

    pub fn into_page(self) -> ListingPage {
        self.state.into_inner().page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FixtureSource;
    use crate::test_helpers::{ScriptedSource, raw_page, raw_post, summary};
    use serde_json::json;
    use std::time::Duration;

    fn ids(results: &[PostSummary]) -> Vec<&str> {
        results.iter().map(|s| s.id.as_str()).collect()
    }

    fn seeded(source: Arc<dyn ContentSource>, ids: &[&str], cursor: Option<&str>) -> Paginator {
        let mut paginator = Paginator::new(source);
        paginator.initialize(ListingPage {
            results: ids.iter().map(|id| summary(id)).collect(),
            next_cursor: cursor.map(str::to_string),
        });
        paginator
    }

    #[test]
    fn has_more_requires_non_empty_cursor() {
        let mut page = ListingPage::default();
        assert!(!page.has_more());
        page.next_cursor = Some(String::new());
        assert!(!page.has_more());
        page.next_cursor = Some("c2".into());
        assert!(page.has_more());
    }

    #[tokio::test]
    async fn new_paginator_is_exhausted() {
        let paginator = Paginator::new(Arc::new(FixtureSource::default()));
        assert!(!paginator.has_more().await);
        assert_eq!(paginator.load_more().await.unwrap(), 0);
        assert!(paginator.results().await.is_empty());
    }

    #[tokio::test]
    async fn load_more_without_cursor_is_a_no_op() {
        let source = Arc::new(ScriptedSource::default());
        let paginator = seeded(source.clone(), &["a", "b"], None);

        for _ in 0..3 {
            assert_eq!(paginator.load_more().await.unwrap(), 0);
        }
        assert_eq!(ids(&paginator.results().await), vec!["a", "b"]);
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test]
    async fn empty_cursor_counts_as_terminal() {
        let source = Arc::new(ScriptedSource::default());
        let paginator = seeded(source.clone(), &["a"], Some(""));
        assert!(!paginator.has_more().await);
        assert_eq!(paginator.load_more().await.unwrap(), 0);
        assert_eq!(source.fetches(), 0);
    }

    #[tokio::test]
    async fn appends_pages_in_fetch_order() {
        let source = Arc::new(
            ScriptedSource::default()
                .with_page("c2", raw_page(vec![raw_post("b", "B"), raw_post("c", "C")], Some("c3")))
                .with_page("c3", raw_page(vec![raw_post("d", "D")], None)),
        );
        let paginator = seeded(source.clone(), &["a"], Some("c2"));

        assert_eq!(paginator.load_more().await.unwrap(), 2);
        assert!(paginator.has_more().await);
        assert_eq!(paginator.load_more().await.unwrap(), 1);
        assert!(!paginator.has_more().await);
        assert_eq!(paginator.load_more().await.unwrap(), 0);

        assert_eq!(ids(&paginator.results().await), vec!["a", "b", "c", "d"]);
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn appended_entries_are_normalized() {
        let source = Arc::new(
            ScriptedSource::default().with_page("c2", raw_page(vec![raw_post("b", "Título")], None)),
        );
        let paginator = seeded(source, &[], Some("c2"));
        paginator.load_more().await.unwrap();

        let results = paginator.results().await;
        assert_eq!(results[0].title, "Título");
        assert_eq!(results[0].published_at.as_deref(), Some("15 mar 2021"));
        assert_eq!(results[0], normalize::summarize(&raw_post("b", "Título")).unwrap());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_state_unchanged() {
        let source = Arc::new(ScriptedSource::default().failing("c2"));
        let paginator = seeded(source.clone(), &["a"], Some("c2"));

        let err = paginator.load_more().await.unwrap_err();
        assert!(matches!(err, SourceError::Timeout));
        assert_eq!(ids(&paginator.results().await), vec!["a"]);
        assert!(paginator.has_more().await);
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn retry_after_failure_succeeds() {
        let source = Arc::new(
            ScriptedSource::default()
                .failing_once("c2")
                .with_page("c2", raw_page(vec![raw_post("b", "B")], None)),
        );
        let paginator = seeded(source.clone(), &["a"], Some("c2"));

        assert!(paginator.load_more().await.is_err());
        assert_eq!(paginator.load_more().await.unwrap(), 1);
        assert_eq!(ids(&paginator.results().await), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn malformed_documents_are_skipped_and_recorded() {
        let mut broken = raw_post("broken", "Broken");
        broken.data["title"] = json!({ "not": "rich text" });
        let source = Arc::new(
            ScriptedSource::default()
                .with_page("c2", raw_page(vec![broken, raw_post("b", "B")], None)),
        );
        let paginator = seeded(source, &["a"], Some("c2"));

        assert_eq!(paginator.load_more().await.unwrap(), 1);
        assert_eq!(ids(&paginator.results().await), vec!["a", "b"]);
        assert_eq!(paginator.skipped().await.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_load_more_fetches_once() {
        let source = Arc::new(
            ScriptedSource::default()
                .with_delay(Duration::from_millis(50))
                .with_page("c2", raw_page(vec![raw_post("b", "B")], Some("c3")))
                .with_page("c3", raw_page(vec![raw_post("c", "C")], None)),
        );
        let paginator = seeded(source.clone(), &["a"], Some("c2"));

        let (first, second) = tokio::join!(paginator.load_more(), paginator.load_more());
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 0);
        assert_eq!(ids(&paginator.results().await), vec!["a", "b"]);
        assert_eq!(source.fetches(), 1);

        // The guard only covers overlapping calls; the next one proceeds.
        assert_eq!(paginator.load_more().await.unwrap(), 1);
        assert_eq!(ids(&paginator.results().await), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn walks_a_fixture_source_to_the_end() {
        let source = FixtureSource::from_documents(
            ["a", "b", "c", "d", "e"].iter().map(|id| raw_post(id, id)).collect(),
        );
        let first = source.query_by_type("posts", 2).await.unwrap();
        let (page, _) = normalize::normalize_page(first);

        let mut paginator = Paginator::new(Arc::new(source));
        paginator.initialize(page);
        let mut counts = Vec::new();
        while paginator.has_more().await {
            counts.push(paginator.load_more().await.unwrap());
        }

        assert_eq!(counts, vec![2, 1]);
        let page = paginator.into_page();
        assert_eq!(ids(&page.results), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(page.next_cursor, None);
    }
}
