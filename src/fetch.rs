//! Content fetching.
//!
//! Stage 1 of the headless-blog build pipeline. Reads everything the site
//! needs from a [`ContentSource`] and produces a manifest for the generate
//! stage.
//!
//! ## Listing
//!
//! The first page comes from `query_by_type`; a [`Paginator`] seeded with it
//! then calls `load_more` until the cursor runs out. Page boundaries are kept
//! so the generate stage can emit the same pages the "load more" button
//! walks in the browser. Traversal stops after `source.max_pages` pages even
//! if the source keeps returning cursors.
//!
//! ## Articles
//!
//! Every identifier from `list_all_identifiers` is resolved through
//! [`ArticleState`]. Identifiers that no longer resolve are recorded as
//! missing; malformed documents are skipped like malformed listing entries.
//!
//! ## Output
//!
//! ```json
//! {
//!   "listing": [[{ "id": "como-utilizar-hooks", "title": "...", ... }], [...]],
//!   "articles": [{ "id": "como-utilizar-hooks", "sections": [...], "reading_time": 4, ... }],
//!   "missing": [],
//!   "skipped": [{ "document": "YFT...", "reason": "missing field `title`" }],
//!   "truncated": false,
//!   "config": { ... }
//! }
//! ```

use crate::article::{ArticleError, ArticleState};
use crate::config::SiteConfig;
use crate::listing::Paginator;
use crate::normalize::{self, MalformedDocument};
use crate::source::{ContentSource, SourceError};
use crate::types::{Article, PostSummary};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("failed to load article '{id}': {source}")]
    Article {
        id: String,
        #[source]
        source: SourceError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the generate stage needs, in one serializable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Listing pages in fetch order. Pages left empty by skipped documents
    /// are dropped.
    pub listing: Vec<Vec<PostSummary>>,
    pub articles: Vec<Article>,
    /// Identifiers listed by the source that resolved to not-found.
    #[serde(default)]
    pub missing: Vec<String>,
    #[serde(default)]
    pub skipped: Vec<MalformedDocument>,
    /// Set when listing traversal hit `source.max_pages`.
    #[serde(default)]
    pub truncated: bool,
    pub config: SiteConfig,
}

impl Manifest {
    pub fn post_count(&self) -> usize {
        self.listing.iter().map(Vec::len).sum()
    }
}

/// Fetch and normalize the listing plus every article.
pub async fn fetch(
    source: Arc<dyn ContentSource>,
    config: &SiteConfig,
) -> Result<Manifest, FetchError> {
    let doc_type = config.source.document_type.as_str();
    let (listing, mut skipped, truncated) = fetch_listing(source.clone(), config).await?;

    let ids = source.list_all_identifiers(doc_type).await?;
    debug!(source = source.name(), count = ids.len(), "resolving articles");

    let mut articles = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();
    for id in ids {
        match ArticleState::load(source.as_ref(), doc_type, &id).await {
            Ok(ArticleState::Ready(article)) => articles.push(*article),
            Ok(_) => missing.push(id),
            Err(ArticleError::Malformed(err)) => {
                warn!(document = %err.document, reason = %err.reason, "skipping malformed article");
                skipped.push(err);
            }
            Err(ArticleError::Source(source)) => return Err(FetchError::Article { id, source }),
        }
    }

    let manifest = Manifest {
        listing,
        articles,
        missing,
        skipped,
        truncated,
        config: config.clone(),
    };
    info!(
        posts = manifest.post_count(),
        pages = manifest.listing.len(),
        articles = manifest.articles.len(),
        skipped = manifest.skipped.len(),
        "fetch complete"
    );
    Ok(manifest)
}

async fn fetch_listing(
    source: Arc<dyn ContentSource>,
    config: &SiteConfig,
) -> Result<(Vec<Vec<PostSummary>>, Vec<MalformedDocument>, bool), FetchError> {
    let first = source
        .query_by_type(&config.source.document_type, config.source.page_size)
        .await?;
    let (page, mut skipped) = normalize::normalize_page(first);

    let mut pages = vec![page.results.len()];
    let mut paginator = Paginator::new(source);
    paginator.initialize(page);

    let max_pages = config.source.max_pages as usize;
    while paginator.has_more().await {
        if pages.len() >= max_pages {
            warn!(max_pages, "listing still has more pages, stopping traversal");
            break;
        }
        pages.push(paginator.load_more().await?);
    }
    let truncated = paginator.has_more().await;

    skipped.extend(paginator.skipped().await);
    let mut results = paginator.into_page().results.into_iter();
    let listing = pages
        .into_iter()
        .filter(|&len| len > 0)
        .map(|len| results.by_ref().take(len).collect())
        .collect();
    Ok((listing, skipped, truncated))
}

/// Write the manifest as pretty JSON, creating parent directories.
pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(manifest)?)?;
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<Manifest, FetchError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
