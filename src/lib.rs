//! # Headless Blog
//!
//! A static blog front-end over a headless CMS. Articles live in the CMS;
//! this crate reads them through a content API, normalizes them and writes
//! a plain static site: a paginated listing with a "load more" button and
//! one page per article with a reading-time estimate.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! Content flows through two independent stages, joined by a JSON manifest:
//!
//! ```text
//! 1. Fetch     content API  →  manifest.json   (normalized listing + rendered articles)
//! 2. Generate  manifest     →  dist/           (final HTML site)
//! ```
//!
//! - **Debuggability**: the manifest is human-readable JSON you can inspect.
//! - **Offline generation**: stage 2 never touches the network, so templates
//!   can be iterated on without re-fetching.
//! - **Testability**: normalization and rendering are pure functions over
//!   raw documents, and every source-facing component takes an
//!   `Arc<dyn ContentSource>` that tests replace with an in-memory one.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`source`] | `ContentSource` trait, the HTTP API client and the JSON fixture source |
//! | [`richtext`] | Rich-text blocks and spans, flattened to plain text or HTML |
//! | [`normalize`] | Raw document → `PostSummary`, pt-BR date formatting, malformed-document policy |
//! | [`listing`] | `Paginator`: append-only listing with guarded `load_more` |
//! | [`article`] | Article rendering, reading time, detail page state machine |
//! | [`fetch`] | Stage 1: drives the paginator and renders every article into a manifest |
//! | [`generate`] | Stage 2: renders the site from the manifest using Maud |
//! | [`config`] | `config.toml` loading, validation, merging, env overrides and CSS generation |
//! | [`types`] | Display types serialized between stages (`PostSummary`, `Article`) |
//! | [`output`] | CLI output formatting of pipeline results |
//!
//! # Design Decisions
//!
//! ## One Normalization Path
//!
//! Listing entries reach the page two ways: in the first page rendered into
//! `index.html`, and through "load more". Both go through
//! [`normalize::summarize`]. The browser never normalizes anything itself: the
//! "load more" button fetches listing pages that were pre-rendered at build
//! time (`posts/{n}.json`), so an entry looks the same whichever way it
//! arrived.
//!
//! ## Skip, Don't Fail, On Malformed Documents
//!
//! One document with a missing title should not take the whole blog down.
//! Documents that cannot be normalized are skipped, logged with `tracing`,
//! and listed in the manifest so `check` can report them. Transport errors,
//! on the other hand, fail the build: a half-fetched listing is worse than
//! none.
//!
//! ## Explicit Sources
//!
//! There is no global API client. `main` builds one source (HTTP or fixture)
//! and passes it down; everything else only sees the trait.

pub mod article;
pub mod config;
pub mod fetch;
pub mod generate;
pub mod listing;
pub mod normalize;
pub mod output;
pub mod richtext;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
