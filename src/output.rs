//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **content-centric**. The primary display for every entity
//! (listing entry, article) is its semantic identity, a positional index and
//! title, with identifiers and output paths shown as secondary context via
//! indented lines. This keeps the output readable as a content inventory
//! while still letting users trace entries back to the CMS.
//!
//! # Output Format
//!
//! ## Fetch
//!
//! ```text
//! Listing
//! Page 1
//!     001 Como utilizar Hooks
//!         Id: como-utilizar-hooks
//!         Published: 15 mar 2021
//! Page 2
//!     002 Criando um app CRA do zero
//!         Id: criando-um-app-cra-do-zero
//!         Published: draft
//!
//! Articles
//! 001 Como utilizar Hooks (4 min, 3 sections)
//!     Id: como-utilizar-hooks
//!
//! Skipped
//!     document YFT...: missing field `title`
//!
//! Fetched 2 posts on 2 pages, 1 article
//! ```
//!
//! ## Generate
//!
//! ```text
//! Home → index.html
//!     Page 2 → posts/2.json
//! 001 Como utilizar Hooks → post/como-utilizar-hooks/index.html
//! Not found → 404.html
//!
//! Generated 1 listing chunk, 1 article page
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::article::ArticleState;
use crate::fetch::Manifest;
use crate::generate::{article_output_path, chunk_path};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional detail.
///
/// ```text
/// 001 Como utilizar Hooks (4 min, 3 sections)
/// 001 Como utilizar Hooks
/// ```
fn entity_header(index: usize, title: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} ({})", format_index(index), title, d),
        None => format!("{} {}", format_index(index), title),
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

// ============================================================================
// Stage 1: Fetch output
// ============================================================================

/// Format fetch stage output: listing pages, articles and diagnostics.
pub fn format_fetch_output(manifest: &Manifest) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Listing".to_string());
    let mut position = 0;
    for (page_idx, page) in manifest.listing.iter().enumerate() {
        lines.push(format!("Page {}", page_idx + 1));
        for summary in page {
            position += 1;
            lines.push(format!("{}{}", indent(1), entity_header(position, &summary.title, None)));
            lines.push(format!("{}Id: {}", indent(2), summary.id));
            lines.push(format!(
                "{}Published: {}",
                indent(2),
                summary.published_at.as_deref().unwrap_or("draft")
            ));
            if !summary.subtitle.is_empty() {
                lines.push(format!("{}Subtitle: {}", indent(2), truncate(&summary.subtitle, 60)));
            }
        }
    }

    if !manifest.articles.is_empty() {
        lines.push(String::new());
        lines.push("Articles".to_string());
        for (i, article) in manifest.articles.iter().enumerate() {
            let detail = format!(
                "{} min, {}",
                article.reading_time,
                plural(article.sections.len(), "section", "sections")
            );
            lines.push(entity_header(i + 1, &article.title, Some(detail.as_str())));
            lines.push(format!("{}Id: {}", indent(1), article.id));
        }
    }

    if !manifest.missing.is_empty() {
        lines.push(String::new());
        lines.push("Missing".to_string());
        for id in &manifest.missing {
            lines.push(format!("{}{}", indent(1), id));
        }
    }

    if !manifest.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skipped in &manifest.skipped {
            lines.push(format!("{}{}", indent(1), skipped));
        }
    }

    lines.push(String::new());
    if manifest.truncated {
        lines.push(format!(
            "Listing stopped after {} (source.max_pages)",
            plural(manifest.listing.len(), "page", "pages")
        ));
    }
    lines.push(format!(
        "Fetched {} on {}, {}",
        plural(manifest.post_count(), "post", "posts"),
        plural(manifest.listing.len(), "page", "pages"),
        plural(manifest.articles.len(), "article", "articles"),
    ));

    lines
}

pub fn print_fetch_output(manifest: &Manifest) {
    for line in format_fetch_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Generate output
// ============================================================================

/// Format generate stage output: every written page and its path.
pub fn format_generate_output(manifest: &Manifest) -> Vec<String> {
    let mut lines = vec!["Home → index.html".to_string()];

    let chunks = manifest.listing.len().saturating_sub(1);
    for idx in 1..manifest.listing.len() {
        lines.push(format!("{}Page {} → {}", indent(1), idx + 1, chunk_path(idx)));
    }

    let mut pages = 0;
    for (i, article) in manifest.articles.iter().enumerate() {
        match article_output_path(&article.id) {
            Some(path) => {
                pages += 1;
                lines.push(format!(
                    "{} → {}",
                    entity_header(i + 1, &article.title, None),
                    path.display()
                ));
            }
            None => lines.push(format!(
                "{} → skipped (unsafe id {:?})",
                entity_header(i + 1, &article.title, None),
                article.id
            )),
        }
    }
    lines.push("Not found → 404.html".to_string());

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}",
        plural(chunks, "listing chunk", "listing chunks"),
        plural(pages, "article page", "article pages"),
    ));
    lines
}

pub fn print_generate_output(manifest: &Manifest) {
    for line in format_generate_output(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Single article
// ============================================================================

/// Format the outcome of resolving one article.
pub fn format_article_state(state: &ArticleState) -> Vec<String> {
    match state {
        ArticleState::Loading => vec!["Loading".to_string()],
        ArticleState::NotFound(id) => vec![format!("Not found: {id}")],
        ArticleState::Ready(article) => {
            let mut lines = vec![article.title.clone()];
            lines.push(format!("{}Id: {}", indent(1), article.id));
            lines.push(format!(
                "{}Published: {}",
                indent(1),
                article.published_at.as_deref().unwrap_or("draft")
            ));
            if !article.author.is_empty() {
                lines.push(format!("{}Author: {}", indent(1), article.author));
            }
            lines.push(format!("{}Reading time: {} min", indent(1), article.reading_time));
            for (i, section) in article.sections.iter().enumerate() {
                let words = plural(section.body_word_count, "word", "words");
                let heading = if section.heading.is_empty() {
                    "(untitled)"
                } else {
                    section.heading.as_str()
                };
                lines.push(format!("{}{}", indent(1), entity_header(i + 1, heading, Some(words.as_str()))));
            }
            lines
        }
    }
}

pub fn print_article_state(state: &ArticleState) {
    for line in format_article_state(state) {
        println!("{}", line);
    }
}
