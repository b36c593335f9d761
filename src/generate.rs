//! HTML site generation.
//!
//! Stage 2 of the headless-blog build pipeline. Takes the fetch manifest and
//! generates the final static site.
//!
//! ## Generated Pages
//!
//! - **Index page** (`/index.html`): first listing page plus the "load more" button
//! - **Listing chunks** (`/posts/{n}.json`): every later listing page, pre-rendered
//! - **Article pages** (`/post/{id}/index.html`): banner, info line, sections
//! - **Not found page** (`/404.html`): shown for identifiers that don't resolve
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── 404.html
//! ├── posts/
//! │   ├── 2.json                 # {"html": "<article ...>", "next": "/posts/3.json"}
//! │   └── 3.json                 # {"html": "...", "next": null}
//! └── post/
//!     └── como-utilizar-hooks/
//!         └── index.html
//! ```
//!
//! ## Load More
//!
//! The listing button carries the URL of the next chunk in `data-next`.
//! `static/load-more.js` fetches it, appends `html` to the list and moves
//! `data-next` along; a null `next` removes the button. Chunks hold markup
//! rendered by [`render_summary`], so listing entries look the same whether
//! they were in `index.html` or loaded later.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping. Article
//! bodies are already HTML (escaped by the rich-text renderer) and are the
//! only markup inserted with `PreEscaped`.

use crate::article::ArticleState;
use crate::config::{self, SiteConfig, SiteInfo};
use crate::fetch::{self, FetchError, Manifest};
use crate::types::{Article, PostSummary, article_href};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not read manifest: {0}")]
    Manifest(#[from] FetchError),
}

/// One pre-rendered listing page, as served to the "load more" button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingChunk {
    pub html: String,
    /// URL of the following chunk, `None` on the last one.
    pub next: Option<String>,
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/load-more.js");

pub fn generate(manifest_path: &Path, output_dir: &Path) -> Result<(), GenerateError> {
    let manifest = fetch::read_manifest(manifest_path)?;
    generate_site(&manifest, output_dir)
}

/// Write the whole site for `manifest` into `output_dir`.
pub fn generate_site(manifest: &Manifest, output_dir: &Path) -> Result<(), GenerateError> {
    let css = site_css(&manifest.config);
    let site = &manifest.config.site;

    fs::create_dir_all(output_dir)?;

    let index_html = render_index(manifest, &css);
    fs::write(output_dir.join("index.html"), index_html.into_string())?;
    debug!("generated index.html");

    let total = manifest.listing.len();
    if total > 1 {
        fs::create_dir_all(output_dir.join("posts"))?;
    }
    for (idx, page) in manifest.listing.iter().enumerate().skip(1) {
        let chunk = ListingChunk {
            html: render_summaries(page).into_string(),
            next: next_chunk_url(idx, total),
        };
        fs::write(
            output_dir.join(chunk_path(idx)),
            serde_json::to_string(&chunk)?,
        )?;
    }
    debug!(chunks = total.saturating_sub(1), "generated listing chunks");

    let mut written = 0;
    for article in &manifest.articles {
        let Some(relative) = article_output_path(&article.id) else {
            warn!(id = %article.id, "article id is not a safe path segment, skipping page");
            continue;
        };
        let path = output_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let page = render_article_page(article, site, &css);
        fs::write(path, page.into_string())?;
        written += 1;
    }

    let not_found = render_not_found(site, &css);
    fs::write(output_dir.join("404.html"), not_found.into_string())?;

    info!(
        output = %output_dir.display(),
        articles = written,
        listing_pages = total,
        "site generated"
    );
    Ok(())
}

/// Color variables followed by the embedded stylesheet.
pub fn site_css(config: &SiteConfig) -> String {
    let color_css = config::generate_color_css(&config.colors);
    format!("{}\n\n{}", color_css, CSS_STATIC)
}

// ============================================================================
// Paths
// ============================================================================

/// Output path of listing page `idx` (0-based; page 0 lives in `index.html`).
pub fn chunk_path(idx: usize) -> String {
    format!("posts/{}.json", idx + 1)
}

fn next_chunk_url(idx: usize, total: usize) -> Option<String> {
    (idx + 1 < total).then(|| format!("/{}", chunk_path(idx + 1)))
}

/// Output path of an article page, or `None` when `id` would escape
/// the `post/` directory.
pub fn article_output_path(id: &str) -> Option<PathBuf> {
    let safe = !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
        && !id.chars().any(char::is_control);
    safe.then(|| Path::new("post").join(id).join("index.html"))
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(
    title: &str,
    description: Option<&str>,
    site: &SiteInfo,
    css: &str,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(site.lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                @if let Some(description) = description.filter(|d| !d.is_empty()) {
                    meta name="description" content=(description);
                }
                style { (PreEscaped(css)) }
            }
            body {
                (site_header(site))
                (content)
            }
        }
    }
}

/// Renders the site header: the site title as a logo linking home
fn site_header(site: &SiteInfo) -> Markup {
    html! {
        header.site-header {
            a.logo href="/" {
                (site.title) span.logo-dot { "." }
            }
        }
    }
}

/// Date, author and optional reading time, shared by listing and article.
fn info_line(published_at: Option<&str>, author: &str, reading_time: Option<u32>) -> Markup {
    html! {
        div.info {
            @if let Some(date) = published_at {
                time { (date) }
            }
            @if !author.is_empty() {
                span.author { (author) }
            }
            @if let Some(minutes) = reading_time {
                span.reading-time { (minutes) " min" }
            }
        }
    }
}

/// Renders one listing entry
pub fn render_summary(summary: &PostSummary) -> Markup {
    html! {
        article.post-summary {
            a href=(article_href(&summary.id)) {
                h2 { (summary.title) }
                @if !summary.subtitle.is_empty() {
                    p.subtitle { (summary.subtitle) }
                }
            }
            (info_line(summary.published_at.as_deref(), &summary.author, None))
        }
    }
}

fn render_summaries(summaries: &[PostSummary]) -> Markup {
    html! {
        @for summary in summaries {
            (render_summary(summary))
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the index page with the first listing page
fn render_index(manifest: &Manifest, css: &str) -> Markup {
    let site = &manifest.config.site;
    let first = manifest.listing.first().map(Vec::as_slice).unwrap_or_default();
    let next = next_chunk_url(0, manifest.listing.len());

    let content = html! {
        main.posts {
            div #posts {
                (render_summaries(first))
            }
            @if let Some(next) = next {
                button #load-more type="button"
                    data-next=(next)
                    data-loading-label=(site.loading_label) {
                    (site.load_more_label)
                }
            }
        }
        script { (PreEscaped(JS)) }
    };

    base_document(&format!("Posts | {}", site.title), None, site, css, content)
}

/// Renders an article page
pub fn render_article_page(article: &Article, site: &SiteInfo, css: &str) -> Markup {
    let content = html! {
        @if !article.banner_url.is_empty() {
            img.banner src=(article.banner_url) alt="";
        }
        main.article {
            h1 { (article.title) }
            (info_line(article.published_at.as_deref(), &article.author, Some(article.reading_time)))
            @for section in &article.sections {
                section.article-section {
                    @if !section.heading.is_empty() {
                        h2 { (section.heading) }
                    }
                    div.article-body {
                        (PreEscaped(&section.body_html))
                    }
                }
            }
        }
    };

    base_document(
        &format!("{} | {}", article.title, site.title),
        Some(&article.subtitle),
        site,
        css,
        content,
    )
}

/// Renders the not-found outcome
pub fn render_not_found(site: &SiteInfo, css: &str) -> Markup {
    let content = html! {
        main.not-found {
            h1 { (site.not_found_label) }
            a href="/" { (site.title) }
        }
    };
    base_document(&format!("{} | {}", site.not_found_label, site.title), None, site, css, content)
}

/// Renders the placeholder shown while an article is still resolving
pub fn render_loading(site: &SiteInfo, css: &str) -> Markup {
    let content = html! {
        main.loading {
            p { (site.loading_label) }
        }
    };
    base_document(&site.title, None, site, css, content)
}

/// Renders whichever page matches an article page state.
pub fn render_article_state(state: &ArticleState, config: &SiteConfig) -> Markup {
    let css = site_css(config);
    match state {
        ArticleState::Loading => render_loading(&config.site, &css),
        ArticleState::Ready(article) => render_article_page(article, &config.site, &css),
        ArticleState::NotFound(_) => render_not_found(&config.site, &css),
    }
}
