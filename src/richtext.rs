//! Rich-text flattening.
//!
//! The content API stores formatted text as an ordered array of blocks, each
//! carrying its plain `text` plus a list of `spans` that mark character ranges
//! as bold, italic, linked, or labelled:
//!
//! ```json
//! [
//!   { "type": "heading2", "text": "Hooks", "spans": [] },
//!   { "type": "paragraph", "text": "Use them wisely",
//!     "spans": [{ "start": 4, "end": 8, "type": "strong" }] }
//! ]
//! ```
//!
//! Everything else in the crate sees rich text only through [`flatten`], which
//! turns a block list into either plain text or HTML. Keeping the external
//! format behind one function means the listing, the article renderer and the
//! word counter can never disagree on what a field "says".
//!
//! ## HTML Mapping
//!
//! | Block | HTML |
//! |-------|------|
//! | `paragraph` | `<p>` |
//! | `heading1`..`heading6` | `<h1>`..`<h6>` |
//! | `preformatted` | `<pre>` |
//! | `list-item` / `o-list-item` | `<li>`, consecutive items grouped in `<ul>` / `<ol>` |
//! | `image` | `<p class="block-img"><img></p>` |
//! | `embed` | `<div data-oembed>` with a link to the embedded resource |
//! | anything else | `<p>` |
//!
//! Spans nest as `<strong>`, `<em>`, `<a>` and `<span class="label">`.
//! Overlapping spans are split so the output is always well formed. HTML is
//! built with maud, so every piece of text and every attribute is escaped.

use crate::types::article_href;
use maud::{Markup, html};
use serde::Deserialize;
use std::collections::VecDeque;

/// Output flavour for [`flatten`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Block texts joined with a single space, no markup.
    PlainText,
    /// Block-level HTML with inline spans applied.
    Html,
}

/// One block of a rich-text field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image source (image blocks only).
    #[serde(default)]
    pub url: Option<String>,
    /// Image alt text (image blocks only).
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub oembed: Option<Oembed>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Other,
}

/// Payload of hyperlink and label spans.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpanData {
    pub link_type: Option<String>,
    pub url: Option<String>,
    pub target: Option<String>,
    /// Set on links to other documents of the repository.
    pub uid: Option<String>,
    pub label: Option<String>,
}

impl SpanData {
    /// Resolve the link target, rejecting schemes that could run script.
    fn href(&self) -> Option<String> {
        if let Some(url) = self.url.as_deref() {
            return is_safe_href(url).then(|| url.to_string());
        }
        self.uid.as_deref().map(article_href)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Oembed {
    pub embed_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub provider_name: Option<String>,
    pub title: Option<String>,
}

fn is_safe_href(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    match lower.split_once(':') {
        // No scheme, or a colon that only appears after a path/query/fragment
        // delimiter: relative reference.
        None => true,
        Some((scheme, _)) if scheme.contains(['/', '?', '#']) => true,
        Some((scheme, _)) => matches!(scheme, "http" | "https" | "mailto" | "tel"),
    }
}

/// Flatten a rich-text field to plain text or HTML.
pub fn flatten(blocks: &[Block], mode: Mode) -> String {
    match mode {
        Mode::PlainText => as_text(blocks),
        Mode::Html => as_html(blocks).into_string(),
    }
}

fn as_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(|b| b.text.as_deref())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Count words the way the reading-time estimate expects: trim, then split on
/// single spaces. Blank text has no words.
pub fn word_count(text: &str) -> usize {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        0
    } else {
        trimmed.split(' ').count()
    }
}

// ============================================================================
// HTML
// ============================================================================

/// Consecutive list items render inside one list element.
enum Group<'a> {
    Single(&'a Block),
    List { ordered: bool, items: Vec<&'a Block> },
}

fn group_blocks(blocks: &[Block]) -> Vec<Group<'_>> {
    let mut groups: Vec<Group<'_>> = Vec::new();
    for block in blocks {
        let ordered = match block.kind {
            BlockKind::ListItem => false,
            BlockKind::OListItem => true,
            _ => {
                groups.push(Group::Single(block));
                continue;
            }
        };
        match groups.last_mut() {
            Some(Group::List {
                ordered: current,
                items,
            }) if *current == ordered => items.push(block),
            _ => groups.push(Group::List {
                ordered,
                items: vec![block],
            }),
        }
    }
    groups
}

fn as_html(blocks: &[Block]) -> Markup {
    html! {
        @for group in group_blocks(blocks) {
            @match group {
                Group::Single(block) => { (render_block(block)) }
                Group::List { ordered: true, items } => {
                    ol { @for item in items { li { (render_inline(item)) } } }
                }
                Group::List { ordered: false, items } => {
                    ul { @for item in items { li { (render_inline(item)) } } }
                }
            }
        }
    }
}

fn render_block(block: &Block) -> Markup {
    match block.kind {
        BlockKind::Heading1 => html! { h1 { (render_inline(block)) } },
        BlockKind::Heading2 => html! { h2 { (render_inline(block)) } },
        BlockKind::Heading3 => html! { h3 { (render_inline(block)) } },
        BlockKind::Heading4 => html! { h4 { (render_inline(block)) } },
        BlockKind::Heading5 => html! { h5 { (render_inline(block)) } },
        BlockKind::Heading6 => html! { h6 { (render_inline(block)) } },
        BlockKind::Preformatted => html! { pre { (render_inline(block)) } },
        BlockKind::Image => {
            let src = block.url.as_deref().unwrap_or_default();
            let alt = block.alt.as_deref().unwrap_or_default();
            html! { p.block-img { img src=(src) alt=(alt); } }
        }
        BlockKind::Embed => {
            let oembed = block.oembed.clone().unwrap_or_default();
            let url = oembed.embed_url.filter(|u| is_safe_href(u));
            html! {
                div data-oembed=[url.as_deref()]
                    data-oembed-type=[oembed.kind.as_deref()]
                    data-oembed-provider=[oembed.provider_name.as_deref()] {
                    @if let Some(url) = &url {
                        a href=(url) target="_blank" rel="noopener noreferrer" {
                            (oembed.title.as_deref().unwrap_or(url))
                        }
                    }
                }
            }
        }
        BlockKind::Paragraph | BlockKind::ListItem | BlockKind::OListItem | BlockKind::Other => {
            html! { p { (render_inline(block)) } }
        }
    }
}

/// A span clipped to a character range. `span` indexes `Block::spans`.
#[derive(Debug, Clone, Copy)]
struct Cut {
    start: usize,
    end: usize,
    span: usize,
}

enum Inline<'a> {
    Text(&'a str),
    Span {
        span: &'a Span,
        children: Vec<Inline<'a>>,
    },
}

fn sort_cuts(cuts: &mut [Cut]) {
    // Outer spans first: earliest start, then longest.
    cuts.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.end.cmp(&a.end))
            .then(a.span.cmp(&b.span))
    });
}

/// Build the span tree for `range` (in characters). Spans reaching past the
/// end of an enclosing span are split at its boundary.
fn build_tree<'a>(
    text: &'a str,
    offsets: &[usize],
    spans: &'a [Span],
    range: (usize, usize),
    mut cuts: Vec<Cut>,
) -> Vec<Inline<'a>> {
    sort_cuts(&mut cuts);
    let mut queue: VecDeque<Cut> = cuts.into();
    let mut nodes = Vec::new();
    let mut cursor = range.0;

    while let Some(outer) = queue.pop_front() {
        if outer.start > cursor {
            nodes.push(Inline::Text(&text[offsets[cursor]..offsets[outer.start]]));
        }

        let mut inner = Vec::new();
        let mut carried = Vec::new();
        while let Some(next) = queue.front().copied() {
            if next.start >= outer.end {
                break;
            }
            queue.pop_front();
            if next.end <= outer.end {
                inner.push(next);
            } else {
                inner.push(Cut {
                    end: outer.end,
                    ..next
                });
                carried.push(Cut {
                    start: outer.end,
                    ..next
                });
            }
        }

        let children = build_tree(text, offsets, spans, (outer.start, outer.end), inner);
        nodes.push(Inline::Span {
            span: &spans[outer.span],
            children,
        });
        cursor = outer.end;

        if !carried.is_empty() {
            queue.extend(carried);
            sort_cuts(queue.make_contiguous());
        }
    }

    if cursor < range.1 {
        nodes.push(Inline::Text(&text[offsets[cursor]..offsets[range.1]]));
    }
    nodes
}

fn render_inline(block: &Block) -> Markup {
    let text = block.text.as_deref().unwrap_or_default();
    // Byte offset of every character boundary, plus the end of the string.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = offsets.len() - 1;

    let cuts = block
        .spans
        .iter()
        .enumerate()
        .map(|(i, s)| Cut {
            start: s.start.min(len),
            end: s.end.min(len),
            span: i,
        })
        .filter(|c| c.start < c.end)
        .collect();

    render_nodes(&build_tree(text, &offsets, &block.spans, (0, len), cuts))
}

fn render_nodes(nodes: &[Inline<'_>]) -> Markup {
    html! {
        @for node in nodes {
            @match node {
                Inline::Text(text) => { (render_text(text)) }
                Inline::Span { span, children } => { (render_span(span, render_nodes(children))) }
            }
        }
    }
}

fn render_text(text: &str) -> Markup {
    html! {
        @for (i, line) in text.split('\n').enumerate() {
            @if i > 0 { br; }
            (line)
        }
    }
}

fn render_span(span: &Span, inner: Markup) -> Markup {
    let data = span.data.clone().unwrap_or_default();
    match span.kind {
        SpanKind::Strong => html! { strong { (inner) } },
        SpanKind::Em => html! { em { (inner) } },
        SpanKind::Hyperlink => match data.href() {
            Some(href) => {
                let target = data.target.as_deref();
                let rel = target.map(|_| "noopener noreferrer");
                html! { a href=(href) target=[target] rel=[rel] { (inner) } }
            }
            None => inner,
        },
        SpanKind::Label => html! { span class=[data.label.as_deref()] { (inner) } },
        SpanKind::Other => inner,
    }
}
