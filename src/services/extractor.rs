//! HTML article extraction
//!
//! Pulls metadata and readable body text out of a page using CSS selectors.
//! Every field has a priority-ordered list of sources; the first non-empty
//! value wins.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::ArticleData;

/// Extracted body text must be at least this many characters.
const MIN_CONTENT_CHARS: usize = 100;

const NOISE_SELECTOR: &str =
    "script, style, noscript, nav, header, footer, aside, .ad, .advertisement";

/// Elements whose boundaries break the text onto a new line.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section", "table",
    "td", "th", "tr", "ul",
];

const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[role='main']",
    ".post-content",
    ".article-content",
    ".entry-content",
    "main",
    "#content",
];

#[derive(Clone, Copy)]
enum Source {
    Attr(&'static str, &'static str),
    Text(&'static str),
}

const TITLE: &[Source] = &[
    Source::Attr(r#"meta[property="og:title"]"#, "content"),
    Source::Attr(r#"meta[name="twitter:title"]"#, "content"),
    Source::Text("title"),
    Source::Text("h1"),
];

const DESCRIPTION: &[Source] = &[
    Source::Attr(r#"meta[property="og:description"]"#, "content"),
    Source::Attr(r#"meta[name="description"]"#, "content"),
    Source::Attr(r#"meta[name="twitter:description"]"#, "content"),
];

const PUBLISHED_AT: &[Source] = &[
    Source::Attr(r#"meta[property="article:published_time"]"#, "content"),
    Source::Attr(r#"meta[name="publishdate"]"#, "content"),
    Source::Attr("time[datetime]", "datetime"),
];

const AUTHOR: &[Source] = &[
    Source::Attr(r#"meta[name="author"]"#, "content"),
    Source::Attr(r#"meta[property="article:author"]"#, "content"),
    Source::Text(".author"),
];

const OG_IMAGE: &[Source] = &[
    Source::Attr(r#"meta[property="og:image"]"#, "content"),
    Source::Attr(r#"meta[name="twitter:image"]"#, "content"),
];

const FAVICON: &[Source] = &[
    Source::Attr(r#"link[rel="icon"]"#, "href"),
    Source::Attr(r#"link[rel="shortcut icon"]"#, "href"),
];

/// Extract an article from raw HTML fetched from `url`.
///
/// Fails with [`AppError::Parsing`] when no title is found or the body text
/// is shorter than [`MIN_CONTENT_CHARS`].
pub fn extract_article(html: &str, url: &str) -> Result<ArticleData> {
    let mut document = Html::parse_document(html);

    // Metadata first: header/nav stripping below can remove the only <h1>.
    let title = first_match(&document, TITLE).unwrap_or_default();
    let description = first_match(&document, DESCRIPTION);
    let published_at = first_match(&document, PUBLISHED_AT);
    let author = first_match(&document, AUTHOR);
    let og_image = first_match(&document, OG_IMAGE);
    let favicon = first_match(&document, FAVICON).and_then(|href| resolve_url(&href, url));

    strip_noise(&mut document);
    let content = extract_content(&document);

    if title.is_empty() {
        return Err(AppError::Parsing("article title is missing".to_string()));
    }
    let content_chars = content.chars().count();
    if content_chars < MIN_CONTENT_CHARS {
        return Err(AppError::Parsing(format!(
            "article content is too short ({} chars)",
            content_chars
        )));
    }

    Ok(ArticleData {
        url: url.to_string(),
        title,
        description,
        content,
        author,
        published_at,
        og_image,
        favicon,
    })
}

/// Body text: first content container with substantial text, else the whole body.
fn extract_content(document: &Html) -> String {
    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        let text = document
            .select(&selector)
            .map(element_text)
            .collect::<Vec<_>>()
            .join("\n");
        let cleaned = normalize_whitespace(&text);
        if cleaned.chars().count() > MIN_CONTENT_CHARS {
            tracing::debug!("Content extracted from '{}'", selector_str);
            return cleaned;
        }
    }

    tracing::debug!("No content container matched, using full page text");
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .map(element_text)
        .unwrap_or_else(|| element_text(document.root_element()));
    normalize_whitespace(&body)
}

fn first_match(document: &Html, sources: &[Source]) -> Option<String> {
    sources.iter().find_map(|source| {
        let (selector_str, attr) = match *source {
            Source::Attr(selector, attr) => (selector, Some(attr)),
            Source::Text(selector) => (selector, None),
        };
        let selector = Selector::parse(selector_str).ok()?;
        let element = document.select(&selector).next()?;
        let value = match attr {
            Some(attr) => element.value().attr(attr)?.to_string(),
            None => element_text(element),
        };
        let value = collapse_spaces(&value);
        (!value.is_empty()).then_some(value)
    })
}

/// Rendered text of an element.
///
/// Whitespace inside a text node (source line wrapping included) becomes a
/// single space; adjacent text nodes are joined without a separator. Only
/// block element boundaries produce newlines.
fn element_text(element: ElementRef) -> String {
    let mut out = String::new();
    append_text(element, &mut out);
    out
}

fn append_text(element: ElementRef, out: &mut String) {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));

    let is_block = BLOCK_ELEMENTS.contains(&element.value().name());
    if is_block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(&whitespace.replace_all(text, " "));
        } else if let Some(child_element) = ElementRef::wrap(child) {
            append_text(child_element, out);
        }
    }
    if is_block {
        out.push('\n');
    }
}

fn strip_noise(document: &mut Html) {
    let Ok(selector) = Selector::parse(NOISE_SELECTOR) else {
        return;
    };
    let ids: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn resolve_url(href: &str, base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    base.join(href.trim()).ok().map(|u| u.to_string())
}

/// Collapse runs of spaces to one space and runs of newlines to one newline.
fn normalize_whitespace(text: &str) -> String {
    static HORIZONTAL: OnceLock<Regex> = OnceLock::new();
    static NEWLINES: OnceLock<Regex> = OnceLock::new();

    let horizontal = HORIZONTAL.get_or_init(|| Regex::new(r"[^\S\n]+").expect("valid regex"));
    let newlines = NEWLINES.get_or_init(|| Regex::new(r"\s*\n\s*").expect("valid regex"));

    let collapsed = horizontal.replace_all(text, " ");
    newlines.replace_all(&collapsed, "\n").trim().to_string()
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAGRAPH: &str = "Researchers published a detailed study on battery chemistry this week. \
        The findings suggest that solid-state cells could reach mass production sooner than expected, \
        with several manufacturers already retooling their plants.";

    fn page(head: &str, body: &str) -> String {
        format!("<!DOCTYPE html><html><head>{}</head><body>{}</body></html>", head, body)
    }

    #[test]
    fn test_prefers_open_graph_title() {
        let html = page(
            r#"<meta property="og:title" content="  OG Title  "><title>Page Title</title>"#,
            &format!("<h1>Heading</h1><article><p>{}</p></article>", PARAGRAPH),
        );
        let article = extract_article(&html, "https://example.com/a").unwrap();
        assert_eq!(article.title, "OG Title");
    }

    #[test]
    fn test_title_falls_back_to_heading() {
        let html = page("", &format!("<h1>Only Heading</h1><article><p>{}</p></article>", PARAGRAPH));
        let article = extract_article(&html, "https://example.com/a").unwrap();
        assert_eq!(article.title, "Only Heading");
    }

    #[test]
    fn test_metadata_fields() {
        let html = page(
            r#"<title>T</title>
               <meta name="description" content="A short description">
               <meta name="author" content="Jane Writer">
               <meta property="article:published_time" content="2024-05-01T09:00:00Z">
               <meta property="og:image" content="https://cdn.example.com/cover.png">
               <link rel="icon" href="/favicon.ico">"#,
            &format!("<article><p>{}</p></article>", PARAGRAPH),
        );
        let article = extract_article(&html, "https://example.com/posts/1").unwrap();
        assert_eq!(article.description.as_deref(), Some("A short description"));
        assert_eq!(article.author.as_deref(), Some("Jane Writer"));
        assert_eq!(article.published_at.as_deref(), Some("2024-05-01T09:00:00Z"));
        assert_eq!(article.og_image.as_deref(), Some("https://cdn.example.com/cover.png"));
        assert_eq!(article.favicon.as_deref(), Some("https://example.com/favicon.ico"));
    }

    #[test]
    fn test_time_element_used_for_published_date() {
        let html = page(
            "<title>T</title>",
            &format!(r#"<article><time datetime="2023-12-24">Dec 24</time><p>{}</p></article>"#, PARAGRAPH),
        );
        let article = extract_article(&html, "https://example.com/").unwrap();
        assert_eq!(article.published_at.as_deref(), Some("2023-12-24"));
    }

    #[test]
    fn test_noise_removed_from_content() {
        let html = page(
            "<title>T</title><style>body { color: red; }</style>",
            &format!(
                r#"<nav>Navigation links</nav>
                   <article><p>{}</p><div class="ad">Buy now</div><script>track()</script></article>
                   <footer>Footer text</footer>"#,
                PARAGRAPH
            ),
        );
        let article = extract_article(&html, "https://example.com/").unwrap();
        assert!(article.content.contains("solid-state cells"));
        assert!(!article.content.contains("Navigation"));
        assert!(!article.content.contains("Buy now"));
        assert!(!article.content.contains("track()"));
        assert!(!article.content.contains("Footer"));
    }

    #[test]
    fn test_short_container_falls_through_to_next_selector() {
        let html = page(
            "<title>T</title>",
            &format!(
                r#"<article><p>Too short.</p></article><div class="entry-content"><p>{}</p></div>"#,
                PARAGRAPH
            ),
        );
        let article = extract_article(&html, "https://example.com/").unwrap();
        assert!(article.content.starts_with("Researchers published"));
        assert!(!article.content.contains("Too short."));
    }

    #[test]
    fn test_full_page_fallback() {
        let html = page("<title>T</title>", &format!("<div><p>{}</p></div>", PARAGRAPH));
        let article = extract_article(&html, "https://example.com/").unwrap();
        assert!(article.content.contains("battery chemistry"));
    }

    #[test]
    fn test_short_content_is_parsing_error() {
        let html = page("<title>Short</title>", "<article><p>Hello world.</p></article>");
        let err = extract_article(&html, "https://example.com/").unwrap_err();
        assert!(matches!(err, AppError::Parsing(_)));
    }

    #[test]
    fn test_missing_title_is_parsing_error() {
        let html = page("", &format!("<article><p>{}</p></article>", PARAGRAPH));
        let err = extract_article(&html, "https://example.com/").unwrap_err();
        assert!(matches!(err, AppError::Parsing(_)));
    }

    #[test]
    fn test_inline_markup_keeps_words_whole() {
        let html = page(
            "<title>T</title>",
            &format!(
                r#"<article><p>The <b>im</b>portant finding is that battery cells from <a href="/acme">Acme</a>, a large maker, are <em>cheaper</em>.</p><p>{}</p></article>"#,
                PARAGRAPH
            ),
        );
        let article = extract_article(&html, "https://example.com/").unwrap();
        assert!(article.content.contains("The important finding"));
        assert!(article.content.contains("from Acme, a large maker, are cheaper."));
    }

    #[test]
    fn test_source_line_wrapping_is_not_a_line_break() {
        let html = page(
            "<title>T</title>",
            "<article><h2>Heading</h2><p>Researchers published a detailed study on battery\n        chemistry this week, and the findings suggest solid-state cells\n        could arrive sooner than expected.</p><p>Second paragraph.</p></article>",
        );
        let article = extract_article(&html, "https://example.com/").unwrap();
        assert_eq!(
            article.content,
            "Heading\nResearchers published a detailed study on battery chemistry this week, \
             and the findings suggest solid-state cells could arrive sooner than expected.\n\
             Second paragraph."
        );
    }

    #[test]
    fn test_heading_title_keeps_inline_words() {
        let html = page("", &format!("<h1>Solid<i>-state</i> <b>cells</b></h1><article><p>{}</p></article>", PARAGRAPH));
        let article = extract_article(&html, "https://example.com/").unwrap();
        assert_eq!(article.title, "Solid-state cells");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Hello   world \t x  "), "Hello world x");
        assert_eq!(normalize_whitespace("a \n\n\n  b\n \n c"), "a\nb\nc");
        assert_eq!(normalize_whitespace("   "), "");
    }
}
