//! Page extraction
//!
//! This module turns fetched HTML into a `PageRecord`:
//! - Page title and meta description
//! - Markdown body (see `markdown`)
//! - Image sources and link targets (absolute URLs)

use crate::crawler::markdown::to_markdown;
use crate::url::is_document_url;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// The result of parsing one fetched page
///
/// Produced for the engine and dropped as soon as the page has been written and
/// its links dispatched.
#[derive(Debug, Clone, Default)]
pub struct PageRecord {
    /// Text of `<title>`, empty if absent
    pub title: String,

    /// Content of the `description` meta tag, empty if absent
    pub description: String,

    /// Converted Markdown body
    pub markdown: String,

    /// Absolute image URLs, in document order, without duplicates
    pub images: Vec<String>,

    /// Absolute link URLs, in document order, without duplicates
    pub links: Vec<String>,
}

impl PageRecord {
    /// Links whose path ends in a document extension
    pub fn document_links(&self) -> impl Iterator<Item = &str> {
        self.links
            .iter()
            .map(String::as_str)
            .filter(|link| is_document_url(link))
    }

    /// Links that are candidates for further traversal
    pub fn page_links(&self) -> impl Iterator<Item = &str> {
        self.links
            .iter()
            .map(String::as_str)
            .filter(|link| !is_document_url(link))
    }
}

/// Parses HTML content into a `PageRecord`
///
/// # Extraction Rules
///
/// **Links:** every `<a href>` in the document (navigation included), resolved
/// against `base_url`. `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only
/// hrefs are dropped, as is anything that does not resolve to http(s).
///
/// **Images:** every `<img src>`, with the same resolution rules.
///
/// **Markdown:** produced from `<body>` with non-content subtrees removed.
///
/// Parsing is permissive and never fails.
///
/// # Example
///
/// ```
/// use sumi_gleaner::crawler::extract_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = extract_page(html, &base_url);
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn extract_page(html: &str, base_url: &Url) -> PageRecord {
    let document = Html::parse_document(html);

    let markdown = match Selector::parse("body") {
        Ok(selector) => match document.select(&selector).next() {
            Some(body) => to_markdown(body, base_url),
            None => to_markdown(document.root_element(), base_url),
        },
        Err(_) => to_markdown(document.root_element(), base_url),
    };

    PageRecord {
        title: extract_title(&document),
        description: extract_description(&document),
        markdown,
        images: collect_urls(&document, "img[src]", "src", base_url),
        links: collect_urls(&document, "a[href]", "href", base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Extracts the `<meta name="description">` content
fn extract_description(document: &Html) -> String {
    let Ok(meta_selector) = Selector::parse("meta[name][content]") else {
        return String::new();
    };

    document
        .select(&meta_selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("description"))
        })
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

/// Resolves the `attr` of every element matching `selector`, dropping duplicates
fn collect_urls(document: &Html, selector: &str, attr: &str, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .filter_map(|value| resolve_link(value, base_url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    // Same-page anchors
    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
