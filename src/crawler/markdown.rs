//! HTML to Markdown conversion
//!
//! Walks the DOM depth-first and emits a restricted Markdown dialect: headings
//! (`h1`-`h3`), paragraphs, lists, links, emphasis and line breaks. Elements outside
//! that set are transparent (their children are still walked); non-content
//! subtrees are dropped entirely. The walk never fails, whatever the input.

use scraper::{ElementRef, Node};
use url::Url;

/// Subtrees that never contribute to the Markdown body
pub const NON_CONTENT_TAGS: &[&str] = &["script", "style", "nav", "footer", "iframe", "noscript"];

/// Converts an element's subtree to Markdown
///
/// Relative link targets are resolved against `base_url`. The result is trimmed and
/// runs of blank lines are collapsed to one.
pub fn to_markdown(root: ElementRef<'_>, base_url: &Url) -> String {
    let mut out = String::new();
    emit_children(root, base_url, &mut out);
    tidy(&out)
}

fn emit_children(element: ElementRef<'_>, base_url: &Url, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push_str(trimmed);
                    out.push(' ');
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    emit_element(child_element, base_url, out);
                }
            }
            _ => {}
        }
    }
}

fn emit_element(element: ElementRef<'_>, base_url: &Url, out: &mut String) {
    let tag = element.value().name();
    if NON_CONTENT_TAGS.contains(&tag) {
        return;
    }

    match tag {
        "h1" | "h2" | "h3" => {
            let level = match tag {
                "h1" => 1,
                "h2" => 2,
                _ => 3,
            };
            let text = inline_text(element);
            if !text.is_empty() {
                out.push_str("\n\n");
                out.push_str(&"#".repeat(level));
                out.push(' ');
                out.push_str(&text);
                out.push_str("\n\n");
            }
        }
        "p" => {
            out.push_str("\n\n");
            emit_children(element, base_url, out);
            out.push_str("\n\n");
        }
        "ul" | "ol" => {
            out.push('\n');
            emit_children(element, base_url, out);
            out.push('\n');
        }
        "li" => {
            out.push_str("- ");
            emit_children(element, base_url, out);
            out.push('\n');
        }
        "a" => {
            let href = element
                .value()
                .attr("href")
                .and_then(|href| base_url.join(href.trim()).ok());
            match href {
                Some(href) => {
                    let text = inline_text(element);
                    if !text.is_empty() {
                        out.push_str(&format!("[{}]({}) ", text, href));
                    }
                }
                None => emit_children(element, base_url, out),
            }
        }
        "strong" | "b" => push_wrapped(out, "**", &inline_text(element)),
        "em" | "i" => push_wrapped(out, "*", &inline_text(element)),
        "br" => out.push('\n'),
        _ => emit_children(element, base_url, out),
    }
}

fn push_wrapped(out: &mut String, marker: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    out.push_str(marker);
    out.push_str(text);
    out.push_str(marker);
    out.push(' ');
}

/// Collects an element's text with whitespace collapsed to single spaces
fn inline_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips trailing whitespace per line and collapses blank-line runs
fn tidy(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0;

    for line in raw.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
