//! HTML inspection for the content analyzer
//!
//! This module extracts the handful of facts the heuristics need:
//! - Page title (`<title>`, falling back to `og:title`)
//! - Visible body text, lowercased, for keyword counting
//! - Structural markers (`div.content` blocks, `<main>`/`<article>`)

use scraper::{Html, Selector};

/// Facts pulled from one HTML document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFacts {
    /// Whitespace-collapsed title; empty if the page has none
    pub title: String,

    /// Body text, lowercased and whitespace-collapsed
    pub text: String,

    /// Number of words in `text`
    pub word_count: usize,

    /// Number of `div.content` elements
    pub content_blocks: usize,

    /// Whether the page has a `<main>` or `<article>` element
    pub has_landmark: bool,
}

impl PageFacts {
    /// Counts case-insensitive occurrences of each keyword in the body text
    pub fn keyword_hits(&self, keywords: &[String]) -> usize {
        keywords
            .iter()
            .map(|k| collapse_whitespace(&k.to_lowercase()))
            .filter(|k| !k.is_empty())
            .map(|k| self.text.matches(k.as_str()).count())
            .sum()
    }
}

/// Parses HTML and extracts the facts used by the heuristics
///
/// html5ever recovers from any input, so this never fails; a fragment or
/// plain text simply yields an empty title.
///
/// # Example
///
/// ```
/// use sumi_sieve::analysis::parse_page;
///
/// let facts = parse_page("<html><head><title> Hello\n World </title></head></html>");
/// assert_eq!(facts.title, "Hello World");
/// ```
pub fn parse_page(html: &str) -> PageFacts {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let text = collapse_whitespace(&extract_body_text(&document).to_lowercase());
    let word_count = text.split(' ').filter(|w| !w.is_empty()).count();

    PageFacts {
        title,
        text,
        word_count,
        content_blocks: count(&document, "div.content"),
        has_landmark: count(&document, "main, article") > 0,
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let from_title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
    });

    match from_title {
        Some(title) if !title.is_empty() => title,
        _ => extract_og_title(document).unwrap_or_default(),
    }
}

fn extract_og_title(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[property="og:title"][content]"#).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .find(|title| !title.is_empty())
}

fn extract_body_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    match document.select(&selector).next() {
        Some(body) => body.text().collect::<Vec<_>>().join(" "),
        None => document.root_element().text().collect::<Vec<_>>().join(" "),
    }
}

fn count(document: &Html, selector: &str) -> usize {
    Selector::parse(selector)
        .map(|selector| document.select(&selector).count())
        .unwrap_or(0)
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
