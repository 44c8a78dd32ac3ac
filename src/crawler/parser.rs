//! HTML parser for extracting anchors
//!
//! The static HTTP backend uses this to turn fetched markup into the same
//! `(href, text)` pairs the browser backend reads from the live DOM.

use scraper::{Html, Selector};
use serde::Deserialize;

/// An `<a href>` element: raw destination plus visible text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Anchor {
    /// The `href` attribute exactly as written (may be relative)
    pub href: String,

    /// Visible link text with whitespace collapsed
    #[serde(default)]
    pub text: String,
}

impl Anchor {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }
}

/// Parses HTML content and returns every anchor with an `href`, in document order
///
/// # Arguments
///
/// * `html` - The HTML content to parse
///
/// # Returns
///
/// All anchors, including `mailto:` and `tel:` ones; filtering is left to callers.
///
/// # Example
///
/// ```
/// use leadline::crawler::parse_anchors;
///
/// let html = r#"<a href="/kontakt">  Kontakt
///     &amp; Anfahrt</a>"#;
/// let anchors = parse_anchors(html);
/// assert_eq!(anchors[0].href, "/kontakt");
/// assert_eq!(anchors[0].text, "Kontakt & Anfahrt");
/// ```
pub fn parse_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let text = collapse_whitespace(&element.text().collect::<String>());
            Some(Anchor::new(href, text))
        })
        .collect()
}

/// Joins whitespace-separated words with single spaces
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
