//! Contact-link classification
//!
//! Picks the links on a page worth following when looking for contact details:
//! same-site links whose text or path mentions one of the configured keywords.

use crate::crawler::parser::Anchor;
use crate::url::{extract_domain, is_same_site, strip_fragment};
use std::collections::HashSet;
use tracing::trace;
use url::Url;

/// Returns the same-site links whose text or path matches a contact keyword
///
/// # Classification Rules
///
/// 1. Drop empty hrefs and `javascript:`, `#`, `tel:`, `data:` destinations
/// 2. Resolve against `base_url`; drop anything that is not HTTP(S)
/// 3. Drop hosts that are neither the base host nor a subdomain of it
/// 4. Accept if a keyword occurs in the lowercased link text or in the
///    lowercased `path?query`
///
/// Keywords are expected to be lowercase. The result is deduplicated (fragments
/// removed) and keeps first-seen order.
///
/// # Example
///
/// ```
/// use leadline::crawler::{relevant_links, Anchor};
/// use url::Url;
///
/// let base = Url::parse("https://example.com/").unwrap();
/// let anchors = vec![
///     Anchor::new("/kontakt", "Kontakt"),
///     Anchor::new("/shop", "Shop"),
///     Anchor::new("https://otherdomain.com/contact", "Contact"),
/// ];
/// let keywords = vec!["kontakt".to_string(), "contact".to_string()];
///
/// let links = relevant_links(&anchors, &base, &keywords);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/kontakt");
/// ```
pub fn relevant_links(anchors: &[Anchor], base_url: &Url, keywords: &[String]) -> Vec<Url> {
    let Some(base_host) = extract_domain(base_url) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in anchors {
        let Some(url) = resolve_link(&anchor.href, base_url) else {
            continue;
        };

        let same_site = extract_domain(&url).is_some_and(|host| is_same_site(&base_host, &host));
        if !same_site {
            trace!("Dropping off-site link {}", url);
            continue;
        }

        let text = anchor.text.to_lowercase();
        let path_query = format!("{}?{}", url.path(), url.query().unwrap_or("")).to_lowercase();

        let matches = keywords
            .iter()
            .any(|keyword| text.contains(keyword.as_str()) || path_query.contains(keyword.as_str()));

        if !matches {
            continue;
        }

        if seen.insert(url.as_str().to_string()) {
            trace!("Candidate contact link {}", url);
            links.push(url);
        }
    }

    links
}

/// Resolves a link href to an absolute HTTP(S) URL without fragment
///
/// Returns None if the link should be excluded:
/// - empty hrefs and fragment-only links
/// - javascript:, tel:, data: destinations
/// - anything that does not resolve to HTTP or HTTPS (including mailto:)
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("tel:") || lower.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    Some(strip_fragment(absolute_url))
}
