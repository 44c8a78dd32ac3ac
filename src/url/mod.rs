//! URL handling module for Leadline
//!
//! This module provides seed URL parsing, URL normalization, host extraction
//! and same-site matching.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::is_same_site;
pub use normalize::{normalize_url, strip_fragment};

use crate::UrlError;
use url::Url;

/// Parses a website address supplied by a listing or by the user
///
/// Listings frequently carry bare hosts ("example.com") or hosts with a path
/// but no scheme. Anything that does not start with `http://` or `https://`
/// gets `https://` prepended before parsing.
///
/// # Examples
///
/// ```
/// use leadline::url::seed_url;
///
/// let url = seed_url("example.com/about").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
///
/// let url = seed_url("http://example.com").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/");
/// ```
pub fn seed_url(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        normalize_url(trimmed)
    } else {
        normalize_url(&format!("https://{}", trimmed))
    }
}
