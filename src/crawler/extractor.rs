//! Email extraction from page markup and `mailto:` links

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Unanchored email pattern used to scan markup
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").expect("email pattern is valid")
});

/// Same pattern anchored to the whole input
static EMAIL_EXACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("email pattern is valid")
});

/// Scans text for email-shaped substrings
///
/// Runs over raw markup, so addresses inside attributes and inline scripts are
/// found as well as visible text. Matches are lowercased and deduplicated.
///
/// # Example
///
/// ```
/// use leadline::crawler::extract_emails;
///
/// let emails = extract_emails("contact us at sales@example.com or SALES@example.com");
/// assert_eq!(emails.into_iter().collect::<Vec<_>>(), vec!["sales@example.com"]);
/// ```
pub fn extract_emails(text: &str) -> BTreeSet<String> {
    EMAIL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Returns true if the whole string is a single email address
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_EXACT.is_match(candidate)
}

/// Extracts the address from a `mailto:` link destination
///
/// The scheme prefix is matched case-insensitively, and anything from the first
/// `?` on (subject, cc, body parameters) is discarded. The remainder must be
/// exactly one email address.
///
/// # Example
///
/// ```
/// use leadline::crawler::mailto_address;
///
/// assert_eq!(
///     mailto_address("mailto:info@foo.com?subject=Hi"),
///     Some("info@foo.com".to_string())
/// );
/// assert_eq!(mailto_address("/contact"), None);
/// ```
pub fn mailto_address(href: &str) -> Option<String> {
    let href = href.trim();
    let prefix = href.get(..7)?;
    if !prefix.eq_ignore_ascii_case("mailto:") {
        return None;
    }

    let rest = &href[7..];
    let address = rest.split_once('?').map_or(rest, |(addr, _)| addr).trim();

    is_valid_email(address).then(|| address.to_lowercase())
}
