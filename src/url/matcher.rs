/// Checks whether a link's host belongs to the site being crawled
///
/// A candidate matches when it equals the base host or is a subdomain of it:
/// with base `example.com`, both `example.com` and `shop.example.com` match,
/// while `myexample.com` and `example.com.evil.net` do not.
///
/// Both arguments are expected to be lowercase.
///
/// # Examples
///
/// ```
/// use leadline::url::is_same_site;
///
/// assert!(is_same_site("example.com", "example.com"));
/// assert!(is_same_site("example.com", "blog.example.com"));
/// assert!(!is_same_site("example.com", "myexample.com"));
/// assert!(!is_same_site("blog.example.com", "example.com"));
/// ```
pub fn is_same_site(base: &str, candidate: &str) -> bool {
    if base.is_empty() || candidate.is_empty() {
        return false;
    }

    candidate == base
        || candidate
            .strip_suffix(base)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
