use crate::UrlError;
use url::Url;

/// Parses and normalizes a URL for use as a crawl key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Reject URLs without a host
/// 4. Remove the fragment, since `/contact#form` and `/contact` load the same page
///
/// Host lowercasing and empty-path-to-`/` are done by the `url` crate's parser.
///
/// # Examples
///
/// ```
/// use leadline::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/contact#form").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/contact");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(strip_fragment(url))
}

/// Removes the fragment from a URL
pub fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
