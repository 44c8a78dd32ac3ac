//! Page session abstraction
//!
//! A session is one browsing context reused for every page of a single website
//! crawl. The static HTTP backend and the headless-browser backend both
//! implement [`PageSession`]; crawls are written against the trait only.

use crate::crawler::parser::Anchor;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors raised while loading a page
#[derive(Debug, Error)]
pub enum VisitError {
    /// The page could not be loaded; only this URL is affected
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The page did not load within the navigation timeout
    #[error("Navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// The session itself is unusable; the crawl cannot continue
    #[error("Page session failed: {0}")]
    Session(String),
}

impl VisitError {
    /// Returns true if the error ends the whole crawl rather than one page
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Session(_))
    }
}

/// Markup and anchors of the page currently loaded in a session
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// The URL that was requested
    pub url: Url,

    /// Full (rendered) markup
    pub markup: String,

    /// All `<a href>` elements in document order
    pub anchors: Vec<Anchor>,
}

/// One browsing context, reused across the pages of a crawl
#[async_trait]
pub trait PageSession: Send {
    /// Loads `url`, waiting until the document is parsed
    ///
    /// Fails with `Navigation`/`Timeout` for per-page problems and with
    /// `Session` when the session is no longer usable.
    async fn navigate(&mut self, url: &Url) -> Result<(), VisitError>;

    /// Tries to click away a cookie/consent overlay on the current page
    ///
    /// Best effort: returns whether something was clicked and never fails.
    async fn dismiss_overlay(&mut self) -> bool;

    /// Captures the current page's markup and anchors
    async fn snapshot(&mut self) -> Result<LoadedPage, VisitError>;

    /// Releases the session's resources
    async fn close(&mut self);
}

/// Creates one page session per crawl
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: PageSession;

    /// Opens a fresh session; an error here fails the crawl before any page loads
    async fn open(&self) -> Result<Self::Session, VisitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_session_errors_are_fatal() {
        assert!(VisitError::Session("browser crashed".into()).is_fatal());
        assert!(!VisitError::Navigation {
            url: "https://example.com/".into(),
            reason: "HTTP 404".into()
        }
        .is_fatal());
        assert!(!VisitError::Timeout {
            url: "https://example.com/".into(),
            timeout_ms: 30_000
        }
        .is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = VisitError::Navigation {
            url: "https://example.com/contact".into(),
            reason: "HTTP 500".into(),
        };
        assert_eq!(
            err.to_string(),
            "Navigation to https://example.com/contact failed: HTTP 500"
        );
    }
}
