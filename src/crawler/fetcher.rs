//! HTTP fetcher backend
//!
//! This module implements the default page session on top of `reqwest`:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests with a per-navigation timeout
//! - Error classification into per-page and session failures
//! - Anchor extraction from the fetched markup
//!
//! Static pages carry no scripted consent overlays, so overlay dismissal is a no-op.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::parser::parse_anchors;
use crate::crawler::session::{LoadedPage, PageSession, SessionFactory, VisitError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Maximum redirect hops followed per navigation
const MAX_REDIRECTS: usize = 10;

/// Bytes of a response body kept for scanning; the rest is discarded
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Crawler settings providing the navigation timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use leadline::config::{CrawlerConfig, UserAgentConfig};
/// use leadline::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    Client::builder()
        .user_agent(user_agent.value.as_str())
        .default_headers(headers)
        .timeout(Duration::from_millis(crawler.navigation_timeout_ms))
        .connect_timeout(Duration::from_millis(crawler.navigation_timeout_ms.min(10_000)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true for Content-Type values we can scan for emails and links
fn is_textual(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.is_empty() || content_type.contains("html") || content_type.starts_with("text/")
}

/// Page session that fetches pages with plain HTTP GET requests
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    navigation_timeout: Duration,
    max_body_bytes: usize,
    current: Option<(Url, String)>,
}

impl HttpSession {
    pub fn new(client: Client, navigation_timeout: Duration) -> Self {
        Self {
            client,
            navigation_timeout,
            max_body_bytes: MAX_BODY_BYTES,
            current: None,
        }
    }

    fn navigation_error(url: &Url, reason: impl Into<String>) -> VisitError {
        VisitError::Navigation {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    fn classify(&self, url: &Url, error: reqwest::Error) -> VisitError {
        if error.is_timeout() {
            VisitError::Timeout {
                url: url.to_string(),
                timeout_ms: self.navigation_timeout.as_millis() as u64,
            }
        } else if error.is_connect() {
            Self::navigation_error(url, "Connection refused")
        } else if error.is_redirect() {
            Self::navigation_error(url, "Too many redirects")
        } else {
            Self::navigation_error(url, error.to_string())
        }
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), VisitError> {
        self.current = None;

        let mut response = self
            .client
            .get(url.clone())
            .timeout(self.navigation_timeout)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::navigation_error(
                url,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_textual(&content_type) {
            return Err(Self::navigation_error(
                url,
                format!("Unsupported content type {}", content_type),
            ));
        }

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(url, e))? {
            let room = self.max_body_bytes - bytes.len();
            if chunk.len() >= room {
                bytes.extend_from_slice(&chunk[..room]);
                debug!("Truncated {} at {} bytes", url, self.max_body_bytes);
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!("Fetched {} ({} bytes)", url, body.len());

        self.current = Some((url.clone(), body));
        Ok(())
    }

    async fn dismiss_overlay(&mut self) -> bool {
        false
    }

    async fn snapshot(&mut self) -> Result<LoadedPage, VisitError> {
        let (url, markup) = self
            .current
            .clone()
            .ok_or_else(|| VisitError::Session("No page loaded".to_string()))?;

        let anchors = parse_anchors(&markup);
        Ok(LoadedPage {
            url,
            markup,
            anchors,
        })
    }

    async fn close(&mut self) {
        self.current = None;
    }
}

/// Hands out HTTP sessions sharing one connection pool
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    client: Client,
    navigation_timeout: Duration,
    max_body_bytes: usize,
}

impl HttpSessionFactory {
    /// Builds the shared client from configuration
    pub fn new(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, crawler)?;
        Ok(Self::with_client(
            client,
            Duration::from_millis(crawler.navigation_timeout_ms),
        ))
    }

    pub fn with_client(client: Client, navigation_timeout: Duration) -> Self {
        Self {
            client,
            navigation_timeout,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    /// Caps how much of each response body is kept
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes.max(1);
        self
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    type Session = HttpSession;

    async fn open(&self) -> Result<HttpSession, VisitError> {
        let mut session = HttpSession::new(self.client.clone(), self.navigation_timeout);
        session.max_body_bytes = self.max_body_bytes;
        Ok(session)
    }
}
