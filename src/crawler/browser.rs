//! Headless Chromium backend
//!
//! Each session launches its own browser process with one tab that is reused for
//! every page of the crawl. Rendered markup and anchors come from the live DOM,
//! so sites that build their contact details with JavaScript are covered.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::parser::Anchor;
use crate::crawler::session::{LoadedPage, PageSession, SessionFactory, VisitError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// Wait before looking for a consent overlay, so late banners have rendered
const OVERLAY_SETTLE: Duration = Duration::from_millis(1_000);

/// Wait after clicking an overlay button
const OVERLAY_AFTER_CLICK: Duration = Duration::from_millis(500);

/// Collects `(href, text)` for every anchor in the document
const ANCHORS_SCRIPT: &str = r#"
Array.from(document.querySelectorAll('a[href]')).map((a) => ({
    href: a.getAttribute('href') || '',
    text: (a.innerText || a.textContent || '').replace(/\s+/g, ' ').trim(),
}))
"#;

/// Clicks the first visible consent button, trying labels in priority order
const DISMISS_OVERLAY_SCRIPT: &str = r#"
(() => {
    const visible = (el) => {
        const rect = el.getBoundingClientRect();
        const style = window.getComputedStyle(el);
        return rect.width > 0 && rect.height > 0
            && style.visibility !== 'hidden' && style.display !== 'none';
    };
    const textOf = (el) => (el.innerText || el.textContent || '').replace(/\s+/g, ' ').trim().toLowerCase();
    const buttons = Array.from(document.querySelectorAll('button, [role="button"], input[type="button"], a'));
    const labels = ['accept all', 'accept', 'agree', 'allow all', 'confirm', 'ok'];
    for (const label of labels) {
        const match = buttons.find((el) => {
            const text = textOf(el) || (el.value || '').toLowerCase();
            return visible(el) && (text === label || (label.length > 3 && text.includes(label)));
        });
        if (match) { match.click(); return true; }
    }
    const aria = Array.from(document.querySelectorAll('[aria-label]')).find((el) => {
        const label = el.getAttribute('aria-label').toLowerCase();
        return visible(el) && (label.includes('close') || label.includes('accept'));
    });
    if (aria) { aria.click(); return true; }
    const cookie = Array.from(document.querySelectorAll("div[id*='cookie'] button, div[id*='Cookie'] button"))
        .find((el) => visible(el) && textOf(el).includes('accept'));
    if (cookie) { cookie.click(); return true; }
    return false;
})()
"#;

/// Launches a headless browser and spawns its event handler
///
/// The handler task must be aborted once the browser is no longer used.
pub(crate) async fn launch_browser(
    user_agent: &str,
    request_timeout: Duration,
) -> Result<(Browser, JoinHandle<()>), VisitError> {
    let config = BrowserConfig::builder()
        .no_sandbox()
        .request_timeout(request_timeout)
        .window_size(1366, 900)
        .arg(format!("--user-agent={}", user_agent))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-notifications")
        .arg("--mute-audio")
        .build()
        .map_err(|e| VisitError::Session(format!("Invalid browser config: {}", e)))?;

    let (browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| VisitError::Session(format!("Failed to launch browser: {}", e)))?;

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("Browser handler error: {:?}", e);
            }
        }
    });

    Ok((browser, handler_task))
}

/// Returns true if the error means the browser connection is gone
fn is_connection_lost(error: &CdpError) -> bool {
    matches!(
        error,
        CdpError::Ws(_) | CdpError::Io(_) | CdpError::NoResponse | CdpError::ChannelSendError(_)
    )
}

/// Page session backed by one headless Chromium tab
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    current: Option<Url>,
    navigation_timeout: Duration,
    interaction_timeout: Duration,
    closed: bool,
}

impl BrowserSession {
    fn page_error(&self, url: &Url, error: CdpError) -> VisitError {
        if is_connection_lost(&error) {
            VisitError::Session(error.to_string())
        } else {
            VisitError::Navigation {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageSession for BrowserSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), VisitError> {
        self.current = None;

        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url.as_str())).await {
            Ok(Ok(_)) => {
                self.current = Some(url.clone());
                Ok(())
            }
            Ok(Err(e)) => Err(self.page_error(url, e)),
            Err(_) => Err(VisitError::Timeout {
                url: url.to_string(),
                timeout_ms: self.navigation_timeout.as_millis() as u64,
            }),
        }
    }

    async fn dismiss_overlay(&mut self) -> bool {
        tokio::time::sleep(OVERLAY_SETTLE).await;

        let attempt = tokio::time::timeout(
            self.interaction_timeout,
            self.page.evaluate(DISMISS_OVERLAY_SCRIPT),
        )
        .await;

        let clicked = match attempt {
            Ok(Ok(result)) => result.into_value::<bool>().unwrap_or(false),
            Ok(Err(e)) => {
                debug!("Overlay dismissal failed: {}", e);
                false
            }
            Err(_) => {
                debug!("Overlay dismissal timed out");
                false
            }
        };

        if clicked {
            tokio::time::sleep(OVERLAY_AFTER_CLICK).await;
        }
        clicked
    }

    async fn snapshot(&mut self) -> Result<LoadedPage, VisitError> {
        let url = self
            .current
            .clone()
            .ok_or_else(|| VisitError::Session("No page loaded".to_string()))?;

        let markup = tokio::time::timeout(self.interaction_timeout, self.page.content())
            .await
            .map_err(|_| VisitError::Timeout {
                url: url.to_string(),
                timeout_ms: self.interaction_timeout.as_millis() as u64,
            })?
            .map_err(|e| self.page_error(&url, e))?;

        let anchors = match tokio::time::timeout(
            self.interaction_timeout,
            self.page.evaluate(ANCHORS_SCRIPT),
        )
        .await
        {
            Ok(Ok(result)) => result.into_value::<Vec<Anchor>>().unwrap_or_else(|e| {
                debug!("Unexpected anchor list from {}: {}", url, e);
                Vec::new()
            }),
            Ok(Err(e)) => return Err(self.page_error(&url, e)),
            Err(_) => {
                debug!("Anchor extraction timed out on {}", url);
                Vec::new()
            }
        };

        Ok(LoadedPage {
            url,
            markup,
            anchors,
        })
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Browser kills its child process on drop; the handler has to go too
        self.handler.abort();
    }
}

/// Launches one headless browser per crawl
#[derive(Debug, Clone)]
pub struct BrowserSessionFactory {
    user_agent: String,
    navigation_timeout: Duration,
    interaction_timeout: Duration,
}

impl BrowserSessionFactory {
    pub fn new(user_agent: &UserAgentConfig, crawler: &CrawlerConfig) -> Self {
        Self {
            user_agent: user_agent.value.clone(),
            navigation_timeout: Duration::from_millis(crawler.navigation_timeout_ms),
            interaction_timeout: Duration::from_millis(crawler.interaction_timeout_ms),
        }
    }
}

#[async_trait]
impl SessionFactory for BrowserSessionFactory {
    type Session = BrowserSession;

    async fn open(&self) -> Result<BrowserSession, VisitError> {
        let (mut browser, handler) =
            launch_browser(&self.user_agent, self.navigation_timeout).await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler.abort();
                return Err(VisitError::Session(format!("Failed to open tab: {}", e)));
            }
        };

        Ok(BrowserSession {
            browser,
            handler,
            page,
            current: None,
            navigation_timeout: self.navigation_timeout,
            interaction_timeout: self.interaction_timeout,
            closed: false,
        })
    }
}
