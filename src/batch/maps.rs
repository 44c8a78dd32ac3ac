//! Map search listing source
//!
//! Scrapes business listings from the result feed of a maps search. The feed
//! is scrolled one viewport at a time and each new result card is opened to read
//! its detail panel. Text cleanup lives in plain functions so it can be tested
//! without a browser.

use crate::storage::Listing;
use serde::Deserialize;
use std::collections::HashSet;

/// Consecutive scrolls without a new card before the feed counts as exhausted
pub const MAX_IDLE_SCROLLS: u32 = 8;

/// Raw detail-panel text as read from the page
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingDetails {
    pub name: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    /// ARIA label of the stars element, e.g. "4.6 stars"
    pub rating_label: Option<String>,
    /// Text of the reviews element, e.g. "(1,204)"
    pub reviews_text: Option<String>,
}

impl ListingDetails {
    pub fn into_listing(self, id: String, search_term: &str) -> Listing {
        Listing {
            id,
            name: self.name.unwrap_or_default().trim().to_string(),
            rating: self.rating_label.as_deref().and_then(parse_rating),
            reviews: self.reviews_text.as_deref().and_then(parse_reviews),
            address: self.address.unwrap_or_default().trim().to_string(),
            website: self
                .website
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty()),
            phone: self.phone.as_deref().map(clean_phone).unwrap_or_default(),
            search_term: search_term.to_string(),
            email: String::new(),
        }
    }
}

/// Stable card id: the alphabetic characters of the result id, or of the card
/// text when the card has no result id
pub fn card_id(result_id: Option<&str>, card_text: &str) -> String {
    let source = result_id.filter(|id| !id.is_empty()).unwrap_or(card_text);
    source.chars().filter(|c| c.is_alphabetic()).collect()
}

/// Records a card as seen and decides whether to open it
///
/// Cards without an id, cards already seen in this search and cards stored by
/// an earlier run are not opened. Known cards still count as seen, so scrolling
/// past them resets the idle-scroll count.
pub fn card_needs_opening(id: &str, known_ids: &HashSet<String>, seen: &mut HashSet<String>) -> bool {
    if id.is_empty() || !seen.insert(id.to_string()) {
        return false;
    }
    !known_ids.contains(id)
}

/// Keeps digits and `+`
pub fn clean_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

/// First token of a "4.6 stars" label
pub fn parse_rating(label: &str) -> Option<f64> {
    label.split_whitespace().next()?.replace(',', ".").parse().ok()
}

/// Digits of a "(1,204)" reviews label
pub fn parse_reviews(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Search feed URL for a term
pub fn search_url(term: &str) -> String {
    let mut url = String::from("https://www.google.com/maps/search/");
    for part in url::form_urlencoded::byte_serialize(term.trim().as_bytes()) {
        url.push_str(part);
    }
    url
}

#[cfg(feature = "browser")]
pub use browser_source::MapsListingSource;

#[cfg(feature = "browser")]
mod browser_source {
    use super::{card_id, card_needs_opening, search_url, ListingDetails, MAX_IDLE_SCROLLS};
    use crate::batch::{ListingSource, SourceError};
    use crate::config::{CrawlerConfig, UserAgentConfig};
    use crate::crawler::launch_browser;
    use crate::storage::Listing;
    use async_trait::async_trait;
    use chromiumoxide::browser::Browser;
    use chromiumoxide::Page;
    use serde::de::DeserializeOwned;
    use serde::Deserialize;
    use std::collections::HashSet;
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;
    use tracing::{debug, info, warn};

    const CARD_SELECTOR: &str = "div.Nv2PK";
    const DETAIL_SELECTOR: &str = "div.aIFcqe h1.DUwDvf";

    /// Pause after clicking a card while the detail panel renders
    const DETAIL_SETTLE: Duration = Duration::from_millis(2_000);

    /// Pause after each feed scroll while new cards load
    const SCROLL_SETTLE: Duration = Duration::from_millis(3_000);

    const POLL_INTERVAL: Duration = Duration::from_millis(250);

    const CARDS_SCRIPT: &str = r#"
Array.from(document.querySelectorAll('div.Nv2PK')).map((card) => ({
    result_id: card.getAttribute('data-result-id')
        || (card.querySelector('[data-result-id]') || {getAttribute: () => null}).getAttribute('data-result-id'),
    text: card.innerText || '',
}))
"#;

    const DETAILS_SCRIPT: &str = r#"
(() => {
    const text = (sel) => { const el = document.querySelector(sel); return el ? el.innerText : null; };
    const attr = (sel, name) => { const el = document.querySelector(sel); return el ? el.getAttribute(name) : null; };
    return {
        name: text('div.aIFcqe h1.DUwDvf'),
        address: text('button[data-item-id="address"]'),
        website: attr('a[data-item-id="authority"]', 'href'),
        phone: text('button[data-item-id^="phone"]'),
        rating_label: attr('div.F7nice span[aria-label*="stars"]', 'aria-label'),
        reviews_text: text('div.F7nice span[aria-label*="reviews"]'),
    };
})()
"#;

    const SCROLL_SCRIPT: &str = r#"
(() => {
    const feed = document.querySelector('div[role="feed"]');
    if (!feed) { return false; }
    feed.scrollBy({top: feed.clientHeight, behavior: 'smooth'});
    return true;
})()
"#;

    #[derive(Debug, Deserialize)]
    struct CardInfo {
        result_id: Option<String>,
        #[serde(default)]
        text: String,
    }

    /// Listing source backed by a headless Chromium tab
    ///
    /// The browser is launched lazily on the first search and reused for every
    /// term until the source is closed or dropped.
    pub struct MapsListingSource {
        user_agent: String,
        navigation_timeout: Duration,
        browser: Option<(Browser, JoinHandle<()>, Page)>,
    }

    impl MapsListingSource {
        pub fn new(user_agent: &UserAgentConfig, crawler: &CrawlerConfig) -> Self {
            Self {
                user_agent: user_agent.value.clone(),
                navigation_timeout: Duration::from_millis(crawler.navigation_timeout_ms),
                browser: None,
            }
        }

        async fn page(&mut self) -> Result<&Page, SourceError> {
            if self.browser.is_none() {
                let (browser, handler) = launch_browser(&self.user_agent, self.navigation_timeout)
                    .await
                    .map_err(|e| SourceError::Browser(e.to_string()))?;
                let page = match browser.new_page("about:blank").await {
                    Ok(page) => page,
                    Err(e) => {
                        handler.abort();
                        return Err(SourceError::Browser(e.to_string()));
                    }
                };
                self.browser = Some((browser, handler, page));
            }

            match &self.browser {
                Some((_, _, page)) => Ok(page),
                None => Err(SourceError::Browser("browser not running".to_string())),
            }
        }

        pub async fn close(&mut self) {
            if let Some((mut browser, handler, _page)) = self.browser.take() {
                if let Err(e) = browser.close().await {
                    debug!("Error closing browser: {}", e);
                }
                let _ = browser.wait().await;
                handler.abort();
            }
        }
    }

    impl Drop for MapsListingSource {
        fn drop(&mut self) {
            if let Some((_, handler, _)) = &self.browser {
                handler.abort();
            }
        }
    }

    async fn eval<T: DeserializeOwned>(page: &Page, script: &str, term: &str) -> Result<T, SourceError> {
        let failed = |reason: String| SourceError::Search {
            term: term.to_string(),
            reason,
        };
        page.evaluate(script)
            .await
            .map_err(|e| failed(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| failed(e.to_string()))
    }

    async fn wait_for(page: &Page, selector: &str, timeout: Duration, term: &str) -> Result<(), SourceError> {
        let script = format!("document.querySelector('{}') !== null", selector);
        let started = Instant::now();
        loop {
            if eval::<bool>(page, &script, term).await.unwrap_or(false) {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(SourceError::Search {
                    term: term.to_string(),
                    reason: format!("timed out waiting for {}", selector),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    fn click_script(index: usize) -> String {
        format!(
            "(() => {{ const card = document.querySelectorAll('{}')[{}]; \
             if (!card) {{ return false; }} \
             card.scrollIntoView({{block: 'center'}}); card.click(); return true; }})()",
            CARD_SELECTOR, index
        )
    }

    #[async_trait]
    impl ListingSource for MapsListingSource {
        async fn search(
            &mut self,
            term: &str,
            known_ids: &HashSet<String>,
            tx: mpsc::Sender<Listing>,
        ) -> Result<usize, SourceError> {
            let timeout = self.navigation_timeout;
            let page = self.page().await?;

            page.goto(search_url(term))
                .await
                .map_err(|e| SourceError::Search {
                    term: term.to_string(),
                    reason: e.to_string(),
                })?;
            wait_for(page, CARD_SELECTOR, timeout, term).await?;

            let mut seen = HashSet::new();
            let mut sent = 0;
            let mut idle_scrolls = 0;

            while idle_scrolls < MAX_IDLE_SCROLLS {
                let cards: Vec<CardInfo> = eval(page, CARDS_SCRIPT, term).await?;
                let before = seen.len();

                for (index, card) in cards.iter().enumerate() {
                    let id = card_id(card.result_id.as_deref(), &card.text);
                    if !card_needs_opening(&id, known_ids, &mut seen) {
                        continue;
                    }

                    if !eval::<bool>(page, &click_script(index), term).await.unwrap_or(false) {
                        continue;
                    }
                    if let Err(e) = wait_for(page, DETAIL_SELECTOR, timeout, term).await {
                        warn!("No detail panel for card {}: {}", id, e);
                        continue;
                    }
                    tokio::time::sleep(DETAIL_SETTLE).await;

                    let details: ListingDetails = match eval(page, DETAILS_SCRIPT, term).await {
                        Ok(details) => details,
                        Err(e) => {
                            warn!("Could not read card {}: {}", id, e);
                            continue;
                        }
                    };

                    let listing = details.into_listing(id, term);
                    debug!("Found listing {} ({})", listing.name, listing.id);
                    tx.send(listing).await.map_err(|_| SourceError::ConsumerClosed)?;
                    sent += 1;
                }

                if seen.len() == before {
                    idle_scrolls += 1;
                    debug!("No new cards after scroll ({}/{})", idle_scrolls, MAX_IDLE_SCROLLS);
                } else {
                    idle_scrolls = 0;
                }

                if !eval::<bool>(page, SCROLL_SCRIPT, term).await.unwrap_or(false) {
                    warn!("Result feed not found while scrolling");
                }
                tokio::time::sleep(SCROLL_SETTLE).await;
            }

            info!("{}: {} listings from map search", term, sent);
            Ok(sent)
        }
    }
}
