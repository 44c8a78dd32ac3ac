//! Crawl controller
//!
//! Drives one website crawl: breadth-first over contact-like links from the seed,
//! bounded by depth and by a per-page link budget, stopping early once enough
//! emails are known.

use crate::config::CrawlerConfig;
use crate::crawler::session::{PageSession, SessionFactory};
use crate::crawler::visitor::{visit_page, PageVisit};
use crate::state::{CrawlState, CrawlStatus, CrawlTask};
use crate::url::seed_url;
use crate::UrlError;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Limits applied to a single website crawl
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Link distance from the seed beyond which pages are not visited
    pub max_depth: u32,

    /// New links enqueued per page at most
    pub max_links_per_page: usize,

    /// Stop once this many emails are known
    pub min_emails_required: Option<usize>,

    /// Pause between page visits
    pub page_delay: Duration,

    /// Lowercase contact keywords for the link classifier
    pub keywords: Vec<String>,
}

impl CrawlOptions {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_links_per_page: config.max_links_per_page,
            min_emails_required: config.min_emails_required,
            page_delay: Duration::from_millis(config.page_delay_ms),
            keywords: config.keywords.clone(),
        }
    }

    /// Same limits with a different early-exit threshold
    pub fn with_min_emails(mut self, min_emails_required: Option<usize>) -> Self {
        self.min_emails_required = min_emails_required;
        self
    }
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Outcome of one website crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The website address as given
    pub seed: String,

    /// Sorted, deduplicated, lowercase emails
    pub emails: Vec<String>,

    pub status: CrawlStatus,

    /// Pages loaded or attempted
    pub pages_visited: usize,

    /// Pages skipped because of navigation errors
    pub pages_failed: usize,
}

impl CrawlReport {
    fn failed(seed: &str, reason: String) -> Self {
        Self {
            seed: seed.to_string(),
            emails: Vec::new(),
            status: CrawlStatus::Failed(reason),
            pages_visited: 0,
            pages_failed: 0,
        }
    }

    /// Emails joined for the listing `email` column
    pub fn joined_emails(&self) -> String {
        self.emails.join(",")
    }
}

/// Runs a crawl inside an already-open session
pub struct CrawlController<'a, S: PageSession + ?Sized> {
    session: &'a mut S,
    options: &'a CrawlOptions,
    seed: String,
    state: CrawlState,
    pages_failed: usize,
}

impl<'a, S: PageSession + ?Sized> CrawlController<'a, S> {
    /// Creates a controller with the seed queued at depth 0
    pub fn new(session: &'a mut S, seed: Url, options: &'a CrawlOptions) -> Result<Self, UrlError> {
        let seed_str = seed.to_string();
        let state = CrawlState::new(seed, options.max_depth)?;

        Ok(Self {
            session,
            options,
            seed: seed_str,
            state,
            pages_failed: 0,
        })
    }

    /// Drains the frontier and returns the report
    pub async fn run(mut self) -> CrawlReport {
        info!(
            "Crawling {} (base domain {}, max depth {})",
            self.seed,
            self.state.base_domain(),
            self.options.max_depth
        );

        while let Some(task) = self.state.next_task() {
            if self.state.is_visited(&task.url) {
                continue;
            }

            if !self.state.is_on_base_domain(&task.url) {
                debug!("Skipping {}: not on {}", task.url, self.state.base_domain());
                continue;
            }

            self.state.mark_visited(&task.url);

            let collect_links = task.depth < self.options.max_depth;
            match visit_page(
                &mut *self.session,
                &task.url,
                collect_links,
                &self.options.keywords,
            )
            .await
            {
                Ok(visit) => self.absorb(&task, visit),
                Err(e) if e.is_fatal() => {
                    error!("Crawl of {} aborted: {}", self.seed, e);
                    self.state.fail(e.to_string());
                    break;
                }
                Err(e) => {
                    warn!("Skipping page: {}", e);
                    self.pages_failed += 1;
                }
            }

            if self.state.is_early_exit() {
                info!(
                    "Found {} emails on {}, stopping early",
                    self.state.email_count(),
                    self.seed
                );
                break;
            }

            if !self.options.page_delay.is_zero() && self.state.has_pending() {
                tokio::time::sleep(self.options.page_delay).await;
            }
        }

        let pages_visited = self.state.visited_count();
        let (status, emails) = self.state.finish();

        info!(
            "Finished {}: {} emails from {} pages ({})",
            self.seed,
            emails.len(),
            pages_visited,
            status
        );

        CrawlReport {
            seed: self.seed,
            emails,
            status,
            pages_visited,
            pages_failed: self.pages_failed,
        }
    }

    /// Merges one page's results into the crawl state
    ///
    /// The threshold is checked after the content emails and after every mailto
    /// email. Once it is crossed the remaining mailtos are still recorded, but no
    /// links from this page are queued.
    fn absorb(&mut self, task: &CrawlTask, visit: PageVisit) {
        let threshold = self.options.min_emails_required;

        for email in &visit.content_emails {
            self.state.add_email(email);
        }
        self.state.check_threshold(threshold);

        for email in &visit.mailto_emails {
            self.state.add_email(email);
            self.state.check_threshold(threshold);
        }

        if self.state.is_early_exit() || task.depth >= self.options.max_depth {
            return;
        }

        let mut added = 0;
        let mut dropped = 0;
        for link in visit.candidate_links {
            // Subdomain links are never visited, so they must not use the budget
            if !self.state.is_on_base_domain(&link) {
                continue;
            }
            if added >= self.options.max_links_per_page {
                dropped += 1;
                continue;
            }
            if self.state.enqueue(link, task.depth + 1) {
                added += 1;
            }
        }

        if dropped > 0 {
            debug!(
                "Link budget reached on {}: dropped {} candidate links",
                task.url, dropped
            );
        }
    }
}

/// Crawls one website for contact emails
///
/// Opens a session from `factory`, runs the controller and closes the session on
/// every path. Never returns an error: problems are reported through
/// [`CrawlReport::status`], and emails found before a fatal error are kept.
///
/// # Arguments
///
/// * `factory` - Source of page sessions
/// * `seed` - Website address; `https://` is assumed when no scheme is given
/// * `options` - Depth, link budget and early-exit threshold
pub async fn crawl_for_emails<F>(factory: &F, seed: &str, options: &CrawlOptions) -> CrawlReport
where
    F: SessionFactory + ?Sized,
{
    let seed_url = match seed_url(seed) {
        Ok(url) => url,
        Err(e) => {
            warn!("Invalid website address {:?}: {}", seed, e);
            return CrawlReport::failed(seed, e.to_string());
        }
    };

    let mut session = match factory.open().await {
        Ok(session) => session,
        Err(e) => {
            error!("Could not open page session for {}: {}", seed, e);
            return CrawlReport::failed(seed, e.to_string());
        }
    };

    let report = match CrawlController::new(&mut session, seed_url, options) {
        Ok(controller) => controller.run().await,
        Err(e) => CrawlReport::failed(seed, e.to_string()),
    };

    session.close().await;
    report
}
