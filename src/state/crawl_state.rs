use crate::state::CrawlStatus;
use crate::url::extract_domain;
use crate::UrlError;
use std::collections::{BTreeSet, HashSet, VecDeque};
use url::Url;

/// One unit of crawl work: a URL and its link distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: u32,
}

/// Mutable state of a single website crawl
///
/// Owned by one controller invocation and never shared. The frontier is a FIFO
/// queue, so pages are visited in breadth-first enqueue order.
///
/// Invariants maintained here:
/// - every queued task has `depth <= max_depth`
/// - a URL is never both visited and queued
/// - the email set only grows
#[derive(Debug)]
pub struct CrawlState {
    frontier: VecDeque<CrawlTask>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    found_emails: BTreeSet<String>,
    base_domain: String,
    max_depth: u32,
    status: CrawlStatus,
}

impl CrawlState {
    /// Creates the state for a crawl rooted at `seed`, with the seed queued at depth 0
    ///
    /// # Returns
    ///
    /// * `Err(UrlError::MissingDomain)` - if the seed has no host
    pub fn new(seed: Url, max_depth: u32) -> Result<Self, UrlError> {
        let base_domain = extract_domain(&seed).ok_or(UrlError::MissingDomain)?;

        let mut state = Self {
            frontier: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            found_emails: BTreeSet::new(),
            base_domain,
            max_depth,
            status: CrawlStatus::Running,
        };
        state.enqueue(seed, 0);
        Ok(state)
    }

    /// Host of the seed URL
    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    /// Returns true if the URL's host is exactly the base domain
    pub fn is_on_base_domain(&self, url: &Url) -> bool {
        extract_domain(url).is_some_and(|host| host == self.base_domain)
    }

    /// Queues a URL unless it is too deep, visited, or already queued
    ///
    /// # Returns
    ///
    /// * `true` - if the URL was added to the frontier
    pub fn enqueue(&mut self, url: Url, depth: u32) -> bool {
        if depth > self.max_depth {
            return false;
        }

        let key = url.as_str().to_string();
        if self.visited.contains(&key) || self.queued.contains(&key) {
            return false;
        }

        self.queued.insert(key);
        self.frontier.push_back(CrawlTask { url, depth });
        true
    }

    /// Pops the next task, or `None` once the frontier is empty or the crawl is no
    /// longer running
    pub fn next_task(&mut self) -> Option<CrawlTask> {
        if self.status.is_terminal() {
            return None;
        }

        let task = self.frontier.pop_front()?;
        self.queued.remove(task.url.as_str());
        Some(task)
    }

    /// Returns true if tasks remain and the crawl is still running
    pub fn has_pending(&self) -> bool {
        !self.status.is_terminal() && !self.frontier.is_empty()
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Records that a URL has been loaded (successfully or not)
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.queued.remove(url.as_str());
        self.visited.insert(url.as_str().to_string())
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn queued_count(&self) -> usize {
        self.frontier.len()
    }

    /// Adds a lowercase email; returns true if it was new
    pub fn add_email(&mut self, email: &str) -> bool {
        self.found_emails.insert(email.to_lowercase())
    }

    pub fn email_count(&self) -> usize {
        self.found_emails.len()
    }

    /// Switches to `EarlyExit` if the threshold is set and reached
    ///
    /// Only a running crawl can exit early.
    pub fn check_threshold(&mut self, min_emails_required: Option<usize>) -> bool {
        if let Some(min) = min_emails_required {
            if self.status == CrawlStatus::Running && self.found_emails.len() >= min {
                self.status = CrawlStatus::EarlyExit;
            }
        }
        self.is_early_exit()
    }

    pub fn is_early_exit(&self) -> bool {
        self.status == CrawlStatus::EarlyExit
    }

    /// Marks the crawl as failed by a fatal session error
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = CrawlStatus::Failed(reason.into());
    }

    /// Ends the crawl, returning the final status and the sorted email list
    ///
    /// A crawl still running at this point ran out of work.
    pub fn finish(mut self) -> (CrawlStatus, Vec<String>) {
        if self.status == CrawlStatus::Running {
            self.status = CrawlStatus::Exhausted;
        }
        (self.status, self.found_emails.into_iter().collect())
    }
}
