//! In-memory page sessions for unit tests

use crate::crawler::parser::parse_anchors;
use crate::crawler::session::{LoadedPage, PageSession, SessionFactory, VisitError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use url::Url;

#[derive(Debug, Default)]
struct SiteInner {
    pages: HashMap<String, String>,
    broken: HashSet<String>,
    fatal: HashSet<String>,
    panics: HashSet<String>,
    overlay: bool,
    fail_open: bool,
    visits: Vec<String>,
    overlay_attempts: usize,
    opened: usize,
    closed: usize,
}

/// A fake website: URL → markup, plus counters for assertions
#[derive(Debug, Clone, Default)]
pub struct StaticSite {
    inner: Arc<Mutex<SiteInner>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, markup: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), markup.to_string());
        self
    }

    /// Loading this URL fails with a navigation error
    pub fn broken(self, url: &str) -> Self {
        self.inner.lock().unwrap().broken.insert(url.to_string());
        self
    }

    /// Loading this URL kills the session
    pub fn fatal(self, url: &str) -> Self {
        self.inner.lock().unwrap().fatal.insert(url.to_string());
        self
    }

    /// Loading this URL panics
    pub fn panics(self, url: &str) -> Self {
        self.inner.lock().unwrap().panics.insert(url.to_string());
        self
    }

    /// Every page shows a consent overlay whose dismissal fails
    pub fn with_overlay(self) -> Self {
        self.inner.lock().unwrap().overlay = true;
        self
    }

    /// Opening a session fails
    pub fn unavailable(self) -> Self {
        self.inner.lock().unwrap().fail_open = true;
        self
    }

    pub fn session(&self) -> StaticSession {
        StaticSession {
            site: self.clone(),
            current: None,
        }
    }

    pub fn visits(&self) -> Vec<String> {
        self.inner.lock().unwrap().visits.clone()
    }

    pub fn overlay_attempts(&self) -> usize {
        self.inner.lock().unwrap().overlay_attempts
    }

    pub fn opened(&self) -> usize {
        self.inner.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.inner.lock().unwrap().closed
    }
}

#[derive(Debug)]
pub struct StaticSession {
    site: StaticSite,
    current: Option<(Url, String)>,
}

#[async_trait]
impl PageSession for StaticSession {
    async fn navigate(&mut self, url: &Url) -> Result<(), VisitError> {
        self.current = None;
        let markup = {
            let mut inner = self.site.inner.lock().unwrap();
            inner.visits.push(url.to_string());

            if inner.panics.contains(url.as_str()) {
                drop(inner);
                panic!("page handler crashed on {}", url);
            }
            if inner.fatal.contains(url.as_str()) {
                return Err(VisitError::Session("browser process exited".to_string()));
            }
            if inner.broken.contains(url.as_str()) {
                return Err(VisitError::Navigation {
                    url: url.to_string(),
                    reason: "HTTP 500".to_string(),
                });
            }
            inner
                .pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| VisitError::Navigation {
                    url: url.to_string(),
                    reason: "HTTP 404".to_string(),
                })?
        };

        self.current = Some((url.clone(), markup));
        Ok(())
    }

    async fn dismiss_overlay(&mut self) -> bool {
        let mut inner = self.site.inner.lock().unwrap();
        if inner.overlay {
            inner.overlay_attempts += 1;
        }
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
        self.site.inner.lock().unwrap().closed += 1;
    }
}

#[async_trait]
impl SessionFactory for StaticSite {
    type Session = StaticSession;

    async fn open(&self) -> Result<StaticSession, VisitError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_open {
            return Err(VisitError::Session("could not launch browser".to_string()));
        }
        inner.opened += 1;
        drop(inner);
        Ok(self.session())
    }
}
