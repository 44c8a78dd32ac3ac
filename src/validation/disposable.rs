//! Disposable email domain blocklist

use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Set of throwaway-mailbox domains
#[derive(Debug, Clone, Default)]
pub struct DisposableDomains {
    domains: HashSet<String>,
}

impl DisposableDomains {
    /// Loads one domain per line; blank lines and `#` comments are ignored
    ///
    /// A missing or unreadable file yields an empty list and a warning, so
    /// validation still runs on MX records alone.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let list = Self::parse(&content);
                info!(
                    "Loaded {} disposable domains from {}",
                    list.len(),
                    path.display()
                );
                list
            }
            Err(e) => {
                warn!(
                    "Could not load disposable domain list {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Self {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains(&domain.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for DisposableDomains {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            domains: iter.into_iter().map(str::to_lowercase).collect(),
        }
    }
}
