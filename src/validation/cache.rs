//! MX lookup caching
//!
//! Definitive answers are cached per domain and expire after a configurable age,
//! so a long validation pass does not keep trusting a stale DNS answer.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Cached MX answer for a domain
#[derive(Debug, Clone, Copy)]
pub struct CachedMx {
    /// Whether the domain has at least one MX record
    pub has_mx: bool,

    /// When the answer was received
    pub checked_at: DateTime<Utc>,
}

impl CachedMx {
    pub fn new(has_mx: bool) -> Self {
        Self {
            has_mx,
            checked_at: Utc::now(),
        }
    }

    /// Checks if the answer is older than `expiry`
    pub fn is_stale(&self, expiry: Duration) -> bool {
        self.age() > expiry
    }

    /// Returns how long ago the answer was received
    pub fn age(&self) -> Duration {
        Utc::now() - self.checked_at
    }
}

/// Per-domain MX answers shared by concurrent validations
#[derive(Debug)]
pub struct MxCache {
    entries: Mutex<HashMap<String, CachedMx>>,
    expiry: Duration,
}

impl MxCache {
    pub fn new(expiry: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            expiry,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedMx>> {
        // A panic while holding the lock cannot leave a map entry half-written
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fresh cached answer for `domain`; stale entries are evicted
    pub fn get(&self, domain: &str) -> Option<bool> {
        let mut entries = self.entries();
        match entries.get(domain) {
            Some(entry) if entry.is_stale(self.expiry) => {
                entries.remove(domain);
                None
            }
            Some(entry) => Some(entry.has_mx),
            None => None,
        }
    }

    pub fn insert(&self, domain: &str, has_mx: bool) {
        self.insert_entry(domain, CachedMx::new(has_mx));
    }

    pub fn insert_entry(&self, domain: &str, entry: CachedMx) {
        self.entries().insert(domain.to_string(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
