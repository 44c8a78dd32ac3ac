//! Email validation
//!
//! This module handles:
//! - Format checks on harvested addresses
//! - Rejecting disposable-mailbox domains
//! - MX lookups with retries and a per-domain answer cache
//! - Filling the `valid_emails` column of result CSVs

pub mod cache;
pub mod disposable;
pub mod mx;

pub use cache::{CachedMx, MxCache};
pub use disposable::DisposableDomains;
pub use mx::{HickoryMxResolver, MxAnswer, MxLookupError, MxResolver};

use crate::config::ValidationConfig;
use crate::crawler::is_valid_email;
use crate::output::ValidationSummary;
use crate::storage::{list_csv_files, CsvStore, StoreError};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Mail providers accepted without a DNS lookup
pub const POPULAR_DOMAINS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "outlook.com",
    "hotmail.com",
    "aol.com",
    "icloud.com",
    "mail.com",
    "zoho.com",
    "protonmail.com",
    "gmx.com",
    "yandex.com",
];

/// Column written by the CSV validation pass
pub const VALID_EMAILS_COLUMN: &str = "valid_emails";

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to list results directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Decides whether an address is worth keeping
pub struct EmailValidator<R: MxResolver> {
    resolver: R,
    disposable: DisposableDomains,
    cache: MxCache,
    attempts: u32,
    retry_delay: Duration,
}

impl<R: MxResolver> EmailValidator<R> {
    pub fn new(resolver: R, disposable: DisposableDomains, config: &ValidationConfig) -> Self {
        Self {
            resolver,
            disposable,
            cache: MxCache::new(chrono::Duration::seconds(
                config.cache_expiry_secs.min(i64::MAX as u64) as i64,
            )),
            attempts: config.attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Checks a single address
    ///
    /// # Arguments
    ///
    /// * `email` - Address as found on a page; surrounding whitespace and case
    ///   are ignored
    ///
    /// # Returns
    ///
    /// `true` if the address is well-formed, not on a disposable domain, and its
    /// domain is either a popular provider or has MX records.
    pub async fn is_valid(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return false;
        }

        let Some((_, domain)) = email.rsplit_once('@') else {
            return false;
        };

        if self.disposable.contains(domain) {
            debug!("Rejecting disposable address {}", email);
            return false;
        }

        if POPULAR_DOMAINS.contains(&domain) {
            return true;
        }

        self.has_mx(domain).await
    }

    /// MX check with caching and retries
    ///
    /// Only definitive answers are cached. A domain whose lookups keep failing
    /// is treated as invalid for this call and retried on the next one.
    pub async fn has_mx(&self, domain: &str) -> bool {
        if let Some(has_mx) = self.cache.get(domain) {
            return has_mx;
        }

        for attempt in 1..=self.attempts {
            match self.resolver.lookup_mx(domain).await {
                Ok(answer) => {
                    let has_mx = answer == MxAnswer::Found;
                    self.cache.insert(domain, has_mx);
                    return has_mx;
                }
                Err(e) => {
                    debug!("Attempt {}/{}: {}", attempt, self.attempts, e);
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        warn!(
            "Giving up on MX lookup for {} after {} attempts",
            domain, self.attempts
        );
        false
    }

    pub fn cache(&self) -> &MxCache {
        &self.cache
    }
}

/// Fills the `valid_emails` column of one CSV file
///
/// Each row's `email` cell is split on `,`; the addresses are validated with at
/// most `workers` checks in flight, and the valid ones are written back in their
/// original order.
pub async fn validate_csv<R: MxResolver>(
    store: &CsvStore,
    validator: &EmailValidator<R>,
    workers: usize,
) -> Result<ValidationSummary, ValidationError> {
    let mut table = store.read_table()?;
    let mut summary = ValidationSummary {
        files: 1,
        rows: table.rows.len(),
        ..ValidationSummary::default()
    };

    if table.headers.is_empty() {
        return Ok(summary);
    }

    let target = table.ensure_column(VALID_EMAILS_COLUMN);
    let jobs: Vec<(usize, String)> = (0..table.rows.len())
        .flat_map(|row| {
            table
                .value(row, "email")
                .split(',')
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .map(|email| (row, email.to_string()))
                .collect::<Vec<_>>()
        })
        .collect();

    summary.emails_checked = jobs.len();
    info!(
        "Validating {} emails in {}",
        jobs.len(),
        store.path().display()
    );

    let results: Vec<(usize, String, bool)> = stream::iter(jobs)
        .map(|(row, email)| async move {
            let valid = validator.is_valid(&email).await;
            (row, email, valid)
        })
        .buffered(workers.max(1))
        .collect()
        .await;

    let mut valid_by_row: Vec<Vec<String>> = vec![Vec::new(); table.rows.len()];
    for (row, email, valid) in results {
        if valid {
            valid_by_row[row].push(email);
        }
    }

    for (row, valid) in valid_by_row.iter().enumerate() {
        summary.emails_valid += valid.len();
        table.set(row, target, valid.join(","));
    }

    store.write_table(&table)?;
    Ok(summary)
}

/// Runs [`validate_csv`] over every CSV in `dir`
///
/// A file that cannot be read or written is logged and counted as failed; the
/// remaining files are still processed.
pub async fn validate_results_dir<R: MxResolver>(
    dir: &Path,
    validator: &EmailValidator<R>,
    workers: usize,
) -> Result<ValidationSummary, ValidationError> {
    let mut total = ValidationSummary::default();

    for path in list_csv_files(dir)? {
        let store = CsvStore::new(&path);
        match validate_csv(&store, validator, workers).await {
            Ok(summary) => total.merge(&summary),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                total.files += 1;
                total.files_failed += 1;
            }
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Clone, Copy)]
    enum Canned {
        Found,
        NotFound,
        Timeout,
    }

    struct FakeResolver {
        answers: HashMap<String, Canned>,
        calls: AtomicUsize,
    }

    impl FakeResolver {
        fn new(answers: &[(&str, Canned)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(domain, answer)| (domain.to_string(), *answer))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MxResolver for FakeResolver {
        async fn lookup_mx(&self, domain: &str) -> Result<MxAnswer, MxLookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answers.get(domain) {
                Some(Canned::Found) => Ok(MxAnswer::Found),
                Some(Canned::NotFound) | None => Ok(MxAnswer::NotFound),
                Some(Canned::Timeout) => Err(MxLookupError::Timeout(domain.to_string())),
            }
        }
    }

    fn config() -> ValidationConfig {
        ValidationConfig {
            attempts: 3,
            retry_delay_ms: 0,
            ..ValidationConfig::default()
        }
    }

    fn validator(answers: &[(&str, Canned)]) -> EmailValidator<FakeResolver> {
        let disposable: DisposableDomains = ["mailinator.com"].into_iter().collect();
        EmailValidator::new(FakeResolver::new(answers), disposable, &config())
    }

    fn calls(validator: &EmailValidator<FakeResolver>) -> usize {
        validator.resolver.calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_malformed_addresses_rejected() {
        let v = validator(&[]);
        assert!(!v.is_valid("not-an-email").await);
        assert!(!v.is_valid("info@").await);
        assert!(!v.is_valid("info@example").await);
        assert_eq!(calls(&v), 0);
    }

    #[tokio::test]
    async fn test_popular_provider_skips_lookup() {
        let v = validator(&[]);
        assert!(v.is_valid("Someone@Gmail.com ").await);
        assert_eq!(calls(&v), 0);
    }

    #[tokio::test]
    async fn test_disposable_domain_rejected() {
        let v = validator(&[("mailinator.com", Canned::Found)]);
        assert!(!v.is_valid("x@mailinator.com").await);
        assert_eq!(calls(&v), 0);
    }

    #[tokio::test]
    async fn test_mx_answers_are_cached() {
        let v = validator(&[("acme.test", Canned::Found)]);
        assert!(v.is_valid("info@acme.test").await);
        assert!(v.is_valid("sales@acme.test").await);
        assert!(!v.is_valid("info@nomail.test").await);
        assert!(!v.is_valid("sales@nomail.test").await);

        assert_eq!(calls(&v), 2);
        assert_eq!(v.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_transient_errors_retried_and_not_cached() {
        let v = validator(&[("slow.test", Canned::Timeout)]);
        assert!(!v.is_valid("info@slow.test").await);
        assert_eq!(calls(&v), 3);
        assert!(v.cache().is_empty());

        assert!(!v.is_valid("info@slow.test").await);
        assert_eq!(calls(&v), 6);
    }

    #[tokio::test]
    async fn test_validate_csv_fills_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plumbers.csv");
        std::fs::write(
            &path,
            "id,name,email\n\
             a,Acme,\"info@acme.test,x@mailinator.com,bob@gmail.com\"\n\
             b,Nomail,info@nomail.test\n\
             c,Empty,\n",
        )
        .unwrap();

        let store = CsvStore::new(&path);
        let v = validator(&[("acme.test", Canned::Found)]);
        let summary = validate_csv(&store, &v, 4).await.unwrap();

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.emails_checked, 4);
        assert_eq!(summary.emails_valid, 2);

        let table = store.read_table().unwrap();
        assert_eq!(table.value(0, VALID_EMAILS_COLUMN), "info@acme.test,bob@gmail.com");
        assert_eq!(table.value(1, VALID_EMAILS_COLUMN), "");
        assert_eq!(table.value(2, VALID_EMAILS_COLUMN), "");
        assert_eq!(table.value(0, "email"), "info@acme.test,x@mailinator.com,bob@gmail.com");
    }

    #[tokio::test]
    async fn test_validate_csv_overwrites_previous_results() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bakers.csv");
        std::fs::write(&path, "id,email,valid_emails\na,info@nomail.test,stale@x.test\n").unwrap();

        let store = CsvStore::new(&path);
        validate_csv(&store, &validator(&[]), 2).await.unwrap();

        let table = store.read_table().unwrap();
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.value(0, VALID_EMAILS_COLUMN), "");
    }

    #[tokio::test]
    async fn test_validate_results_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.csv"), "id,email\n1,hi@gmail.com\n").unwrap();
        std::fs::write(dir.path().join("b.csv"), "id,email\n2,hi@yahoo.com\n3,\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let summary = validate_results_dir(dir.path(), &validator(&[]), 2)
            .await
            .unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.emails_valid, 2);
    }
}
