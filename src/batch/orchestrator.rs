//! Worker pool that crawls listing websites for emails

use crate::crawler::{crawl_for_emails, CrawlOptions, SessionFactory};
use crate::output::EnrichStats;
use crate::storage::Listing;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Runs email crawls for batches of listings, at most `workers` at a time
pub struct Enricher<F> {
    factory: Arc<F>,
    workers: usize,
}

impl<F> Enricher<F>
where
    F: SessionFactory + 'static,
{
    pub fn new(factory: Arc<F>, workers: usize) -> Self {
        Self {
            factory,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fills the `email` field of every listing
    ///
    /// Each listing with a website gets its own crawl with its own page session.
    /// The email becomes the comma-joined addresses found, or empty when nothing
    /// was found, the crawl failed, or the listing has no website. A crashed
    /// worker only affects its own listing.
    ///
    /// # Returns
    ///
    /// The listings in their original order and the batch counters.
    pub async fn enrich(
        &self,
        mut listings: Vec<Listing>,
        options: &CrawlOptions,
    ) -> (Vec<Listing>, EnrichStats) {
        let mut stats = EnrichStats {
            listings: listings.len(),
            ..EnrichStats::default()
        };

        let options = Arc::new(options.clone());
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (index, listing) in listings.iter_mut().enumerate() {
            listing.email.clear();

            let Some(website) = listing.website().map(str::to_string) else {
                stats.without_website += 1;
                continue;
            };

            let factory = Arc::clone(&self.factory);
            let options = Arc::clone(&options);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                let report = crawl_for_emails(factory.as_ref(), &website, &options).await;
                (index, report)
            });
        }

        info!(
            "Crawling {} websites with {} workers",
            tasks.len(),
            self.workers
        );

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => {
                    debug!(
                        "{}: {} emails ({})",
                        report.seed,
                        report.emails.len(),
                        report.status
                    );
                    stats.record(&report);
                    listings[index].email = report.joined_emails();
                }
                Err(e) => {
                    error!("Crawl worker crashed: {}", e);
                    stats.crawled += 1;
                    stats.failed += 1;
                }
            }
        }

        (listings, stats)
    }
}
