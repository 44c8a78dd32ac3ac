//! Search-term pipeline and email backfill
//!
//! Both drive the [`Enricher`] over batches of listings and persist the results
//! to one CSV file per search term after every batch, so an interrupted run loses
//! at most one batch of work.

use crate::batch::{Enricher, ListingSource};
use crate::config::Config;
use crate::crawler::{CrawlOptions, SessionFactory};
use crate::output::{EnrichStats, RunSummary};
use crate::storage::{
    csv_path_for_term, list_csv_files, mark_term_completed, pending_terms, CsvStore, Listing,
    ListingStore,
};
use crate::LeadlineError;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Runs every pending search term through `source` and the enricher
///
/// Terms already listed in the completed-terms file are skipped. A term whose
/// source or CSV fails is logged, counted in
/// [`RunSummary::units_failed`] and left pending for the next run; the
/// remaining terms still run.
///
/// # Arguments
///
/// * `source` - Produces listings for a search term
/// * `enricher` - Worker pool crawling listing websites
/// * `config` - Batch sizes, crawl settings and file locations
pub async fn run_search_pipeline<S, F>(
    source: &mut S,
    enricher: &Enricher<F>,
    config: &Config,
) -> Result<RunSummary, LeadlineError>
where
    S: ListingSource + ?Sized,
    F: SessionFactory + 'static,
{
    let mut summary = RunSummary::new("search");
    let terms = pending_terms(
        Path::new(&config.output.search_terms_path),
        Path::new(&config.output.completed_terms_path),
    )?;
    info!("{} search terms pending", terms.len());

    let options = CrawlOptions::from_config(&config.crawler);

    for term in &terms {
        info!("Processing search term: {}", term);
        summary.units += 1;

        match run_term(source, enricher, config, &options, term, &mut summary).await {
            Ok(()) => {
                mark_term_completed(Path::new(&config.output.completed_terms_path), term)?;
            }
            Err(e) => {
                warn!("Search term {:?} did not complete: {}", term, e);
                summary.units_failed += 1;
            }
        }
    }

    summary.finish();
    Ok(summary)
}

async fn run_term<S, F>(
    source: &mut S,
    enricher: &Enricher<F>,
    config: &Config,
    options: &CrawlOptions,
    term: &str,
    summary: &mut RunSummary,
) -> Result<(), LeadlineError>
where
    S: ListingSource + ?Sized,
    F: SessionFactory + 'static,
{
    let mut store = CsvStore::new(csv_path_for_term(
        Path::new(&config.output.results_dir),
        term,
    ));
    let mut seen = store.processed_ids()?;
    let known = seen.clone();
    let batch_size = config.batch.batch_size.max(1);

    let (tx, mut rx) = mpsc::channel::<Listing>(batch_size);

    let consumer = async {
        let mut batch = Vec::with_capacity(batch_size);
        let mut stats = EnrichStats::default();
        let mut duplicates = 0;

        while let Some(mut listing) = rx.recv().await {
            if !seen.insert(listing.id.clone()) {
                duplicates += 1;
                continue;
            }
            listing.search_term = term.to_string();
            batch.push(listing);

            if batch.len() >= batch_size {
                flush_batch(&mut store, enricher, std::mem::take(&mut batch), options, &mut stats)
                    .await?;
            }
        }

        flush_batch(&mut store, enricher, batch, options, &mut stats).await?;
        Ok::<_, LeadlineError>((stats, duplicates))
    };

    let (produced, consumed) = tokio::join!(source.search(term, &known, tx), consumer);

    let (stats, duplicates) = consumed?;
    summary.stats.merge(&stats);
    summary.duplicates_skipped += duplicates;

    let sent = produced?;
    info!(
        "{}: {} listings received, {} new, {} with email",
        term, sent, stats.listings, stats.with_email
    );
    Ok(())
}

async fn flush_batch<F>(
    store: &mut CsvStore,
    enricher: &Enricher<F>,
    batch: Vec<Listing>,
    options: &CrawlOptions,
    stats: &mut EnrichStats,
) -> Result<(), LeadlineError>
where
    F: SessionFactory + 'static,
{
    if batch.is_empty() {
        return Ok(());
    }

    let (enriched, batch_stats) = enricher.enrich(batch, options).await;
    store.append(&enriched)?;
    stats.merge(&batch_stats);
    Ok(())
}

/// Fills empty email cells in every CSV of the results directory
///
/// Rows with a website and an empty email are crawled in chunks of
/// `backfill-batch-size`, stopping each crawl early once
/// `backfill-min-emails` addresses are found. Results are written back after
/// every chunk.
pub async fn run_backfill<F>(
    enricher: &Enricher<F>,
    config: &Config,
) -> Result<RunSummary, LeadlineError>
where
    F: SessionFactory + 'static,
{
    let mut summary = RunSummary::new("backfill");
    let options = CrawlOptions::from_config(&config.crawler)
        .with_min_emails(config.batch.backfill_min_emails);

    for path in list_csv_files(Path::new(&config.output.results_dir))? {
        summary.units += 1;
        let mut store = CsvStore::new(&path);

        if let Err(e) = backfill_file(&mut store, enricher, config, &options, &mut summary).await {
            warn!("Backfill of {} stopped: {}", path.display(), e);
            summary.units_failed += 1;
        }
    }

    summary.finish();
    Ok(summary)
}

async fn backfill_file<F>(
    store: &mut CsvStore,
    enricher: &Enricher<F>,
    config: &Config,
    options: &CrawlOptions,
    summary: &mut RunSummary,
) -> Result<(), LeadlineError>
where
    F: SessionFactory + 'static,
{
    if store.ensure_column("email")? {
        info!("Added email column to {}", store.path().display());
    }

    let missing = store.missing_emails()?;
    if missing.is_empty() {
        return Ok(());
    }
    info!(
        "{}: {} listings without email",
        store.path().display(),
        missing.len()
    );

    for chunk in missing.chunks(config.batch.backfill_batch_size.max(1)) {
        let (enriched, stats) = enricher.enrich(chunk.to_vec(), options).await;
        summary.stats.merge(&stats);

        let updates: HashMap<String, String> = enriched
            .into_iter()
            .filter(|listing| !listing.email.is_empty())
            .map(|listing| (listing.id, listing.email))
            .collect();
        let updated = store.update_emails(&updates)?;
        info!("{}: updated {} rows", store.path().display(), updated);
    }

    Ok(())
}
