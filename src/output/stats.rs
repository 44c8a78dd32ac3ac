//! Run statistics
//!
//! This module provides the counters collected by batch operations and
//! functions for displaying them at the end of a run.

use crate::crawler::CrawlReport;
use chrono::{DateTime, Utc};

/// Counters for one or more enrichment batches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Listings handed to the enricher
    pub listings: usize,

    /// Listings whose website was crawled
    pub crawled: usize,

    /// Listings that ended with at least one email
    pub with_email: usize,

    /// Listings passed through because they have no website
    pub without_website: usize,

    /// Crawls that failed (session errors, bad addresses, crashed workers)
    pub failed: usize,

    /// Total emails across all listings
    pub emails_found: usize,

    /// Pages loaded or attempted across all crawls
    pub pages_visited: usize,
}

impl EnrichStats {
    /// Accounts for one finished crawl
    pub fn record(&mut self, report: &CrawlReport) {
        self.crawled += 1;
        self.pages_visited += report.pages_visited;
        self.emails_found += report.emails.len();
        if !report.emails.is_empty() {
            self.with_email += 1;
        }
        if report.status.is_failure() {
            self.failed += 1;
        }
    }

    /// Adds another batch's counters to these
    pub fn merge(&mut self, other: &EnrichStats) {
        self.listings += other.listings;
        self.crawled += other.crawled;
        self.with_email += other.with_email;
        self.without_website += other.without_website;
        self.failed += other.failed;
        self.emails_found += other.emails_found;
        self.pages_visited += other.pages_visited;
    }
}

/// Summary of a search-pipeline or backfill run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// "search" or "backfill"
    pub mode: &'static str,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Search terms or CSV files processed
    pub units: usize,

    /// Search terms or CSV files abandoned because of an error
    pub units_failed: usize,

    /// Listings skipped because their id was already processed
    pub duplicates_skipped: usize,

    pub stats: EnrichStats,
}

impl RunSummary {
    pub fn new(mode: &'static str) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            finished_at: None,
            units: 0,
            units_failed: 0,
            duplicates_skipped: 0,
            stats: EnrichStats::default(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Summary of an email validation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub files: usize,
    pub files_failed: usize,
    pub rows: usize,
    pub emails_checked: usize,
    pub emails_valid: usize,
}

impl ValidationSummary {
    pub fn merge(&mut self, other: &ValidationSummary) {
        self.files += other.files;
        self.files_failed += other.files_failed;
        self.rows += other.rows;
        self.emails_checked += other.emails_checked;
        self.emails_valid += other.emails_valid;
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Formats seconds as `1h 02m 03s` / `2m 03s` / `3s`
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Prints a run summary to stdout in a formatted manner
pub fn print_run_summary(summary: &RunSummary) {
    let unit = if summary.mode == "search" {
        "Search terms"
    } else {
        "CSV files"
    };

    println!("=== {} Summary ===\n", capitalize(summary.mode));

    println!("Overview:");
    println!("  {} processed: {}", unit, summary.units);
    if summary.units_failed > 0 {
        println!("  {} failed: {}", unit, summary.units_failed);
    }
    if let Some(seconds) = summary.duration_seconds() {
        println!("  Duration: {}", format_duration(seconds));
    }
    println!();

    let stats = &summary.stats;
    println!("Listings:");
    println!("  Total: {}", stats.listings);
    if summary.duplicates_skipped > 0 {
        println!("  Duplicates skipped: {}", summary.duplicates_skipped);
    }
    println!("  Without website: {}", stats.without_website);
    println!("  Websites crawled: {}", stats.crawled);
    println!(
        "  With email: {} ({:.1}% of crawled)",
        stats.with_email,
        percentage(stats.with_email, stats.crawled)
    );
    println!("  Crawl failures: {}", stats.failed);
    println!();

    println!("Emails found: {}", stats.emails_found);
    println!("Pages visited: {}", stats.pages_visited);
}

/// Prints a validation summary to stdout
pub fn print_validation_summary(summary: &ValidationSummary) {
    println!("=== Validation Summary ===\n");
    println!("  CSV files: {}", summary.files);
    if summary.files_failed > 0 {
        println!("  CSV files failed: {}", summary.files_failed);
    }
    println!("  Rows: {}", summary.rows);
    println!("  Emails checked: {}", summary.emails_checked);
    println!(
        "  Valid emails: {} ({:.1}%)",
        summary.emails_valid,
        percentage(summary.emails_valid, summary.emails_checked)
    );
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
