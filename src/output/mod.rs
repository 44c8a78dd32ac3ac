//! Output module for run summaries
//!
//! This module handles:
//! - Counting listings, crawls and emails across enrichment batches
//! - Counting checked and valid emails in validation runs
//! - Printing end-of-run summaries

pub mod stats;

pub use stats::{
    format_duration, print_run_summary, print_validation_summary, EnrichStats, RunSummary,
    ValidationSummary,
};
