//! Batch module for enriching many listings at once
//!
//! This module handles:
//! - Streaming listings from a search source
//! - Crawling listing websites with a bounded worker pool
//! - The search-term pipeline and the email backfill over existing CSVs

pub mod maps;
pub mod orchestrator;
pub mod pipeline;

pub use maps::{
    card_id, card_needs_opening, clean_phone, parse_rating, parse_reviews, ListingDetails,
};
#[cfg(feature = "browser")]
pub use maps::MapsListingSource;
pub use orchestrator::Enricher;
pub use pipeline::{run_backfill, run_search_pipeline};

use crate::storage::Listing;
use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised while producing listings
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Search for {term:?} failed: {reason}")]
    Search { term: String, reason: String },

    #[error("Listing consumer stopped")]
    ConsumerClosed,
}

/// Produces the listings matching a search term
#[async_trait]
pub trait ListingSource: Send {
    /// Sends every listing found for `term` into `tx`
    ///
    /// Listings whose id is in `known_ids` were stored by an earlier run and
    /// may be skipped without being read.
    ///
    /// # Returns
    ///
    /// * `Ok(count)` - number of listings sent
    /// * `Err(SourceError::ConsumerClosed)` - the receiver was dropped
    async fn search(
        &mut self,
        term: &str,
        known_ids: &HashSet<String>,
        tx: mpsc::Sender<Listing>,
    ) -> Result<usize, SourceError>;
}
