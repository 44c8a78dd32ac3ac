//! Storage traits and error types

use crate::storage::Listing;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { column: String, path: String },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for enriched business listings
pub trait ListingStore {
    /// Ids of all listings already stored
    fn processed_ids(&self) -> StoreResult<HashSet<String>>;

    /// Appends listings, creating the file with a header when needed
    fn append(&mut self, listings: &[Listing]) -> StoreResult<()>;

    /// Listings that have a website but no email yet
    fn missing_emails(&self) -> StoreResult<Vec<Listing>>;

    /// Sets the `email` cell of every listing whose id is a key of `emails`
    ///
    /// # Returns
    ///
    /// Number of rows changed
    fn update_emails(&mut self, emails: &HashMap<String, String>) -> StoreResult<usize>;
}
