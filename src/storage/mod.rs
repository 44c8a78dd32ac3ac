//! Storage module for persisting listings and run progress
//!
//! This module handles all file persistence, including:
//! - Per-search-term CSV files of enriched listings
//! - Column management and in-place email updates
//! - Search-term lists and the completed-terms log

mod csv_store;
mod progress;
mod traits;

pub use csv_store::{CsvStore, CsvTable};
pub use progress::{
    csv_path_for_term, list_csv_files, mark_term_completed, pending_terms, read_lines,
};
pub use traits::{ListingStore, StoreError, StoreResult};

/// A business listing as stored in the results CSV
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    /// Stable identifier from the listing source
    pub id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    pub address: String,
    pub website: Option<String>,
    /// Digits and `+` only
    pub phone: String,
    pub search_term: String,
    /// Comma-joined emails, empty when none were found
    pub email: String,
}

impl Listing {
    /// Column order of newly created files
    pub const HEADERS: [&'static str; 9] = [
        "id",
        "name",
        "rating",
        "reviews",
        "address",
        "website",
        "phone",
        "search_term",
        "email",
    ];

    /// Cell value for the named column; unknown columns are empty
    pub fn field(&self, column: &str) -> String {
        match column {
            "id" => self.id.clone(),
            "name" => self.name.clone(),
            "rating" => self.rating.map(|r| r.to_string()).unwrap_or_default(),
            "reviews" => self.reviews.map(|r| r.to_string()).unwrap_or_default(),
            "address" => self.address.clone(),
            "website" => self.website.clone().unwrap_or_default(),
            "phone" => self.phone.clone(),
            "search_term" => self.search_term.clone(),
            "email" => self.email.clone(),
            _ => String::new(),
        }
    }

    /// Builds a listing from a table row, tolerating missing columns
    pub fn from_row(table: &CsvTable, row: usize) -> Self {
        let text = |name: &str| table.value(row, name).trim().to_string();
        let website = text("website");

        Self {
            id: text("id"),
            name: text("name"),
            rating: text("rating").parse().ok(),
            reviews: text("reviews").parse().ok(),
            address: text("address"),
            website: (!website.is_empty()).then_some(website),
            phone: text("phone"),
            search_term: text("search_term"),
            email: text("email"),
        }
    }

    /// Website with surrounding whitespace removed, if any
    pub fn website(&self) -> Option<&str> {
        self.website
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }
}
