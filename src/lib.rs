//! Leadline: a contact-email crawler for lead generation
//!
//! This crate discovers business listings, crawls each listing's website for
//! contact email addresses (following a handful of "contact-like" links up to a
//! depth limit), and validates the harvested addresses against DNS MX records
//! and a disposable-domain blocklist.

pub mod batch;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;
pub mod validation;

use thiserror::Error;

/// Main error type for Leadline operations
#[derive(Debug, Error)]
pub enum LeadlineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Page session error: {0}")]
    Session(#[from] crawler::VisitError),

    #[error("Listing source error: {0}")]
    Source(#[from] batch::SourceError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StoreError),

    #[error("Email validation error: {0}")]
    Validation(#[from] validation::ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid nameserver address: {0}")]
    InvalidNameserver(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Empty URL")]
    Empty,
}

/// Result type alias for Leadline operations
pub type Result<T> = std::result::Result<T, LeadlineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_for_emails, CrawlOptions, CrawlReport};
pub use state::{CrawlState, CrawlStatus, CrawlTask};
pub use url::{extract_domain, is_same_site, normalize_url, seed_url};
