//! Crawler module for contact-email discovery
//!
//! This module contains the core crawling logic, including:
//! - Email extraction from markup and `mailto:` links
//! - Contact-link classification
//! - Page sessions (static HTTP, and headless Chromium behind the `browser` feature)
//! - Single-page visits
//! - The per-website crawl controller

mod classifier;
mod controller;
mod extractor;
mod fetcher;
mod parser;
mod session;
mod visitor;

#[cfg(feature = "browser")]
mod browser;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::relevant_links;
pub use controller::{crawl_for_emails, CrawlController, CrawlOptions, CrawlReport};
pub use extractor::{extract_emails, is_valid_email, mailto_address};
pub use fetcher::{build_http_client, HttpSession, HttpSessionFactory};
pub use parser::{parse_anchors, Anchor};
pub use session::{LoadedPage, PageSession, SessionFactory, VisitError};
pub use visitor::{visit_page, PageVisit};

#[cfg(feature = "browser")]
pub use browser::{BrowserSession, BrowserSessionFactory};

#[cfg(feature = "browser")]
pub(crate) use browser::launch_browser;
