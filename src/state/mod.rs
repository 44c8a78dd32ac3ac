//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlTask`: A URL waiting to be visited, with its depth from the seed
//! - `CrawlState`: Frontier, visited set, found emails and status of one website crawl
//! - `CrawlStatus`: Running / early exit / exhausted / failed

mod crawl_state;
mod crawl_status;

// Re-export main types
pub use crawl_state::{CrawlState, CrawlTask};
pub use crawl_status::CrawlStatus;
