/// Crawl status definitions
///
/// A crawl starts `Running` and ends in exactly one of the other states.
use std::fmt;

/// Lifecycle state of a single website crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStatus {
    // ===== Active State =====
    /// The frontier is being drained
    Running,

    // ===== Terminal States =====
    /// The email threshold was reached; nothing more is dequeued
    EarlyExit,

    /// The frontier emptied before the threshold was reached
    Exhausted,

    /// The page session could not be created or died mid-crawl
    Failed(String),
}

impl CrawlStatus {
    /// Returns true once the crawl can make no further progress
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Returns true if the crawl ended because of a fatal session error
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Short label used in logs and summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::EarlyExit => "early_exit",
            Self::Exhausted => "exhausted",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.label()),
        }
    }
}
