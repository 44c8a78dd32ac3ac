use serde::Deserialize;

/// Words that mark a link as likely to lead to contact details
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "contact",
    "about",
    "email",
    "mail",
    "impressum",
    "legal",
    "privacy",
    "terms",
    "support",
    "kontakt",
    "ueberuns",
    "team",
];

/// Desktop Chrome user agent sent by both page backends
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.102 Safari/537.36";

/// Main configuration structure for Leadline
///
/// Every section has defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub batch: BatchConfig,
    pub validation: ValidationConfig,
    pub output: OutputConfig,
}

/// Page loading backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Static HTTP fetch and HTML parse
    #[default]
    Http,
    /// Headless Chromium (requires the `browser` feature)
    Browser,
}

/// Per-website crawl behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link depth from the seed URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of new links enqueued from a single page
    #[serde(rename = "max-links-per-page")]
    pub max_links_per_page: usize,

    /// Stop crawling a site once this many emails are known
    #[serde(rename = "min-emails-required")]
    pub min_emails_required: Option<usize>,

    /// Navigation timeout (milliseconds)
    #[serde(rename = "navigation-timeout-ms")]
    pub navigation_timeout_ms: u64,

    /// Timeout for element interactions such as overlay dismissal (milliseconds)
    #[serde(rename = "interaction-timeout-ms")]
    pub interaction_timeout_ms: u64,

    /// Pause between page visits within one crawl (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Contact-like keywords matched against link text and path
    pub keywords: Vec<String>,

    pub backend: Backend,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 1,
            max_links_per_page: 5,
            min_emails_required: None,
            navigation_timeout_ms: 30_000,
            interaction_timeout_ms: 15_000,
            page_delay_ms: 500,
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            backend: Backend::Http,
        }
    }
}

/// User agent configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Full User-Agent header value
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Worker pool and batching configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of websites crawled concurrently
    pub workers: usize,

    /// Listings buffered per enrichment batch in the search pipeline
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Rows per chunk in the email backfill
    #[serde(rename = "backfill-batch-size")]
    pub backfill_batch_size: usize,

    /// Early-exit threshold used by the backfill
    #[serde(rename = "backfill-min-emails")]
    pub backfill_min_emails: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            batch_size: 50,
            backfill_batch_size: 20,
            backfill_min_emails: Some(2),
        }
    }
}

/// Email validation configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// DNS servers queried for MX records
    pub nameservers: Vec<String>,

    /// Timeout of a single DNS query (milliseconds)
    #[serde(rename = "query-timeout-ms")]
    pub query_timeout_ms: u64,

    /// Tries per MX lookup before giving up
    pub attempts: u32,

    /// Pause between MX lookup tries (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Lifetime of a cached MX answer (seconds)
    #[serde(rename = "cache-expiry-secs")]
    pub cache_expiry_secs: u64,

    /// File with one disposable domain per line
    #[serde(rename = "disposable-list-path")]
    pub disposable_list_path: String,

    /// Concurrent validations per CSV file
    pub workers: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            nameservers: vec![
                "8.8.8.8".to_string(),
                "8.8.4.4".to_string(),
                "1.1.1.1".to_string(),
                "1.0.0.1".to_string(),
            ],
            query_timeout_ms: 1_000,
            attempts: 3,
            retry_delay_ms: 500,
            cache_expiry_secs: 300,
            disposable_list_path: "disposable_domain_list.txt".to_string(),
            workers: cpus.min(32),
        }
    }
}

/// File locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding one CSV file per search term
    #[serde(rename = "results-dir")]
    pub results_dir: String,

    /// File with one search term per line
    #[serde(rename = "search-terms-path")]
    pub search_terms_path: String,

    /// File that records search terms already finished
    #[serde(rename = "completed-terms-path")]
    pub completed_terms_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: "results".to_string(),
            search_terms_path: "search_terms.txt".to_string(),
            completed_terms_path: "completed_search_term.txt".to_string(),
        }
    }
}
