//! Leadline main entry point
//!
//! This is the command-line interface for the Leadline contact-email crawler.

use anyhow::{bail, Context};
use clap::Parser;
use leadline::batch::{run_backfill, Enricher};
use leadline::config::{load_config_with_hash, Backend, Config};
use leadline::crawler::{crawl_for_emails, CrawlOptions, HttpSessionFactory, SessionFactory};
use leadline::output::{print_run_summary, print_validation_summary};
use leadline::validation::{
    validate_results_dir, DisposableDomains, EmailValidator, HickoryMxResolver,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Leadline: contact emails for business listings
///
/// Leadline collects business listings for a list of search terms, crawls
/// each listing's website for contact email addresses, and validates the
/// addresses against DNS mail-exchange records.
#[derive(Parser, Debug)]
#[command(name = "leadline")]
#[command(version = "1.0.0")]
#[command(about = "Contact-email discovery for business listings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl a single website and print the emails found
    #[arg(long, value_name = "URL", conflicts_with_all = ["backfill", "validate", "dry_run"])]
    url: Option<String>,

    /// Fill empty email cells in the existing result CSVs
    #[arg(long, conflicts_with_all = ["validate", "dry_run"])]
    backfill: bool,

    /// Fill the valid_emails column of the existing result CSVs
    #[arg(long, conflicts_with = "dry_run")]
    validate: bool,

    /// Validate config and print the effective settings without crawling
    #[arg(long)]
    dry_run: bool,
}

/// Modes that crawl websites and therefore need a page session backend
enum CrawlMode {
    Single(String),
    Backfill,
    Search,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }
    if cli.validate {
        return handle_validate(&config).await;
    }

    let mode = match cli.url {
        Some(url) => CrawlMode::Single(url),
        None if cli.backfill => CrawlMode::Backfill,
        None => CrawlMode::Search,
    };

    match config.crawler.backend {
        Backend::Http => {
            let factory = HttpSessionFactory::new(&config.user_agent, &config.crawler)
                .context("Failed to build HTTP client")?;
            run_crawl_mode(mode, factory, &config).await
        }
        #[cfg(feature = "browser")]
        Backend::Browser => {
            let factory = leadline::crawler::BrowserSessionFactory::new(
                &config.user_agent,
                &config.crawler,
            );
            run_crawl_mode(mode, factory, &config).await
        }
        #[cfg(not(feature = "browser"))]
        Backend::Browser => bail!("The browser backend requires the `browser` feature"),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("leadline=info,warn"),
            1 => EnvFilter::new("leadline=debug,info"),
            2 => EnvFilter::new("leadline=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: prints the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Leadline Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Backend: {:?}", config.crawler.backend);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max links per page: {}", config.crawler.max_links_per_page);
    match config.crawler.min_emails_required {
        Some(min) => println!("  Stop after: {} emails", min),
        None => println!("  Stop after: never (crawl until exhausted)"),
    }
    println!(
        "  Navigation timeout: {}ms",
        config.crawler.navigation_timeout_ms
    );
    println!("  Page delay: {}ms", config.crawler.page_delay_ms);
    println!("  Keywords: {}", config.crawler.keywords.join(", "));

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.value);

    println!("\nBatch:");
    println!("  Workers: {}", config.batch.workers);
    println!("  Batch size: {}", config.batch.batch_size);
    println!("  Backfill batch size: {}", config.batch.backfill_batch_size);

    println!("\nValidation:");
    println!("  Nameservers: {}", config.validation.nameservers.join(", "));
    println!(
        "  Query timeout: {}ms x {} attempts",
        config.validation.query_timeout_ms, config.validation.attempts
    );
    println!(
        "  Disposable list: {}",
        config.validation.disposable_list_path
    );

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_dir);
    println!("  Search terms: {}", config.output.search_terms_path);
    println!("  Completed terms: {}", config.output.completed_terms_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --validate mode: checks every harvested address
async fn handle_validate(config: &Config) -> anyhow::Result<()> {
    let resolver = HickoryMxResolver::from_config(&config.validation)
        .context("Failed to build DNS resolver")?;
    let disposable =
        DisposableDomains::load(Path::new(&config.validation.disposable_list_path));
    let validator = EmailValidator::new(resolver, disposable, &config.validation);

    let summary = validate_results_dir(
        Path::new(&config.output.results_dir),
        &validator,
        config.validation.workers,
    )
    .await
    .context("Email validation failed")?;

    print_validation_summary(&summary);
    Ok(())
}

async fn run_crawl_mode<F>(mode: CrawlMode, factory: F, config: &Config) -> anyhow::Result<()>
where
    F: SessionFactory + 'static,
{
    match mode {
        CrawlMode::Single(url) => {
            let options = CrawlOptions::from_config(&config.crawler);
            let report = crawl_for_emails(&factory, &url, &options).await;

            println!("=== {} ===\n", report.seed);
            println!("  Status: {}", report.status);
            println!("  Pages visited: {}", report.pages_visited);
            println!("  Emails ({}):", report.emails.len());
            for email in &report.emails {
                println!("    {}", email);
            }

            if report.status.is_failure() {
                bail!("Crawl of {} failed: {}", report.seed, report.status);
            }
            Ok(())
        }
        CrawlMode::Backfill => {
            let enricher = Enricher::new(Arc::new(factory), config.batch.workers);
            let summary = run_backfill(&enricher, config)
                .await
                .context("Backfill failed")?;
            print_run_summary(&summary);
            Ok(())
        }
        CrawlMode::Search => run_search(factory, config).await,
    }
}

#[cfg(feature = "browser")]
async fn run_search<F>(factory: F, config: &Config) -> anyhow::Result<()>
where
    F: SessionFactory + 'static,
{
    use leadline::batch::{run_search_pipeline, MapsListingSource};

    let enricher = Enricher::new(Arc::new(factory), config.batch.workers);
    let mut source = MapsListingSource::new(&config.user_agent, &config.crawler);

    let result = run_search_pipeline(&mut source, &enricher, config).await;
    source.close().await;

    let summary = result.context("Search pipeline failed")?;
    print_run_summary(&summary);
    Ok(())
}

#[cfg(not(feature = "browser"))]
async fn run_search<F>(_factory: F, _config: &Config) -> anyhow::Result<()>
where
    F: SessionFactory + 'static,
{
    bail!("The search pipeline needs the map listing source; rebuild with `--features browser`")
}
