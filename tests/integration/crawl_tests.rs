//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full crawls
//! and batch passes end-to-end over the HTTP backend.

use leadline::batch::{run_backfill, Enricher};
use leadline::config::{Config, CrawlerConfig, UserAgentConfig};
use leadline::crawler::{crawl_for_emails, CrawlOptions, HttpSessionFactory};
use leadline::storage::CsvStore;
use leadline::CrawlStatus;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn factory() -> HttpSessionFactory {
    let crawler = CrawlerConfig {
        navigation_timeout_ms: 5_000,
        page_delay_ms: 0,
        ..CrawlerConfig::default()
    };
    HttpSessionFactory::new(&UserAgentConfig::default(), &crawler)
        .expect("Failed to build HTTP client")
}

fn options(max_depth: u32, min_emails: Option<usize>) -> CrawlOptions {
    CrawlOptions {
        max_depth,
        min_emails_required: min_emails,
        page_delay: Duration::ZERO,
        ..CrawlOptions::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_unvisited(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html("never@visited.example"))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_case_variants_collapse() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "contact us at sales@example.com or SALES@example.com",
    )
    .await;

    let report = crawl_for_emails(&factory(), &server.uri(), &options(1, None)).await;

    assert_eq!(report.emails, vec!["sales@example.com"]);
    assert_eq!(report.status, CrawlStatus::Exhausted);
    assert_eq!(report.pages_visited, 1);
}

#[tokio::test]
async fn test_mailto_query_stripped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="mailto:Info@Foo.com?subject=Hi">Write to us</a>"#,
    )
    .await;

    let report = crawl_for_emails(&factory(), &server.uri(), &options(1, None)).await;

    assert_eq!(report.emails, vec!["info@foo.com"]);
}

#[tokio::test]
async fn test_depth_zero_stays_on_seed() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/contact">Contact</a>"#).await;
    mount_unvisited(&server, "/contact").await;

    let report = crawl_for_emails(&factory(), &server.uri(), &options(0, None)).await;

    assert!(report.emails.is_empty());
    assert_eq!(report.pages_visited, 1);
}

#[tokio::test]
async fn test_early_exit_skips_links() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"a@shop.example b@shop.example c@shop.example
        <a href="/contact">Contact</a>"#,
    )
    .await;
    mount_unvisited(&server, "/contact").await;

    let report = crawl_for_emails(&factory(), &server.uri(), &options(1, Some(1))).await;

    assert_eq!(report.emails.len(), 3);
    assert_eq!(report.status, CrawlStatus::EarlyExit);
}

#[tokio::test]
async fn test_off_domain_links_ignored() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="https://otherdomain.com/contact">Contact</a>
        <a href="/about-us">About us</a>"#,
    )
    .await;
    mount_page(&server, "/about-us", "team@shop.example").await;

    let report = crawl_for_emails(&factory(), &server.uri(), &options(1, None)).await;

    assert_eq!(report.emails, vec!["team@shop.example"]);
    assert_eq!(report.pages_visited, 2);
}

#[tokio::test]
async fn test_depth_two_follows_chain() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/about">About</a>"#).await;
    mount_page(&server, "/about", r#"<a href="/contact">Contact</a>"#).await;
    mount_page(&server, "/contact", "office@shop.example").await;

    let shallow = crawl_for_emails(&factory(), &server.uri(), &options(1, None)).await;
    assert!(shallow.emails.is_empty());

    let deep = crawl_for_emails(&factory(), &server.uri(), &options(2, None)).await;
    assert_eq!(deep.emails, vec!["office@shop.example"]);
    assert_eq!(deep.pages_visited, 3);
}

#[tokio::test]
async fn test_failed_pages_do_not_stop_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/contact">Contact</a>
        <a href="/impressum.pdf">Impressum</a>
        <a href="/about">About</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/impressum.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&server)
        .await;
    mount_page(&server, "/about", "hello@shop.example").await;

    let report = crawl_for_emails(&factory(), &server.uri(), &options(1, None)).await;

    assert_eq!(report.emails, vec!["hello@shop.example"]);
    assert_eq!(report.status, CrawlStatus::Exhausted);
    assert_eq!(report.pages_visited, 4);
    assert_eq!(report.pages_failed, 2);
}

#[tokio::test]
async fn test_unreachable_seed_yields_no_emails() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let report = crawl_for_emails(&factory(), &uri, &options(1, None)).await;

    assert!(report.emails.is_empty());
    assert!(!report.status.is_failure());
}

#[tokio::test]
async fn test_backfill_over_http() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/kontakt">Kontakt</a>"#,
    )
    .await;
    mount_page(&server, "/kontakt", "info@bakery.example, orders@bakery.example").await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let results = dir.path().join("results");
    std::fs::create_dir_all(&results).expect("Failed to create results dir");
    std::fs::write(
        results.join("bakeries.csv"),
        format!(
            "id,name,rating,reviews,address,website,phone,search_term,email\n\
             b1,Bakery,4.8,120,Main St 1,{},+155501,bakeries,\n\
             b2,No Site,3.9,4,Main St 2,,,bakeries,\n",
            server.uri()
        ),
    )
    .expect("Failed to write CSV");

    let mut config = Config::default();
    config.crawler.page_delay_ms = 0;
    config.batch.backfill_min_emails = None;
    config.output.results_dir = results.display().to_string();

    let enricher = Enricher::new(Arc::new(factory()), 2);
    let summary = run_backfill(&enricher, &config)
        .await
        .expect("Backfill failed");

    assert_eq!(summary.units, 1);
    assert_eq!(summary.stats.with_email, 1);

    let table = CsvStore::new(results.join("bakeries.csv"))
        .read_table()
        .expect("Failed to read CSV");
    assert_eq!(
        table.value(0, "email"),
        "info@bakery.example,orders@bakery.example"
    );
    assert_eq!(table.value(1, "email"), "");
    assert_eq!(table.value(0, "phone"), "+155501");
}
