//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from the start URL to the PDF.

use pdf_scraper::config::{Config, OutputConfig};
use pdf_scraper::crawler::{crawl, Coordinator};
use pdf_scraper::extract::Segment;
use pdf_scraper::output::{write_document, PdfSink};
use pdf_scraper::ScraperError;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration for the given start URL
fn create_test_config(start_url: &str, max_depth: u32) -> Config {
    let mut config = Config::default();
    config.crawler.start_url = start_url.to_string();
    config.crawler.max_depth = max_depth;
    config.crawler.parallelism = 2;
    config.crawler.delay_ms = 0;
    config.crawler.random_delay_ms = 0;
    config.crawler.request_timeout_secs = 10;
    config.crawler.timeout_secs = 30;
    config
}

/// An article page with the given title, paragraphs, and links
fn article(title: &str, paragraph: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <div class="Article">
        <div class="Header"><h1>{title}</h1></div>
        <p>{paragraph}</p><p>{anchors}</p>
        </div>
        </body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: String, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_docs_scenario_same_domain_only() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/docs",
        article(
            "Docs",
            "Welcome to the docs.",
            &["/docs/a", "/docs/b", "https://other.example/x"],
        ),
        1,
    )
    .await;
    mount_page(&mock_server, "/docs/a", article("Page A", "Alpha.", &[]), 1).await;
    mount_page(&mock_server, "/docs/b", article("Page B", "Beta.", &[]), 1).await;

    let config = create_test_config(&format!("{}/docs", base_url), 1);
    let outcome = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    let urls: Vec<_> = outcome.pages.iter().map(|p| p.url().to_string()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/docs", base_url),
            format!("{}/docs/a", base_url),
            format!("{}/docs/b", base_url),
        ]
    );

    let titles: Vec<_> = outcome.pages.iter().map(|p| p.title()).collect();
    assert_eq!(titles, vec!["Docs", "Page A", "Page B"]);
    assert_eq!(outcome.stats.pages_scraped, 3);
    assert!(!outcome.stats.timed_out);
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Every page links to every other page, and to itself
    let all = ["/", "/a", "/b"];
    mount_page(&mock_server, "/", article("Home", "Home.", &all), 1).await;
    mount_page(&mock_server, "/a", article("A", "A.", &all), 1).await;
    mount_page(&mock_server, "/b", article("B", "B.", &all), 1).await;

    let config = create_test_config(&format!("{}/", base_url), 3);
    let outcome = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(outcome.pages.len(), 3);
    assert_eq!(outcome.stats.urls_visited, 3);
    // wiremock verifies the expected hit counts when the server drops
}

#[tokio::test]
async fn test_depth_bound() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", article("Home", "Home.", &["/one"]), 1).await;
    mount_page(&mock_server, "/one", article("One", "One.", &["/two"]), 1).await;
    mount_page(&mock_server, "/two", article("Two", "Two.", &[]), 0).await;

    let config = create_test_config(&format!("{}/", base_url), 1);
    let outcome = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(outcome.pages.len(), 2);
    assert_eq!(outcome.stats.links_too_deep, 1);
}

#[tokio::test]
async fn test_depth_zero_fetches_only_start() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", article("Home", "Home.", &["/one"]), 1).await;
    mount_page(&mock_server, "/one", article("One", "One.", &[]), 0).await;

    let config = create_test_config(&format!("{}/", base_url), 0);
    let outcome = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(outcome.pages.len(), 1);
}

#[tokio::test]
async fn test_failed_fetches_are_not_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        article("Home", "Home.", &["/missing", "/broken", "/file.pdf", "/ok"]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/ok", article("Ok", "Fine.", &[]), 1).await;

    let config = create_test_config(&format!("{}/", base_url), 1);
    let outcome = Coordinator::new(config).unwrap().run().await.unwrap();

    let titles: Vec<_> = outcome.pages.iter().map(|p| p.title()).collect();
    assert_eq!(titles, vec!["Home", "Ok"]);
    assert_eq!(outcome.stats.fetch_errors, 3);
}

#[tokio::test]
async fn test_non_article_pages_still_lead_to_articles() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><body><nav><a href="/post">Post</a></nav></body></html>"#.to_string(),
        1,
    )
    .await;
    mount_page(&mock_server, "/post", article("Post", "Body.", &[]), 1).await;

    let config = create_test_config(&format!("{}/", base_url), 1);
    let outcome = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.pages[0].title(), "Post");
    assert_eq!(outcome.stats.non_articles, 1);
}

#[tokio::test]
async fn test_code_block_extracted_verbatim() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><body><div class="Article"><h1>Hello</h1><pre>fn main() {}</pre></div></body></html>"#
            .to_string(),
        1,
    )
    .await;

    let config = create_test_config(&format!("{}/", base_url), 0);
    let outcome = Coordinator::new(config).unwrap().run().await.unwrap();

    let page = &outcome.pages[0];
    assert_eq!(page.code_blocks(), &["fn main() {}".to_string()]);
    assert!(page.segments().contains(&Segment::CodeBlockRef(1)));
    assert!(page.content_text().contains("[Code Block 1]"));
}

#[tokio::test]
async fn test_origin_failure_yields_no_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", base_url), 2);
    let result = Coordinator::new(config).unwrap().run().await;

    assert!(matches!(result, Err(ScraperError::NoPages)));
}

#[tokio::test]
async fn test_deadline_drains_and_keeps_partial_results() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        article("Home", "Home.", &["/slow1", "/slow2"]),
        1,
    )
    .await;
    for route in ["/slow1", "/slow2"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                html(article("Slow", "Slow page.", &["/never"])).set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;
    }
    // Discovered only after the deadline, so never fetched
    mount_page(&mock_server, "/never", article("Never", "Never.", &[]), 0).await;

    let mut config = create_test_config(&format!("{}/", base_url), 3);
    config.crawler.timeout_secs = 1;

    let started = Instant::now();
    let outcome = Coordinator::new(config).unwrap().run().await.unwrap();

    assert!(outcome.stats.timed_out);
    assert!(started.elapsed() < Duration::from_secs(8));
    // In-flight fetches were allowed to finish
    assert_eq!(outcome.pages.len(), 3);
    assert!(outcome.pages.iter().all(|p| p.title() != "Never"));
}

#[tokio::test]
async fn test_external_cancellation_drains() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", article("Home", "Home.", &[]), 0).await;

    let config = create_test_config(&format!("{}/", base_url), 1);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = crawl(config, cancel).await;
    assert!(matches!(result, Err(ScraperError::NoPages)));
}

#[tokio::test]
async fn test_end_to_end_pdf() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/docs",
        article("Docs", "Welcome.", &["/docs/guide"]),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/docs/guide",
        r#"<html><body><div class="Article"><h1>Guide</h1>
        <p>Install it.</p><h2>Usage</h2><ul><li>one</li><li>two</li></ul>
        <pre>	indented()</pre></div></body></html>"#
            .to_string(),
        1,
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/docs", base_url), 1);
    let outcome = Coordinator::new(config).unwrap().run().await.unwrap();

    let output = OutputConfig {
        path: temp_dir.path().join("out").join("report").display().to_string(),
        ..OutputConfig::default()
    };
    let written = write_document(outcome.pages, &output, &PdfSink::new()).unwrap();

    assert_eq!(written, temp_dir.path().join("out").join("report.pdf"));
    let bytes = std::fs::read(&written).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    // Table of contents plus one page per chapter
    assert!(String::from_utf8_lossy(&bytes).contains("/Count 3"));
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/",
        article("Home", "Home.", &["/public", "/private"]),
        1,
    )
    .await;
    mount_page(&mock_server, "/public", article("Public", "Open.", &[]), 1).await;
    mount_page(&mock_server, "/private", article("Private", "Closed.", &[]), 0).await;

    let mut config = create_test_config(&format!("{}/", base_url), 1);
    config.crawler.respect_robots_txt = true;
    let outcome = Coordinator::new(config).unwrap().run().await.unwrap();

    let titles: Vec<_> = outcome.pages.iter().map(|p| p.title()).collect();
    assert_eq!(titles, vec!["Home", "Public"]);
    assert_eq!(outcome.stats.robots_denied, 1);
}

#[tokio::test]
async fn test_robots_txt_ignored_by_default() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", article("Home", "Home.", &[]), 1).await;

    let config = create_test_config(&format!("{}/", base_url), 1);
    let outcome = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(outcome.pages.len(), 1);
}
