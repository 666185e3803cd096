//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full mirror cycle end-to-end against a temporary output directory.

use std::path::{Path, PathBuf};
use std::time::Duration;
use sumi_mirror::config::Config;
use sumi_mirror::crawler::{run_crawl, Coordinator};
use sumi_mirror::{CrawlSummary, MirrorError};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `output`
fn create_test_config(output: &Path, max_depth: i32) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.workers = 4;
    config.crawler.timeout_secs = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.directory = output.to_path_buf();
    config
}

/// Directory the mock server's resources are mirrored into
fn host_dir(output: &Path, server: &MockServer) -> PathBuf {
    let url = url::Url::parse(&server.uri()).expect("Failed to parse base URL");
    output.join(format!(
        "{}_{}",
        url.host_str().expect("Failed to extract host"),
        url.port().expect("Mock server has an explicit port")
    ))
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

fn png() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(b"\x89PNG".to_vec(), "image/png")
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

async fn crawl(start: &str, config: &Config) -> CrawlSummary {
    run_crawl(start, config, CancellationToken::new())
        .await
        .expect("Crawl should start")
}

fn failed_report(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("failed.txt")).expect("Failure report should exist")
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(
        &mock_server,
        "/",
        html(
            r#"<html><head><link rel="stylesheet" href="/css/site.css"></head><body>
            <a href="page1.html">Page 1</a>
            <a href="page2.html">Page 2</a>
            <img src="logo.png">
            </body></html>"#,
        ),
        1,
    )
    .await;
    mount(
        &mock_server,
        "/page1.html",
        html(r#"<a href="/">Home</a><a href="page2.html">Page 2</a><img src="/logo.png">"#),
        1,
    )
    .await;
    mount(&mock_server, "/page2.html", html("<p>Leaf page</p>"), 1).await;
    mount(&mock_server, "/logo.png", png(), 1).await;
    mount(
        &mock_server,
        "/css/site.css",
        ResponseTemplate::new(200).set_body_raw(b"body{}".to_vec(), "text/css"),
        1,
    )
    .await;

    let config = create_test_config(output.path(), 0);
    let summary = crawl(&format!("{}/", mock_server.uri()), &config).await;

    assert_eq!(summary.pages_crawled, 3);
    assert_eq!(summary.media_fetched, 2);
    assert!(summary.failed.is_empty());
    assert!(!summary.cancelled);

    let site = host_dir(output.path(), &mock_server);
    assert!(std::fs::read_to_string(site.join("index.html"))
        .unwrap()
        .contains("page1.html"));
    assert_eq!(
        std::fs::read_to_string(site.join("page2.html")).unwrap(),
        "<p>Leaf page</p>"
    );
    assert_eq!(std::fs::read(site.join("logo.png")).unwrap(), b"\x89PNG");
    assert_eq!(std::fs::read(site.join("css/site.css")).unwrap(), b"body{}");
    assert_eq!(failed_report(&site), "");
}

#[tokio::test]
async fn test_depth_limit_and_media_bypass() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(
        &mock_server,
        "/docs/index.html",
        html(
            r#"<a href="intro.html">Intro</a>
            <a href="deep/page.html">Too deep</a>
            <a href="/blog/post.html">Outside the base directory</a>
            <img src="/assets/img/photo.png">"#,
        ),
        1,
    )
    .await;
    mount(&mock_server, "/docs/intro.html", html("intro"), 1).await;
    mount(&mock_server, "/docs/deep/page.html", html("deep"), 0).await;
    mount(&mock_server, "/blog/post.html", html("blog"), 0).await;
    mount(&mock_server, "/assets/img/photo.png", png(), 1).await;

    let config = create_test_config(output.path(), 0);
    let summary = crawl(&format!("{}/docs/index.html", mock_server.uri()), &config).await;

    assert_eq!(summary.pages_crawled, 2);
    assert_eq!(summary.media_fetched, 1);

    let site = host_dir(output.path(), &mock_server);
    assert!(site.join("assets/img/photo.png").is_file());
    assert!(!site.join("docs/deep").exists());
}

#[tokio::test]
async fn test_positive_depth_allows_subdirectories() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(
        &mock_server,
        "/docs/index.html",
        html(r#"<a href="a/one.html">One</a>"#),
        1,
    )
    .await;
    mount(
        &mock_server,
        "/docs/a/one.html",
        html(r#"<a href="b/two.html">Two</a>"#),
        1,
    )
    .await;
    mount(&mock_server, "/docs/a/b/two.html", html("two"), 0).await;

    let config = create_test_config(output.path(), 1);
    let summary = crawl(&format!("{}/docs/index.html", mock_server.uri()), &config).await;

    assert_eq!(summary.pages_crawled, 2);
}

#[tokio::test]
async fn test_negative_depth_widens_scope_upward() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(
        &mock_server,
        "/a/b/index.html",
        html(
            r#"<a href="../c/sibling.html">Sibling</a>
            <a href="/x/unrelated.html">Unrelated</a>"#,
        ),
        1,
    )
    .await;
    mount(&mock_server, "/a/c/sibling.html", html("sibling"), 1).await;
    mount(&mock_server, "/x/unrelated.html", html("unrelated"), 0).await;

    let config = create_test_config(output.path(), -1);
    let summary = crawl(&format!("{}/a/b/index.html", mock_server.uri()), &config).await;

    assert_eq!(summary.pages_crawled, 2);
    assert!(host_dir(output.path(), &mock_server)
        .join("a/c/sibling.html")
        .is_file());
}

#[tokio::test]
async fn test_foreign_host_never_fetched() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(
        &mock_server,
        "/",
        html(&format!(
            r#"<a href="{0}/page.html">Elsewhere</a><img src="{0}/image.png">"#,
            other_server.uri()
        )),
        1,
    )
    .await;
    mount(&other_server, "/page.html", html("elsewhere"), 0).await;
    mount(&other_server, "/image.png", png(), 0).await;

    let config = create_test_config(output.path(), 5);
    let summary = crawl(&format!("{}/", mock_server.uri()), &config).await;

    assert_eq!(summary.pages_crawled, 1);
    assert_eq!(summary.media_fetched, 0);
    assert!(!host_dir(output.path(), &other_server).exists());
}

#[tokio::test]
async fn test_failures_are_isolated_and_reported() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(
        &mock_server,
        "/",
        html(
            r#"<a href="broken.html">Broken</a>
            <a href="ok.html">Ok</a>
            <img src="missing.png">"#,
        ),
        1,
    )
    .await;
    mount(
        &mock_server,
        "/broken.html",
        ResponseTemplate::new(500),
        1,
    )
    .await;
    mount(&mock_server, "/ok.html", html(r#"<img src="missing.png">"#), 1).await;
    mount(&mock_server, "/missing.png", ResponseTemplate::new(404), 1).await;

    let config = create_test_config(output.path(), 0);
    let summary = crawl(&format!("{}/", mock_server.uri()), &config).await;

    assert_eq!(summary.pages_crawled, 2);
    assert_eq!(summary.pages_failed, 1);
    assert!(!summary.cancelled);

    let base = mock_server.uri();
    let expected = format!("{0}/broken.html\n{0}/missing.png\n", base);
    let site = host_dir(output.path(), &mock_server);
    assert_eq!(failed_report(&site), expected);
    assert!(site.join("ok.html").is_file());
    assert!(!site.join("broken.html").exists());
    assert_eq!(summary.report_path, Some(site.join("failed.txt")));
}

#[tokio::test]
async fn test_query_and_fragment_variants_fetched_once() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(
        &mock_server,
        "/",
        html(
            r##"<a href="page.html?a=1">A</a>
            <a href="page.html?a=2">B</a>
            <a href="page.html#section">C</a>
            <a href="./page.html">D</a>"##,
        ),
        1,
    )
    .await;
    mount(&mock_server, "/page.html", html("page"), 1).await;

    let config = create_test_config(output.path(), 0);
    let summary = crawl(&format!("{}/", mock_server.uri()), &config).await;

    assert_eq!(summary.pages_crawled, 2);
}

#[tokio::test]
async fn test_request_timeout_is_recorded() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(&mock_server, "/", html(r#"<a href="slow.html">Slow</a>"#), 1).await;
    Mock::given(method("GET"))
        .and(path("/slow.html"))
        .respond_with(html("slow").set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(output.path(), 0);
    config.crawler.timeout_secs = 1;
    let summary = crawl(&format!("{}/", mock_server.uri()), &config).await;

    assert_eq!(summary.pages_crawled, 1);
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].as_str().ends_with("/slow.html"));
}

#[tokio::test]
async fn test_run_timeout_lets_in_flight_page_finish() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let links: String = (0..4)
        .map(|i| format!(r#"<a href="slow-{}.html">Slow</a>"#, i))
        .collect();
    mount(&mock_server, "/", html(&links), 1).await;
    mount(
        &mock_server,
        "/slow-0.html",
        html("slow").set_delay(Duration::from_secs(2)),
        1,
    )
    .await;
    for i in 1..4 {
        mount(&mock_server, &format!("/slow-{}.html", i), html("slow"), 0).await;
    }

    let mut config = create_test_config(output.path(), 0);
    config.crawler.workers = 1;
    config.crawler.run_timeout_secs = Some(1);
    let summary = crawl(&format!("{}/", mock_server.uri()), &config).await;

    assert!(summary.cancelled);
    assert_eq!(summary.pages_crawled, 2);
    assert!(summary.failed.is_empty());

    let site = host_dir(output.path(), &mock_server);
    assert!(site.join("slow-0.html").is_file());
    assert!(!site.join("slow-1.html").exists());
    assert_eq!(failed_report(&site), "");
}

#[tokio::test]
async fn test_redirects_stay_on_host() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(
        &mock_server,
        "/",
        html(r#"<a href="docs">Docs</a><a href="away.html">Away</a>"#),
        1,
    )
    .await;
    mount(
        &mock_server,
        "/docs",
        ResponseTemplate::new(301).insert_header("Location", "/docs/"),
        1,
    )
    .await;
    mount(&mock_server, "/docs/", html(r#"<a href="page.html">Page</a>"#), 1).await;
    mount(&mock_server, "/docs/page.html", html("page"), 1).await;
    mount(&mock_server, "/page.html", html("wrong base"), 0).await;
    mount(
        &mock_server,
        "/away.html",
        ResponseTemplate::new(302)
            .insert_header("Location", format!("{}/page.html", other_server.uri()).as_str()),
        1,
    )
    .await;
    mount(&other_server, "/page.html", html("elsewhere"), 0).await;

    let config = create_test_config(output.path(), 1);
    let summary = crawl(&format!("{}/", mock_server.uri()), &config).await;

    assert_eq!(summary.pages_crawled, 3);
    let failed: Vec<&str> = summary.failed.iter().map(|u| u.as_str()).collect();
    assert_eq!(failed, vec![format!("{}/away.html", mock_server.uri())]);

    let site = host_dir(output.path(), &mock_server);
    assert!(site.join("docs/index.html").is_file());
    assert!(site.join("docs/page.html").is_file());
    assert!(!host_dir(output.path(), &other_server).exists());
}

#[tokio::test]
async fn test_cancelled_run_stops_dispatching() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(&mock_server, "/", html(r#"<a href="next.html">Next</a>"#), 0).await;

    let config = create_test_config(output.path(), 0);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = run_crawl(&format!("{}/", mock_server.uri()), &config, cancel)
        .await
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.pages_crawled, 0);
}

#[tokio::test]
async fn test_coordinator_token_cancels_before_dispatch() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount(&mock_server, "/", html("home"), 0).await;

    let config = create_test_config(output.path(), 0);
    let coordinator = Coordinator::from_config(
        &format!("{}/", mock_server.uri()),
        &config,
        CancellationToken::new(),
    )
    .expect("Coordinator should build");
    coordinator.cancellation_token().cancel();

    let summary = coordinator.run().await;

    assert!(summary.cancelled);
    assert_eq!(summary.pages_crawled, 0);
    assert_eq!(failed_report(&host_dir(output.path(), &mock_server)), "");
}

#[tokio::test]
async fn test_invalid_start_url_is_config_error() {
    let output = TempDir::new().unwrap();
    let config = create_test_config(output.path(), 0);

    for start in ["not a url", "ftp://example.com/", "/relative/path"] {
        let result = run_crawl(start, &config, CancellationToken::new()).await;
        assert!(
            matches!(result, Err(MirrorError::Config(_))),
            "{} should be rejected",
            start
        );
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_unwritable_output_root_is_config_error() {
    let mock_server = MockServer::start().await;
    mount(&mock_server, "/", html("home"), 0).await;

    // Exists and is a directory, but no file can be created in it
    let config = create_test_config(Path::new("/proc"), 0);
    let result = run_crawl(
        &format!("{}/", mock_server.uri()),
        &config,
        CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(MirrorError::Config(_))));
}
