//! End-to-end crawl tests
//!
//! These tests use wiremock to create mock HTTP servers and check the
//! rows written for each kind of seed.

use crate::common::{crawl, read_rows, row_for, test_config, PAGE};
use std::time::Duration;
use sumi_sieve::crawler::FetchErrorKind;
use sumi_sieve::state::{RecordOutcome, SkipReason};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_mixed_seeds_write_one_row_per_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let mut config = test_config(&csv);
    config.crawler.max_concurrent = 2;

    let ok = format!("{}/a", server.uri());
    let seeds = vec![ok.clone(), "not-a-url".to_string(), ok.clone()];
    let report = crawl(config, &seeds).await;

    assert_eq!(report.duplicate_seeds, 1);
    let rows = read_rows(&csv);
    assert_eq!(rows.len(), 2);

    let page = row_for(&rows, &ok);
    assert_eq!(page.status_code, "200");
    assert_eq!(page.content_length, PAGE.len().to_string());
    assert_eq!(page.title, "Welcome");
    assert_eq!(page.suspicious, "false");
    assert!(page.timestamp.ends_with('Z'));

    let bad = row_for(&rows, "not-a-url");
    assert_eq!(bad.status_code, "");
    assert_eq!(bad.content_length, "");
    assert_eq!(bad.title, "");
    assert_eq!(bad.suspicious, "");
}

#[tokio::test]
async fn test_persistent_503_is_one_failure_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let url = format!("{}/busy", server.uri());
    let report = crawl(test_config(&csv), &[url.clone()]).await;

    assert_eq!(
        report.outcome_for(&url),
        Some(RecordOutcome::Failure(FetchErrorKind::HttpError))
    );
    let rows = read_rows(&csv);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status_code, "503");
    assert_eq!(rows[0].suspicious, "");
}

#[tokio::test]
async fn test_404_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let url = format!("{}/gone", server.uri());
    crawl(test_config(&csv), &[url]).await;

    let rows = read_rows(&csv);
    assert_eq!(rows[0].status_code, "404");
}

#[tokio::test]
async fn test_page_without_title_has_empty_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><main>hi</main></body></html>"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let url = format!("{}/bare", server.uri());
    let report = crawl(test_config(&csv), &[url.clone()]).await;

    assert_eq!(report.outcome_for(&url), Some(RecordOutcome::Success));
    let rows = read_rows(&csv);
    assert_eq!(rows[0].title, "");
    assert_eq!(rows[0].status_code, "200");
    assert_eq!(rows[0].suspicious, "false");
}

#[tokio::test]
async fn test_large_untitled_page_is_flagged() {
    let server = MockServer::start().await;
    let body = format!("<html><body><p>{}</p></body></html>", "filler text ".repeat(200));
    Mock::given(method("GET"))
        .and(path("/odd"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let url = format!("{}/odd", server.uri());
    let report = crawl(test_config(&csv), &[url]).await;

    assert_eq!(report.suspicious(), 1);
    assert_eq!(read_rows(&csv)[0].suspicious, "true");
}

#[tokio::test]
async fn test_non_http_seeds_make_no_requests() {
    let server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let host = server.address().to_string();
    let seeds = vec![
        format!("ftp://{}/file", host),
        "file:///etc/hosts".to_string(),
        "javascript:alert(1)".to_string(),
    ];
    let report = crawl(test_config(&csv), &seeds).await;

    assert_eq!(report.skipped(), 3);
    for seed in &seeds {
        assert_eq!(
            report.outcome_for(seed),
            Some(RecordOutcome::Skipped(SkipReason::InvalidUrl))
        );
    }
    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty(), "unexpected requests: {:?}", received);
    assert_eq!(read_rows(&csv).len(), 3);
}

#[tokio::test]
async fn test_timeout_on_every_attempt_is_one_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let mut config = test_config(&csv);
    config.crawler.request_timeout_secs = 2;
    config.crawler.robots_timeout_secs = 1;
    config.crawler.max_attempts = 2;

    let url = format!("{}/slow", server.uri());
    let report = crawl(config, &[url.clone()]).await;

    assert_eq!(
        report.outcome_for(&url),
        Some(RecordOutcome::Failure(FetchErrorKind::Timeout))
    );
    assert_eq!(report.tasks[0].attempts, 2);
    let rows = read_rows(&csv);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status_code, "");
}

#[tokio::test]
async fn test_oversized_page_is_too_large() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(4096)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let mut config = test_config(&csv);
    config.crawler.max_page_bytes = 1024;

    let url = format!("{}/huge", server.uri());
    let report = crawl(config, &[url.clone()]).await;

    assert_eq!(
        report.outcome_for(&url),
        Some(RecordOutcome::Failure(FetchErrorKind::TooLarge))
    );
    let rows = read_rows(&csv);
    assert_eq!(rows[0].status_code, "200");
    assert_eq!(rows[0].content_length, "");
}

#[tokio::test]
async fn test_concurrency_stays_within_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let mut config = test_config(&csv);
    config.crawler.max_concurrent = 3;

    let seeds: Vec<String> = (0..12).map(|i| format!("{}/p/{}", server.uri(), i)).collect();
    let report = crawl(config, &seeds).await;

    assert_eq!(report.tasks.len(), 12);
    assert!(report.peak_active <= 3, "peak was {}", report.peak_active);
    assert_eq!(read_rows(&csv).len(), 12);
}
