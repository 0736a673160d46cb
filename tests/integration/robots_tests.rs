//! robots.txt handling against a live mock server

use crate::common::{crawl, read_rows, row_for, test_config, PAGE};
use std::time::Duration;
use sumi_sieve::state::{RecordOutcome, SkipReason};
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_robots_fetched_once_for_concurrent_tasks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /private/\n")
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/private/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let mut config = test_config(&csv);
    config.crawler.max_concurrent = 5;

    let seeds: Vec<String> = (0..5)
        .map(|i| format!("{}/private/{}", server.uri(), i))
        .collect();
    let report = crawl(config, &seeds).await;

    assert_eq!(report.robots_fetches, 1);
    for seed in &seeds {
        assert_eq!(
            report.outcome_for(seed),
            Some(RecordOutcome::Skipped(SkipReason::Disallowed))
        );
    }

    let rows = read_rows(&csv);
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.status_code.is_empty()));
}

#[tokio::test]
async fn test_named_group_applies_to_crawler_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /\n",
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let url = format!("{}/page", server.uri());
    let report = crawl(test_config(&csv), &[url.clone()]).await;

    assert_eq!(
        report.outcome_for(&url),
        Some(RecordOutcome::Skipped(SkipReason::Disallowed))
    );
}

#[tokio::test]
async fn test_robots_server_error_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let url = format!("{}/page", server.uri());
    let report = crawl(test_config(&csv), &[url.clone()]).await;

    assert_eq!(report.outcome_for(&url), Some(RecordOutcome::Success));
    assert_eq!(row_for(&read_rows(&csv), &url).title, "Welcome");
}

#[tokio::test]
async fn test_slow_robots_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /\n")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let mut config = test_config(&csv);
    config.crawler.robots_timeout_secs = 1;

    let url = format!("{}/page", server.uri());
    let report = crawl(config, &[url.clone()]).await;

    assert_eq!(report.outcome_for(&url), Some(RecordOutcome::Success));
}

#[tokio::test]
async fn test_bom_prefixed_robots_is_honored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"\xEF\xBB\xBFUser-agent: *\nDisallow: /private\n".to_vec()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let url = format!("{}/private/a", server.uri());
    let report = crawl(test_config(&csv), &[url.clone()]).await;

    assert_eq!(
        report.outcome_for(&url),
        Some(RecordOutcome::Skipped(SkipReason::Disallowed))
    );
}
