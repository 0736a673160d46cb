//! Re-runs against an existing results file

use crate::common::{crawl, read_rows, test_config, PAGE};
use std::io::Write;
use sumi_sieve::storage::{CsvStore, ResultStore};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_second_run_adds_no_duplicate_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let seeds = vec![format!("{}/page", server.uri()), "not-a-url".to_string()];

    let first = crawl(test_config(&csv), &seeds).await;
    assert_eq!(first.tasks.len(), 2);
    let rows_after_first = read_rows(&csv);

    let second = crawl(test_config(&csv), &seeds).await;
    assert_eq!(second.already_recorded, 2);
    assert!(second.tasks.is_empty());
    assert_eq!(read_rows(&csv), rows_after_first);
}

#[tokio::test]
async fn test_torn_trailing_row_is_recrawled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("out.csv");
    let url = format!("{}/page", server.uri());
    {
        let mut file = std::fs::File::create(&csv).unwrap();
        write!(
            file,
            "url,status_code,content_length,title,suspicious,timestamp\n{},200,12",
            url
        )
        .unwrap();
    }

    let store = CsvStore::open(&csv).unwrap();
    assert!(!store.contains(&url));
    drop(store);

    let report = crawl(test_config(&csv), &[url.clone()]).await;
    assert_eq!(report.tasks.len(), 1);

    let rows = read_rows(&csv);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].url, url);
    assert_eq!(rows[0].title, "Welcome");
}
