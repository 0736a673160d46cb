//! Shared helpers for the integration tests

use std::path::Path;
use std::sync::Arc;
use sumi_sieve::config::Config;
use sumi_sieve::storage::{CsvStore, ResultStore};
use sumi_sieve::{Coordinator, CrawlReport};

/// One parsed row of the results file
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub url: String,
    pub status_code: String,
    pub content_length: String,
    pub title: String,
    pub suspicious: String,
    pub timestamp: String,
}

/// Fast settings for tests: short backoff, no jitter
pub fn test_config(csv_path: &Path) -> Config {
    let mut config = Config::default();
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.csv_path = csv_path.display().to_string();
    config.crawler.backoff_base_ms = 10;
    config.crawler.jitter_factor = 0.0;
    config.crawler.request_timeout_secs = 5;
    config.crawler.robots_timeout_secs = 2;
    config
}

/// Runs a crawl over `seeds` against the CSV file named in `config`
pub async fn crawl(config: Config, seeds: &[String]) -> CrawlReport {
    let store: Arc<dyn ResultStore> =
        Arc::new(CsvStore::open(Path::new(&config.output.csv_path)).unwrap());
    let coordinator = Coordinator::new(config, store).unwrap();
    coordinator.run(seeds).await
}

/// Reads every data row of a results file
pub fn read_rows(path: &Path) -> Vec<Row> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["url", "status_code", "content_length", "title", "suspicious", "timestamp"]
    );

    reader
        .records()
        .map(|record| {
            let record = record.unwrap();
            Row {
                url: record[0].to_string(),
                status_code: record[1].to_string(),
                content_length: record[2].to_string(),
                title: record[3].to_string(),
                suspicious: record[4].to_string(),
                timestamp: record[5].to_string(),
            }
        })
        .collect()
}

pub fn row_for<'a>(rows: &'a [Row], url: &str) -> &'a Row {
    rows.iter()
        .find(|r| r.url == url)
        .unwrap_or_else(|| panic!("no row for {}", url))
}

pub const PAGE: &str = "<html><head><title>Welcome</title></head>\
    <body><main><p>Plain page</p></main></body></html>";
