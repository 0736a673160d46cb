//! The persisted crawl record and its CSV row shape

use crate::analysis::AnalysisResult;
use crate::crawler::FetchOutcome;
use crate::state::{RecordOutcome, SkipReason};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Column order of the results file
pub const CSV_HEADER: [&str; 6] = [
    "url",
    "status_code",
    "content_length",
    "title",
    "suspicious",
    "timestamp",
];

/// One result per URL
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlRecord {
    /// The seed as given (trimmed); the deduplication key
    pub url: String,

    /// HTTP status, if a response arrived
    pub status_code: Option<u16>,

    /// Body bytes read, if a response arrived
    pub content_length: Option<u64>,

    /// Page title; empty when unknown
    pub title: String,

    /// Analysis verdict; `None` when the page was never analyzed
    pub suspicious: Option<bool>,

    pub timestamp: DateTime<Utc>,

    /// How the task ended; kept in memory, not written to the file
    pub outcome: RecordOutcome,
}

impl CrawlRecord {
    /// Record for a URL that was never fetched
    pub fn skipped(url: &str, reason: SkipReason) -> Self {
        Self {
            url: single_line(url),
            status_code: None,
            content_length: None,
            title: String::new(),
            suspicious: None,
            timestamp: Utc::now(),
            outcome: RecordOutcome::Skipped(reason),
        }
    }

    /// Record for a fetch that ended in an error
    pub fn failed(url: &str, fetch: &FetchOutcome) -> Self {
        let outcome = match fetch.error_kind {
            Some(kind) => RecordOutcome::Failure(kind),
            None => RecordOutcome::Success,
        };
        Self {
            url: single_line(url),
            status_code: fetch.status_code,
            content_length: fetch.content_length,
            title: String::new(),
            suspicious: None,
            timestamp: Utc::now(),
            outcome,
        }
    }

    /// Record for a fetched and analyzed page
    pub fn succeeded(url: &str, fetch: &FetchOutcome, analysis: &AnalysisResult) -> Self {
        Self {
            url: single_line(url),
            status_code: fetch.status_code,
            content_length: fetch.content_length,
            title: single_line(&analysis.title),
            suspicious: Some(analysis.suspicious),
            timestamp: Utc::now(),
            outcome: RecordOutcome::Success,
        }
    }

    /// ISO-8601 UTC timestamp as written to the file
    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub(crate) fn to_row(&self) -> CsvRow<'_> {
        CsvRow {
            url: &self.url,
            status_code: self.status_code,
            content_length: self.content_length,
            title: &self.title,
            suspicious: self.suspicious,
            timestamp: self.timestamp_string(),
        }
    }
}

/// Serialized shape of a record; `None` becomes an empty field
#[derive(Debug, Serialize)]
pub(crate) struct CsvRow<'a> {
    url: &'a str,
    status_code: Option<u16>,
    content_length: Option<u64>,
    title: &'a str,
    suspicious: Option<bool>,
    timestamp: String,
}

/// Replaces line breaks and other control characters so a field can
/// never span two physical lines
pub(crate) fn single_line(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
