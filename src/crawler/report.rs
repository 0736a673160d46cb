//! End-of-run report returned by the coordinator

use crate::state::{CrawlTask, RecordOutcome};
use crate::storage::CrawlRecord;
use std::collections::BTreeMap;
use std::time::Duration;

/// What happened when a record was handed to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Appended,
    /// Another record for the URL was already present
    Duplicate,
    /// Every write attempt failed; the URL has no row
    Failed,
}

/// Per-URL line of the report
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSummary {
    pub url: String,
    pub outcome: RecordOutcome,
    pub status_code: Option<u16>,
    pub attempts: u32,
    pub suspicious: Option<bool>,
    pub stored: StoreStatus,
}

impl TaskSummary {
    pub(crate) fn new(task: &CrawlTask, record: &CrawlRecord, stored: StoreStatus) -> Self {
        Self {
            url: task.url.clone(),
            outcome: record.outcome,
            status_code: record.status_code,
            attempts: task.attempt_count,
            suspicious: record.suspicious,
            stored,
        }
    }
}

/// Summary of one crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// One entry per task that reached the store, in completion order
    pub tasks: Vec<TaskSummary>,

    /// Seeds supplied, blanks and duplicates included
    pub seeds_total: usize,

    /// Blank seeds ignored
    pub blank_seeds: usize,

    /// Repeats of an earlier seed
    pub duplicate_seeds: usize,

    /// Seeds skipped because the store already had a row for them
    pub already_recorded: usize,

    /// Tasks never started because the run was interrupted
    pub not_started: usize,

    /// Most tasks active at once
    pub peak_active: usize,

    /// robots.txt fetches issued
    pub robots_fetches: usize,

    pub interrupted: bool,

    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn successes(&self) -> usize {
        self.count(|t| t.outcome.is_success())
    }

    pub fn failures(&self) -> usize {
        self.count(|t| t.outcome.is_failure())
    }

    pub fn skipped(&self) -> usize {
        self.count(|t| t.outcome.is_skipped())
    }

    pub fn suspicious(&self) -> usize {
        self.count(|t| t.suspicious == Some(true))
    }

    /// Records the store could not persist
    pub fn store_failures(&self) -> usize {
        self.count(|t| t.stored == StoreStatus::Failed)
    }

    /// Outcome recorded for a URL in this run
    pub fn outcome_for(&self, url: &str) -> Option<RecordOutcome> {
        self.tasks.iter().find(|t| t.url == url).map(|t| t.outcome)
    }

    /// Outcome label (`success`, `failure(timeout)`, ...) to count
    pub fn outcome_breakdown(&self) -> BTreeMap<String, usize> {
        let mut breakdown = BTreeMap::new();
        for task in &self.tasks {
            *breakdown.entry(task.outcome.to_string()).or_insert(0) += 1;
        }
        breakdown
    }

    fn count(&self, predicate: impl Fn(&TaskSummary) -> bool) -> usize {
        self.tasks.iter().filter(|t| predicate(t)).count()
    }
}
