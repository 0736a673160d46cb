//! Crawler coordinator - main crawl orchestration logic
//!
//! This module drives every seed through the pipeline:
//! - Deduplicating seeds and skipping URLs the store already has
//! - Running a fixed pool of workers over a shared queue
//! - Validate → robots check → fetch → analyze → record, per task
//! - Retrying failed store writes
//! - Handling interrupts with a bounded grace period

use crate::analysis::{AnalysisResult, ContentAnalyzer};
use crate::config::Config;
use crate::crawler::report::{CrawlReport, StoreStatus, TaskSummary};
use crate::crawler::scheduler::{ActiveGauge, Scheduler};
use crate::crawler::{FetchOutcome, Fetcher, HttpTransport, Transport};
use crate::robots::RobotsGate;
use crate::state::{CrawlTask, SkipReason, TaskState};
use crate::storage::{
    open_store, single_line, AppendOutcome, CrawlRecord, ResultStore, StoreError,
};
use crate::url::{sanitize_for_log, validate_url};
use crate::SieveError;
use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

/// Write attempts per record before giving up on it
const STORE_ATTEMPTS: u32 = 3;

/// Delay before the second store attempt; grows linearly
const STORE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// The per-task pipeline, shared by all workers
#[derive(Clone)]
struct Pipeline {
    robots: Arc<RobotsGate>,
    fetcher: Arc<Fetcher>,
    analyzer: Arc<ContentAnalyzer>,
    store: Arc<dyn ResultStore>,
}

/// Seeds sorted into runnable tasks and the reasons others were dropped
#[derive(Debug, Default)]
struct Plan {
    tasks: Vec<CrawlTask>,
    seeds_total: usize,
    blank_seeds: usize,
    duplicate_seeds: usize,
    already_recorded: usize,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    pipeline: Pipeline,
}

impl Coordinator {
    /// Creates a coordinator that fetches over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `store` - Where records are written
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SieveError)` - The HTTP client could not be built
    pub fn new(config: Config, store: Arc<dyn ResultStore>) -> Result<Self, SieveError> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config)?);
        Ok(Self::with_transport(config, store, transport))
    }

    /// Creates a coordinator over any transport
    pub fn with_transport(
        config: Config,
        store: Arc<dyn ResultStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let pipeline = Pipeline {
            robots: Arc::new(RobotsGate::from_config(transport.clone(), &config)),
            fetcher: Arc::new(Fetcher::from_config(transport, &config)),
            analyzer: Arc::new(ContentAnalyzer::from_config(&config.analysis)),
            store,
        };

        Self {
            config: Arc::new(config),
            pipeline,
        }
    }

    /// Crawls `seeds` to completion
    pub async fn run(&self, seeds: &[String]) -> CrawlReport {
        self.run_until(seeds, std::future::pending::<()>()).await
    }

    /// Crawls `seeds` until done or until `shutdown` resolves
    ///
    /// After `shutdown` resolves no new task is started. Tasks already
    /// running get the configured grace period to reach the store; any
    /// still running after that are aborted and leave no row.
    ///
    /// # Arguments
    ///
    /// * `seeds` - Seed URLs in order; blanks and repeats are ignored
    /// * `shutdown` - Resolves when the run should stop early
    ///
    /// # Returns
    ///
    /// A [`CrawlReport`] covering every task that reached the store.
    pub async fn run_until<F>(&self, seeds: &[String], shutdown: F) -> CrawlReport
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let plan = self.plan(seeds);
        let max_concurrent = self.config.crawler.max_concurrent as usize;

        tracing::info!(
            seeds = plan.seeds_total,
            tasks = plan.tasks.len(),
            duplicates = plan.duplicate_seeds,
            already_recorded = plan.already_recorded,
            max_concurrent,
            "Starting crawl"
        );

        let worker_count = max_concurrent.max(1).min(plan.tasks.len());
        let scheduler = Arc::new(Scheduler::new(plan.tasks, max_concurrent));
        let results = Arc::new(Mutex::new(Vec::new()));
        let (stop_tx, stop_rx) = watch::channel(false);

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let worker = Worker {
                id,
                pipeline: self.pipeline.clone(),
                scheduler: Arc::clone(&scheduler),
                gauge: scheduler.gauge(),
                results: Arc::clone(&results),
                stop: stop_rx.clone(),
            };
            workers.spawn(worker.run());
        }

        let interrupted = self.supervise(&mut workers, shutdown, stop_tx).await;

        let tasks = std::mem::take(
            &mut *results
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );

        let report = CrawlReport {
            tasks,
            seeds_total: plan.seeds_total,
            blank_seeds: plan.blank_seeds,
            duplicate_seeds: plan.duplicate_seeds,
            already_recorded: plan.already_recorded,
            not_started: scheduler.pending(),
            peak_active: scheduler.gauge().peak(),
            robots_fetches: self.pipeline.robots.fetch_count(),
            interrupted,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            recorded = report.tasks.len(),
            successes = report.successes(),
            failures = report.failures(),
            skipped = report.skipped(),
            store_failures = report.store_failures(),
            interrupted = report.interrupted,
            "Crawl completed in {:?}",
            report.elapsed
        );

        report
    }

    /// Deduplicates seeds and drops those already recorded
    fn plan(&self, seeds: &[String]) -> Plan {
        let mut plan = Plan {
            seeds_total: seeds.len(),
            ..Plan::default()
        };
        let mut seen = HashSet::new();

        for seed in seeds {
            let key = single_line(seed);
            if key.is_empty() {
                plan.blank_seeds += 1;
                continue;
            }
            if !seen.insert(key.clone()) {
                plan.duplicate_seeds += 1;
                continue;
            }
            if self.pipeline.store.contains(&key) {
                tracing::debug!(url = %sanitize_for_log(&key), "Already recorded, skipping");
                plan.already_recorded += 1;
                continue;
            }
            plan.tasks.push(CrawlTask::new(key));
        }

        plan
    }

    /// Waits for the workers, handling an interrupt if one arrives
    ///
    /// Returns true if the run was interrupted.
    async fn supervise<F>(
        &self,
        workers: &mut JoinSet<()>,
        shutdown: F,
        stop: watch::Sender<bool>,
    ) -> bool
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(result) => log_worker_exit(result),
                    None => return false,
                },
                _ = &mut shutdown => break,
            }
        }

        let grace = self.config.crawler.shutdown_grace();
        tracing::warn!(
            in_flight = workers.len(),
            "Interrupt received; no new tasks will start, waiting up to {:?}",
            grace
        );
        // Receivers outlive this call, so the send cannot fail
        let _ = stop.send(true);

        let deadline = tokio::time::sleep(grace);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(result) => log_worker_exit(result),
                    None => return true,
                },
                _ = &mut deadline => {
                    tracing::warn!(
                        abandoned = workers.len(),
                        "Grace period elapsed; abandoning in-flight tasks"
                    );
                    workers.abort_all();
                    while let Some(result) = workers.join_next().await {
                        log_worker_exit(result);
                    }
                    return true;
                }
            }
        }
    }
}

fn log_worker_exit(result: Result<(), JoinError>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_cancelled() => tracing::debug!("Worker aborted"),
        Err(e) => tracing::error!(error = %e, "Worker panicked"),
    }
}

/// One worker: pulls tasks until the queue is empty or a stop is requested
struct Worker {
    id: usize,
    pipeline: Pipeline,
    scheduler: Arc<Scheduler>,
    gauge: Arc<ActiveGauge>,
    results: Arc<Mutex<Vec<TaskSummary>>>,
    stop: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            if *self.stop.borrow() {
                break;
            }

            let admitted = tokio::select! {
                biased;
                _ = self.stop.changed() => break,
                next = self.scheduler.next_task() => match next {
                    Some(admitted) => admitted,
                    None => break,
                },
            };

            let (task, _permit) = admitted.into_parts();
            let span = tracing::info_span!(
                "task",
                worker = self.id,
                url = %sanitize_for_log(&task.url)
            );

            match self.pipeline.process(task, &self.gauge).instrument(span).await {
                Ok(summary) => self
                    .results
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(summary),
                Err(e) => tracing::error!(worker = self.id, error = %e, "Task aborted"),
            }
        }
        tracing::debug!(worker = self.id, "Worker finished");
    }
}

impl Pipeline {
    /// Runs one task to its recorded state
    async fn process(
        &self,
        mut task: CrawlTask,
        gauge: &Arc<ActiveGauge>,
    ) -> Result<TaskSummary, SieveError> {
        task.advance(TaskState::Admitted)?;

        let record = {
            let _active = gauge.enter();
            self.evaluate(&mut task).await?
        };

        let stored = self.persist(&record).await;
        task.advance(TaskState::Recorded(record.outcome))?;

        tracing::info!(
            outcome = %record.outcome,
            status = ?record.status_code,
            suspicious = ?record.suspicious,
            attempts = task.attempt_count,
            "Recorded"
        );

        Ok(TaskSummary::new(&task, &record, stored))
    }

    /// Validation, robots check, fetch and analysis; ends in `Recording`
    async fn evaluate(&self, task: &mut CrawlTask) -> Result<CrawlRecord, SieveError> {
        task.advance(TaskState::Validating)?;
        let url = match validate_url(&task.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::info!(reason = %e, "Skipping invalid URL");
                task.advance(TaskState::Recording)?;
                return Ok(CrawlRecord::skipped(&task.url, SkipReason::InvalidUrl));
            }
        };

        task.advance(TaskState::RobotsCheck)?;
        if !self.robots.check(&url).await.is_allowed() {
            task.advance(TaskState::Recording)?;
            return Ok(CrawlRecord::skipped(&task.url, SkipReason::Disallowed));
        }

        task.advance(TaskState::Fetching)?;
        let fetch = self.fetcher.fetch(&url).await;
        task.attempt_count = fetch.attempts;
        if !fetch.is_success() {
            task.advance(TaskState::Recording)?;
            return Ok(CrawlRecord::failed(&task.url, &fetch));
        }

        task.advance(TaskState::Analyzing)?;
        let fetch = Arc::new(fetch);
        let analysis = self.analyze(Arc::clone(&fetch)).await;
        if !analysis.signals.is_empty() {
            tracing::debug!(
                score = analysis.score,
                signals = ?analysis.signals,
                "Heuristic signals fired"
            );
        }

        task.advance(TaskState::Recording)?;
        Ok(CrawlRecord::succeeded(&task.url, &fetch, &analysis))
    }

    /// Runs HTML analysis off the async workers
    async fn analyze(&self, fetch: Arc<FetchOutcome>) -> AnalysisResult {
        let analyzer = Arc::clone(&self.analyzer);
        match tokio::task::spawn_blocking(move || analyzer.analyze(&fetch)).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, "Analysis failed, flagging as suspicious");
                AnalysisResult::degraded()
            }
        }
    }

    /// Appends the record, retrying transient store errors
    async fn persist(&self, record: &CrawlRecord) -> StoreStatus {
        let mut attempt = 1;
        loop {
            let store = Arc::clone(&self.store);
            let row = record.clone();
            let result = tokio::task::spawn_blocking(move || store.append(&row))
                .await
                .unwrap_or_else(|e| Err(StoreError::Join(e.to_string())));

            match result {
                Ok(AppendOutcome::Appended) => return StoreStatus::Appended,
                Ok(AppendOutcome::Duplicate) => {
                    tracing::debug!("Record already present, nothing written");
                    return StoreStatus::Duplicate;
                }
                Err(e) if attempt < STORE_ATTEMPTS => {
                    tracing::warn!(attempt, error = %e, "Store write failed, retrying");
                    tokio::time::sleep(STORE_RETRY_DELAY * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(attempts = attempt, error = %e, "Store write failed, record lost");
                    return StoreStatus::Failed;
                }
            }
        }
    }
}

/// Runs a complete crawl against the configured CSV file
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open (or create) the results file and index its URLs
/// 2. Build the HTTP client
/// 3. Crawl the configured seeds until done or until `shutdown` resolves
///
/// # Arguments
///
/// * `config` - Validated configuration, seeds included
/// * `shutdown` - Resolves on interrupt
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run finished (possibly interrupted)
/// * `Err(SieveError)` - The store or HTTP client could not be set up
///
/// # Example
///
/// ```no_run
/// use sumi_sieve::config::load_config;
/// use sumi_sieve::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sieve.toml"))?;
/// let report = run_crawl(config, async {
///     let _ = tokio::signal::ctrl_c().await;
/// })
/// .await?;
/// println!("{} pages fetched", report.successes());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<F>(config: Config, shutdown: F) -> Result<CrawlReport, SieveError>
where
    F: Future<Output = ()>,
{
    let store: Arc<dyn ResultStore> = Arc::new(open_store(Path::new(&config.output.csv_path))?);
    let seeds = config.seeds.clone();
    let coordinator = Coordinator::new(config, store)?;
    Ok(coordinator.run_until(&seeds, shutdown).await)
}
