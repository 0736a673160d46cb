//! Scheduler for the seed queue and concurrency limiting
//!
//! This module handles:
//! - The FIFO queue of pending tasks, drained by workers
//! - Global admission via a semaphore (`max-concurrent` permits)
//! - An active-task gauge with a high-water mark, for observing the limit

use crate::state::CrawlTask;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counts tasks currently between validation and analysis
#[derive(Debug, Default)]
pub struct ActiveGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ActiveGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one task active until the returned guard is dropped
    pub fn enter(self: &Arc<Self>) -> ActiveGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        ActiveGuard {
            gauge: Arc::clone(self),
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously active tasks seen
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Decrements the gauge on drop, including when a task is aborted
#[derive(Debug)]
pub struct ActiveGuard {
    gauge: Arc<ActiveGauge>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.gauge.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A task paired with its admission permit
pub struct Admitted {
    pub task: CrawlTask,
    _permit: OwnedSemaphorePermit,
}

impl Admitted {
    /// Splits off the task; the slot is released when the permit drops
    pub fn into_parts(self) -> (CrawlTask, OwnedSemaphorePermit) {
        (self.task, self._permit)
    }
}

/// Scheduler shared by all workers
///
/// The scheduler coordinates:
/// - Seed order (first come, first served)
/// - The global concurrency limit
pub struct Scheduler {
    /// Global semaphore for limiting concurrent tasks
    permits: Arc<Semaphore>,

    /// Tasks not yet picked up
    queue: Mutex<VecDeque<CrawlTask>>,

    gauge: Arc<ActiveGauge>,

    max_concurrent: usize,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `tasks` - Pending tasks, in seed order
    /// * `max_concurrent` - Number of admission permits (at least 1)
    pub fn new(tasks: Vec<CrawlTask>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            queue: Mutex::new(tasks.into()),
            gauge: Arc::new(ActiveGauge::new()),
            max_concurrent,
        }
    }

    /// Takes the next pending task and waits for an admission permit
    ///
    /// # Returns
    ///
    /// * `Some(Admitted)` - A task allowed to start
    /// * `None` - The queue is empty
    pub async fn next_task(&self) -> Option<Admitted> {
        if self.pending() == 0 {
            return None;
        }
        // Permit first: a cancelled wait must not lose a dequeued task
        let permit = self.permits.clone().acquire_owned().await.ok()?;
        let task = self.lock_queue().pop_front()?;
        Some(Admitted {
            task,
            _permit: permit,
        })
    }

    /// Tasks still waiting in the queue
    pub fn pending(&self) -> usize {
        self.lock_queue().len()
    }

    pub fn gauge(&self) -> Arc<ActiveGauge> {
        Arc::clone(&self.gauge)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Permits not currently held
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<CrawlTask>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
