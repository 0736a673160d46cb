//! State module for tracking task progress
//!
//! # Components
//!
//! - `TaskState`: the per-URL pipeline state machine
//! - `RecordOutcome`: how a task ended (success, failure, skip)
//! - `CrawlTask`: the unit of work owned by the coordinator

mod task_state;

// Re-export main types
pub use task_state::{CrawlTask, RecordOutcome, SkipReason, TaskState};
