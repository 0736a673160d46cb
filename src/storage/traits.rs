//! Storage traits and error types
//!
//! This module defines the trait interface for result stores and
//! associated error types.

use crate::storage::CrawlRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unexpected CSV header in {path}: expected [{expected}], found [{found}]")]
    HeaderMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Store task failed: {0}")]
    Join(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// What an append did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A new row was written
    Appended,
    /// A row for this URL already existed; nothing was written
    Duplicate,
}

/// Append-only, URL-deduplicated record store
///
/// Implementations must make `append` atomic per record: a concurrent
/// reader or a crash never observes half a row, and two appends for the
/// same URL never both write.
pub trait ResultStore: Send + Sync {
    /// Appends a record unless one with the same URL already exists
    ///
    /// # Arguments
    ///
    /// * `record` - The record to persist
    ///
    /// # Returns
    ///
    /// * `Ok(AppendOutcome::Appended)` - The row is durably written
    /// * `Ok(AppendOutcome::Duplicate)` - The URL was already present
    /// * `Err(StoreError)` - Nothing was written
    fn append(&self, record: &CrawlRecord) -> StoreResult<AppendOutcome>;

    /// Checks whether a record exists for the URL
    fn contains(&self, url: &str) -> bool;

    /// Number of distinct URLs in the store
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
