//! Storage module for persisting crawl results
//!
//! This module handles:
//! - The `CrawlRecord` written once per URL
//! - The `ResultStore` interface (atomic, URL-deduplicated appends)
//! - The CSV-backed store, including torn-row recovery on open

mod csv_store;
mod record;
mod traits;

pub use csv_store::CsvStore;
pub use record::{CrawlRecord, CSV_HEADER};
pub use traits::{AppendOutcome, ResultStore, StoreError, StoreResult};

pub(crate) use record::single_line;

use std::path::Path;

/// Opens the CSV store at `path`
///
/// # Arguments
///
/// * `path` - Path to the results file
///
/// # Returns
///
/// * `Ok(CsvStore)` - Store ready for appends
/// * `Err(StoreError)` - The file could not be opened or has a foreign header
pub fn open_store(path: &Path) -> StoreResult<CsvStore> {
    CsvStore::open(path)
}
