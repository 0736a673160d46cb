//! CSV result store
//!
//! Rows are appended to a single file with a fixed header. The store keeps
//! an in-memory index of recorded URLs, loaded from the file on open, so
//! reruns skip URLs that already have a row.
//!
//! # Durability
//!
//! Each row is encoded in full before anything touches the file, then
//! written with a single `write_all` and synced. A failed write is rolled
//! back by truncating to the previous length. A row torn by a crash (no
//! trailing newline) is cut off the next time the file is opened.

use crate::storage::record::CSV_HEADER;
use crate::storage::traits::{AppendOutcome, ResultStore, StoreError, StoreResult};
use crate::storage::CrawlRecord;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct Inner {
    file: File,
    /// Length of the file up to the last complete row
    len: u64,
    index: HashSet<String>,
}

/// Append-only CSV file keyed by URL
pub struct CsvStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl CsvStore {
    /// Opens or creates the results file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file; missing parent directories are created
    ///
    /// # Returns
    ///
    /// * `Ok(CsvStore)` - Ready for appends, with existing URLs indexed
    /// * `Err(StoreError)` - The file is unwritable or has a foreign header
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let contents = std::fs::read(path)?;
        let complete = complete_prefix_len(&contents);

        let index = if complete == 0 {
            let header = encode_header()?;
            // Without a single complete line the bytes must be a torn header
            if !header.starts_with(&contents) {
                return Err(header_mismatch(path, &String::from_utf8_lossy(&contents)));
            }
            if !contents.is_empty() {
                tracing::warn!(path = %path.display(), "Rewriting incomplete header");
                file.set_len(0)?;
            }
            file.write_all(&header)?;
            file.sync_data()?;
            HashSet::new()
        } else {
            // Header is checked before anything is cut off
            let index = load_index(path, &contents[..complete])?;
            if complete < contents.len() {
                tracing::warn!(
                    path = %path.display(),
                    dropped_bytes = contents.len() - complete,
                    "Dropping incomplete trailing row"
                );
                file.set_len(complete as u64)?;
            }
            index
        };

        let len = file.metadata()?.len();
        tracing::debug!(path = %path.display(), existing = index.len(), "Opened CSV store");

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner { file, len, index }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultStore for CsvStore {
    fn append(&self, record: &CrawlRecord) -> StoreResult<AppendOutcome> {
        let row = encode_row(record)?;
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;

        if inner.index.contains(&record.url) {
            return Ok(AppendOutcome::Duplicate);
        }

        if let Err(e) = write_row(&mut inner.file, &row) {
            let len = inner.len;
            if let Err(rollback) = inner.file.set_len(len) {
                tracing::error!(error = %rollback, "Failed to roll back partial CSV row");
            }
            return Err(e.into());
        }

        inner.len += row.len() as u64;
        inner.index.insert(record.url.clone());
        Ok(AppendOutcome::Appended)
    }

    fn contains(&self, url: &str) -> bool {
        match self.inner.lock() {
            Ok(inner) => inner.index.contains(url),
            Err(poisoned) => poisoned.into_inner().index.contains(url),
        }
    }

    fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(inner) => inner.index.len(),
            Err(poisoned) => poisoned.into_inner().index.len(),
        }
    }
}

fn write_row(file: &mut File, row: &[u8]) -> std::io::Result<()> {
    file.write_all(row)?;
    file.flush()?;
    file.sync_data()
}

/// Length of `contents` up to and including its last newline
fn complete_prefix_len(contents: &[u8]) -> usize {
    contents
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1)
}

fn encode_header() -> StoreResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    writer
        .into_inner()
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn encode_row(record: &CrawlRecord) -> StoreResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.serialize(record.to_row())?;
    writer
        .into_inner()
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn header_mismatch(path: &Path, found: &str) -> StoreError {
    StoreError::HeaderMismatch {
        path: path.display().to_string(),
        expected: CSV_HEADER.join(","),
        found: found.chars().take(200).collect(),
    }
}

/// Reads the URL column of an existing file
fn load_index(path: &Path, contents: &[u8]) -> StoreResult<HashSet<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(contents);

    let headers = reader.headers()?.clone();
    if headers.iter().ne(CSV_HEADER.iter().copied()) {
        return Err(header_mismatch(
            path,
            &headers.iter().collect::<Vec<_>>().join(","),
        ));
    }

    let mut index = HashSet::new();
    for (line, row) in reader.records().enumerate() {
        match row {
            Ok(row) => {
                if let Some(url) = row.get(0) {
                    index.insert(url.to_string());
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), row = line + 1, error = %e, "Skipping unreadable row");
            }
        }
    }
    Ok(index)
}
