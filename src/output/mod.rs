//! Output module for the end-of-run summary
//!
//! This module handles:
//! - Rendering crawl statistics from the coordinator's report
//! - Printing them to stdout once the run ends

pub mod stats;

pub use stats::{format_statistics, print_statistics};
