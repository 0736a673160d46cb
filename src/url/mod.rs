//! URL handling module for Sumi-Sieve
//!
//! This module provides the syntactic URL gate that runs before any network
//! activity, plus helpers for deriving robots.txt locations and for keeping
//! secrets out of log lines.

mod domain;
mod sanitize;
mod validate;

// Re-export main functions
pub use domain::{host_key, robots_url};
pub use sanitize::sanitize_for_log;
pub(crate) use sanitize::sanitize_parsed;
pub use validate::{validate_url, ALLOWED_SCHEMES};
