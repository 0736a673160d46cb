//! Configuration module for Sumi-Sieve
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and layering environment/CLI overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use sumi_sieve::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sieve.toml")).unwrap();
//! println!("Writing results to {}", config.output.csv_path);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnalysisConfig, Config, ConfigOverrides, CrawlerConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{require_seeds, validate};
