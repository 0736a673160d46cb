//! Reading configuration files and fingerprinting them

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads, parses and validates the TOML file at `path`
///
/// Seeds are not required here; they may still arrive from the
/// environment or the command line.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_sieve::config::load_config;
///
/// let config = load_config(Path::new("sieve.toml")).unwrap();
/// println!("Max concurrent: {}", config.crawler.max_concurrent);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_hash(path).map(|(config, _)| config)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex SHA-256 of the file at `path`
///
/// Logged at start-up so a CSV file can be traced back to the settings
/// that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(fingerprint(&std::fs::read(path)?))
}

/// Like [`load_config`], also returning the fingerprint of the bytes parsed
///
/// The file is read once, so the hash always matches the settings in use.
///
/// # Returns
///
/// * `Ok((Config, String))` - Validated configuration and its hex SHA-256
/// * `Err(ConfigError)` - Unreadable file, not UTF-8, bad TOML, or invalid values
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let bytes = std::fs::read(path)?;
    let hash = fingerprint(&bytes);
    let content = String::from_utf8(bytes).map_err(|e| {
        ConfigError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    Ok((parse_config(&content)?, hash))
}

fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
