use crate::analysis::Signal;
use crate::config::types::{AnalysisConfig, Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Seeds are deliberately not validated here: an invalid seed is a per-URL
/// skip recorded in the output, not a reason to refuse to start.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_analysis_config(&config.analysis)?;
    Ok(())
}

/// Ensures there is at least one non-blank seed to crawl
pub fn require_seeds(config: &Config) -> Result<(), ConfigError> {
    if config.seeds.iter().all(|s| s.trim().is_empty()) {
        return Err(ConfigError::NoSeeds);
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.robots_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "robots-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.backoff_base_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "backoff-base-ms must be <= 60000, got {}",
            config.backoff_base_ms
        )));
    }

    if !(0.0..=1.0).contains(&config.jitter_factor) {
        return Err(ConfigError::Validation(format!(
            "jitter-factor must be between 0.0 and 1.0, got {}",
            config.jitter_factor
        )));
    }

    if config.max_page_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max-page-bytes must be >= 1024, got {}",
            config.max_page_bytes
        )));
    }

    if let Some(proxy) = &config.proxy {
        validate_proxy(proxy)?;
    }

    Ok(())
}

/// Validates a proxy URL: absolute, http(s), with a host
fn validate_proxy(proxy: &str) -> Result<(), ConfigError> {
    let url = Url::parse(proxy)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Proxy '{}' must use http or https, got '{}'",
            proxy,
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "Proxy '{}' is missing a host",
            proxy
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the analysis policy
fn validate_analysis_config(config: &AnalysisConfig) -> Result<(), ConfigError> {
    for name in &config.rules {
        if Signal::from_name(name).is_none() {
            return Err(ConfigError::Validation(format!(
                "Unknown analysis rule '{}' (known: {})",
                name,
                Signal::all()
                    .iter()
                    .map(|s| s.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
    }

    if !(config.threshold > 0.0) {
        return Err(ConfigError::Validation(format!(
            "analysis threshold must be > 0, got {}",
            config.threshold
        )));
    }

    if !(config.length_mismatch_tolerance >= 0.0) {
        return Err(ConfigError::Validation(format!(
            "length-mismatch-tolerance must be >= 0, got {}",
            config.length_mismatch_tolerance
        )));
    }

    if !(config.keyword_density_per_mille > 0.0) {
        return Err(ConfigError::Validation(format!(
            "keyword-density-per-mille must be > 0, got {}",
            config.keyword_density_per_mille
        )));
    }

    if config.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "analysis keywords cannot be blank".to_string(),
        ));
    }

    Ok(())
}
