use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sumi-Sieve
///
/// Every section is optional in the TOML file; missing keys take the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Ordered seed URLs
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of tasks between validation and analysis at once
    #[serde(rename = "max-concurrent", default = "default_max_concurrent")]
    pub max_concurrent: u32,

    /// Total fetch attempts per URL, first try included
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Connect/read timeout for page fetches (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for robots.txt fetches (seconds); capped at half the page timeout
    #[serde(rename = "robots-timeout-secs", default = "default_robots_timeout")]
    pub robots_timeout_secs: u64,

    /// Delay before the second attempt (milliseconds); doubles per attempt
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Fraction of each backoff delay used as random jitter (0.0 - 1.0)
    #[serde(rename = "jitter-factor", default = "default_jitter_factor")]
    pub jitter_factor: f64,

    /// Bodies larger than this are abandoned
    #[serde(rename = "max-page-bytes", default = "default_max_page_bytes")]
    pub max_page_bytes: u64,

    /// How long in-flight tasks may keep running after an interrupt (seconds)
    #[serde(rename = "shutdown-grace-secs", default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// Optional outbound HTTP(S) proxy
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout(),
            robots_timeout_secs: default_robots_timeout(),
            backoff_base_ms: default_backoff_base_ms(),
            jitter_factor: default_jitter_factor(),
            max_page_bytes: default_max_page_bytes(),
            shutdown_grace_secs: default_shutdown_grace(),
            proxy: None,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Effective robots.txt timeout, always shorter than the page timeout
    pub fn robots_timeout(&self) -> Duration {
        Duration::from_secs(self.robots_timeout_secs).min(self.request_timeout() / 2)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the token matched against robots.txt groups
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
        }
    }
}

impl UserAgentConfig {
    /// Full `User-Agent` header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }

    /// Product token used for robots.txt group matching
    pub fn robots_token(&self) -> &str {
        &self.crawler_name
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV results file
    #[serde(rename = "csv-path", default = "default_csv_path")]
    pub csv_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

/// Heuristic analysis policy
///
/// Which signals run and how they are weighed is policy, not fixed
/// behavior; see `analysis::Signal` for the available names.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Enabled signal names, in evaluation order
    #[serde(default = "default_rules")]
    pub rules: Vec<String>,

    /// Minimum summed weight for a page to be flagged
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Bodies at least this large count as "non-trivial"
    #[serde(rename = "min-body-bytes", default = "default_min_body_bytes")]
    pub min_body_bytes: usize,

    /// Allowed relative gap between declared and read length
    #[serde(
        rename = "length-mismatch-tolerance",
        default = "default_length_tolerance"
    )]
    pub length_mismatch_tolerance: f64,

    /// Blocklisted keywords (matched case-insensitively)
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Keyword hits per thousand words that trip the density signal
    #[serde(
        rename = "keyword-density-per-mille",
        default = "default_keyword_density"
    )]
    pub keyword_density_per_mille: f64,

    /// Fewer `div.content` blocks than this counts as sparse structure
    #[serde(rename = "min-content-blocks", default = "default_min_content_blocks")]
    pub min_content_blocks: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            threshold: default_threshold(),
            min_body_bytes: default_min_body_bytes(),
            length_mismatch_tolerance: default_length_tolerance(),
            keywords: default_keywords(),
            keyword_density_per_mille: default_keyword_density(),
            min_content_blocks: default_min_content_blocks(),
        }
    }
}

/// Values that override the file configuration, from env vars or flags
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub seeds: Vec<String>,
    pub csv_path: Option<String>,
    pub max_concurrent: Option<u32>,
    pub max_attempts: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub proxy: Option<String>,
}

impl Config {
    /// Applies overrides on top of this configuration
    ///
    /// Seeds given as overrides replace the file's seed list rather than
    /// extending it.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if !overrides.seeds.is_empty() {
            self.seeds = overrides.seeds;
        }
        if let Some(path) = overrides.csv_path {
            self.output.csv_path = path;
        }
        if let Some(n) = overrides.max_concurrent {
            self.crawler.max_concurrent = n;
        }
        if let Some(n) = overrides.max_attempts {
            self.crawler.max_attempts = n;
        }
        if let Some(secs) = overrides.request_timeout_secs {
            self.crawler.request_timeout_secs = secs;
        }
        if let Some(proxy) = overrides.proxy.filter(|p| !p.trim().is_empty()) {
            self.crawler.proxy = Some(proxy);
        }
    }
}

fn default_max_concurrent() -> u32 {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_request_timeout() -> u64 {
    10
}

fn default_robots_timeout() -> u64 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_jitter_factor() -> f64 {
    0.1
}

fn default_max_page_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_shutdown_grace() -> u64 {
    5
}

fn default_crawler_name() -> String {
    "SumiSieve".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact_url() -> String {
    "https://example.com/sumi-sieve".to_string()
}

fn default_csv_path() -> String {
    "crawled_urls.csv".to_string()
}

fn default_rules() -> Vec<String> {
    vec![
        "length-mismatch".to_string(),
        "untitled-body".to_string(),
        "keyword-density".to_string(),
    ]
}

fn default_threshold() -> f64 {
    1.0
}

fn default_min_body_bytes() -> usize {
    512
}

fn default_length_tolerance() -> f64 {
    0.1
}

fn default_keywords() -> Vec<String> {
    [
        "verify your account",
        "account suspended",
        "confirm your password",
        "urgent action required",
        "wire transfer",
        "gift card",
        "crypto giveaway",
        "free money",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_keyword_density() -> f64 {
    10.0
}

fn default_min_content_blocks() -> usize {
    5
}
