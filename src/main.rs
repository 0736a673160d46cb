//! Sumi-Sieve main entry point
//!
//! This is the command-line interface for the Sumi-Sieve page sieve.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use sumi_sieve::config::{
    load_config_with_hash, require_seeds, validate, Config, ConfigOverrides,
};
use sumi_sieve::crawler::run_crawl;
use sumi_sieve::output::print_statistics;
use sumi_sieve::sanitize_for_log;
use tracing_subscriber::EnvFilter;

/// Sumi-Sieve: A polite concurrent page sieve
///
/// Sumi-Sieve fetches a fixed list of seed URLs while respecting
/// robots.txt, flags suspicious pages with a heuristic rule table, and
/// appends one CSV row per URL to a deduplicated results file.
#[derive(Parser, Debug)]
#[command(name = "sumi-sieve")]
#[command(version)]
#[command(about = "A polite concurrent page sieve", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL to crawl; repeat or comma-separate for several
    #[arg(long = "url", env = "START_URLS", value_delimiter = ',')]
    urls: Vec<String>,

    /// File with one seed URL per line
    #[arg(long, value_name = "FILE")]
    urls_file: Option<PathBuf>,

    /// Path of the CSV results file
    #[arg(short, long, env = "OUTPUT_FILE")]
    output: Option<String>,

    /// Maximum number of tasks in flight
    #[arg(long, env = "MAX_CONCURRENT")]
    max_concurrent: Option<u32>,

    /// Fetch attempts per URL
    #[arg(long, env = "MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// Outbound HTTP(S) proxy
    #[arg(long, env = "PROXY_URL")]
    proxy: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.log_format);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    if cli.dry_run {
        print_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, takes precedence over the flags.
fn setup_logging(verbose: u8, quiet: bool, format: LogFormat) {
    let default_filter = if quiet {
        // Only show errors
        "error"
    } else {
        match verbose {
            0 => "sumi_sieve=info,warn",
            1 => "sumi_sieve=debug,info",
            2 => "sumi_sieve=trace,debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().with_current_span(true).init(),
    }
}

/// Loads the file (if any), layers env/CLI overrides, and validates the result
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("loading {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let mut seeds = cli.urls.clone();
    if let Some(path) = &cli.urls_file {
        seeds.extend(read_urls_file(path)?);
    }

    config.apply_overrides(ConfigOverrides {
        seeds,
        csv_path: cli.output.clone(),
        max_concurrent: cli.max_concurrent,
        max_attempts: cli.max_attempts,
        request_timeout_secs: cli.request_timeout,
        proxy: cli.proxy.clone(),
    });

    validate(&config)?;
    require_seeds(&config)?;
    Ok(config)
}

/// Reads one seed per line, skipping blanks and `#` comments
fn read_urls_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Handles the --dry-run mode: shows the effective configuration and seeds
fn print_dry_run(config: &Config) {
    println!("=== Sumi-Sieve Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max concurrent: {}", config.crawler.max_concurrent);
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  robots.txt timeout: {:?}", config.crawler.robots_timeout());
    println!(
        "  Backoff: {}ms base, {:.0}% jitter",
        config.crawler.backoff_base_ms,
        config.crawler.jitter_factor * 100.0
    );
    println!("  Max page size: {} bytes", config.crawler.max_page_bytes);
    println!("  Shutdown grace: {}s", config.crawler.shutdown_grace_secs);
    if let Some(proxy) = &config.crawler.proxy {
        println!("  Proxy: {}", sanitize_for_log(proxy));
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);

    println!("\nAnalysis:");
    println!("  Rules: {}", config.analysis.rules.join(", "));
    println!("  Threshold: {}", config.analysis.threshold);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", sanitize_for_log(seed));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        seeds = config.seeds.len(),
        output = %config.output.csv_path,
        "Starting crawl"
    );

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::warn!("Received ctrl-c, shutting down"),
            Err(e) => {
                tracing::error!("Cannot listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    match run_crawl(config, shutdown).await {
        Ok(report) => {
            print_statistics(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
