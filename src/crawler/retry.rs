//! Retry policy and per-URL attempt state machine
//!
//! Backoff math is pure so it can be tested without a clock: the delay
//! before attempt `n + 1` is `base * 2^(n - 1)`, widened or narrowed by up
//! to `jitter_factor` of itself.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchErrorKind, FetchOutcome};
use crate::crawler::transport::{RawResponse, TransportError};
use std::time::Duration;

/// Upper bound on any single backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Retry settings for page fetches
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per URL, first try included
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Jitter as a fraction of the delay (0.0 - 1.0)
    pub jitter_factor: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.backoff_base(),
            jitter_factor: config.jitter_factor,
        }
    }

    /// Delay after `failed_attempt` failed, before jitter
    pub fn base_backoff(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(MAX_BACKOFF)
    }

    /// Delay with jitter applied from a sample in `[-1.0, 1.0]`
    pub fn backoff_with_sample(&self, failed_attempt: u32, sample: f64) -> Duration {
        let base_ms = self.base_backoff(failed_attempt).as_millis() as f64;
        let jitter_ms = base_ms * self.jitter_factor * sample.clamp(-1.0, 1.0);
        Duration::from_millis((base_ms + jitter_ms).max(0.0).round() as u64)
    }

    /// Delay with random jitter
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let sample = if self.jitter_factor > 0.0 {
            rand::random_range(-1.0..=1.0)
        } else {
            0.0
        };
        self.backoff_with_sample(failed_attempt, sample)
    }
}

/// How one attempt's result is to be treated
#[derive(Debug)]
pub(crate) enum Classified {
    /// 2xx with a complete body
    Success(RawResponse),
    /// Worth trying again if attempts remain
    Retryable(FetchOutcome, String),
    /// Final regardless of remaining attempts
    Terminal(FetchOutcome),
}

/// Sorts a transport result into success, retryable or terminal
pub(crate) fn classify(result: Result<RawResponse, TransportError>) -> Classified {
    match result {
        Ok(response) if response.truncated => Classified::Terminal(FetchOutcome {
            declared_length: response.declared_length,
            ..FetchOutcome::failed(FetchErrorKind::TooLarge, Some(response.status))
        }),
        Ok(response) if (200..300).contains(&response.status) => Classified::Success(response),
        Ok(response) => {
            let outcome = FetchOutcome {
                content_length: Some(response.body.len() as u64),
                declared_length: response.declared_length,
                ..FetchOutcome::failed(FetchErrorKind::HttpError, Some(response.status))
            };
            if (500..600).contains(&response.status) {
                Classified::Retryable(outcome, format!("HTTP {}", response.status))
            } else {
                Classified::Terminal(outcome)
            }
        }
        Err(err) => {
            let outcome = FetchOutcome::failed(FetchErrorKind::from(&err), None);
            if err.is_retryable() {
                Classified::Retryable(outcome, err.to_string())
            } else {
                Classified::Terminal(outcome)
            }
        }
    }
}

/// What the fetcher should do next
#[derive(Debug)]
pub enum Step {
    /// Stop; this is the URL's outcome
    Done(FetchOutcome),
    /// Sleep for `delay`, then make another attempt
    RetryAfter { delay: Duration, reason: String },
}

/// Attempt counter for one URL
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Starts the next attempt and returns its 1-based number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Consumes the result of the current attempt
    pub fn on_result(&mut self, result: Result<RawResponse, TransportError>) -> Step {
        let attempts = self.attempt;
        match classify(result) {
            Classified::Success(response) => Step::Done(FetchOutcome {
                status_code: Some(response.status),
                content_length: Some(response.body.len() as u64),
                declared_length: response.declared_length,
                body: Some(response.body),
                error_kind: None,
                attempts,
            }),
            Classified::Retryable(_, reason) if attempts < self.policy.max_attempts => {
                Step::RetryAfter {
                    delay: self.policy.backoff(attempts),
                    reason,
                }
            }
            Classified::Retryable(outcome, _) | Classified::Terminal(outcome) => {
                Step::Done(FetchOutcome { attempts, ..outcome })
            }
        }
    }
}
