//! Page fetcher
//!
//! This module turns a validated, robots-approved URL into a single
//! [`FetchOutcome`]:
//! - One transport call per attempt, bounded by the request timeout
//! - Retries with exponential backoff for transient failures
//! - Error classification (timeout, connection, HTTP status, oversized body)
//!
//! Whatever happens, the caller gets exactly one outcome per URL.

use crate::config::Config;
use crate::crawler::retry::{RetryPolicy, RetryState, Step};
use crate::crawler::transport::{Transport, TransportError};
use crate::url::sanitize_parsed;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Why a fetch ultimately failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// Every attempt ran out of time
    Timeout,
    /// The connection could not be established or broke mid-transfer
    ConnectionError,
    /// The server answered with a non-success status
    HttpError,
    /// The body exceeded the configured size cap
    TooLarge,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Timeout => "timeout",
            FetchErrorKind::ConnectionError => "connection_error",
            FetchErrorKind::HttpError => "http_error",
            FetchErrorKind::TooLarge => "too_large",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&TransportError> for FetchErrorKind {
    fn from(err: &TransportError) -> Self {
        match err {
            TransportError::Timeout(_) => FetchErrorKind::Timeout,
            TransportError::Connection(_) | TransportError::Request(_) => {
                FetchErrorKind::ConnectionError
            }
        }
    }
}

/// Final result of fetching one URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    /// Status of the last response, if any response arrived
    pub status_code: Option<u16>,

    /// Number of body bytes actually read
    pub content_length: Option<u64>,

    /// `Content-Length` the server declared
    pub declared_length: Option<u64>,

    /// Body bytes, present only on success
    pub body: Option<Vec<u8>>,

    /// Set when the fetch failed
    pub error_kind: Option<FetchErrorKind>,

    /// Attempts made, first try included
    pub attempts: u32,
}

impl FetchOutcome {
    /// True when a 2xx body was read in full
    pub fn is_success(&self) -> bool {
        self.error_kind.is_none()
    }

    pub(crate) fn failed(kind: FetchErrorKind, status_code: Option<u16>) -> Self {
        Self {
            status_code,
            error_kind: Some(kind),
            ..Self::default()
        }
    }
}

/// Fetches pages through a [`Transport`] with retries
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    timeout: Duration,
    max_page_bytes: u64,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        policy: RetryPolicy,
        timeout: Duration,
        max_page_bytes: u64,
    ) -> Self {
        Self {
            transport,
            policy,
            timeout,
            max_page_bytes,
        }
    }

    /// Builds a fetcher from the crawler section of `config`
    pub fn from_config(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self::new(
            transport,
            RetryPolicy::from_config(&config.crawler),
            config.crawler.request_timeout(),
            config.crawler.max_page_bytes,
        )
    }

    /// Fetches a URL with retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Done, body kept for analysis |
    /// | 5xx | Retry until attempts run out, then `http_error` |
    /// | Other status | Immediate `http_error` |
    /// | Timeout | Retry, then `timeout` |
    /// | Connection failure | Retry, then `connection_error` |
    /// | Body over the size cap | Immediate `too_large` |
    ///
    /// # Arguments
    ///
    /// * `url` - A URL that already passed validation and the robots check
    ///
    /// # Returns
    ///
    /// Exactly one [`FetchOutcome`]; this never fails.
    pub async fn fetch(&self, url: &Url) -> FetchOutcome {
        let mut state = RetryState::new(self.policy.clone());

        loop {
            let attempt = state.begin_attempt();
            tracing::debug!(url = %sanitize_parsed(url), attempt, "Fetching");

            let result = match tokio::time::timeout(
                self.timeout,
                self.transport.get(url, self.timeout, self.max_page_bytes),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(format!(
                    "no response within {:?}",
                    self.timeout
                ))),
            };

            match state.on_result(result) {
                Step::Done(outcome) => {
                    if let Some(kind) = outcome.error_kind {
                        tracing::info!(
                            url = %sanitize_parsed(url),
                            attempts = outcome.attempts,
                            status = ?outcome.status_code,
                            error = %kind,
                            "Fetch failed"
                        );
                    }
                    return outcome;
                }
                Step::RetryAfter { delay, reason } => {
                    tracing::warn!(
                        url = %sanitize_parsed(url),
                        attempt,
                        reason = %reason,
                        "Transient failure, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
