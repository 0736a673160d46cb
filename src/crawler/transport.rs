//! HTTP transport seam
//!
//! The fetcher and the robots gate never talk to reqwest directly; they go
//! through [`Transport`], which performs exactly one GET and reports either
//! a raw response or a classified transport error. Retry, backoff and
//! outcome mapping live above this layer.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{header::CONTENT_LENGTH, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed for a single request
pub const MAX_REDIRECTS: usize = 10;

/// A single HTTP response as seen by the transport
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,

    /// `Content-Length` as declared by the server, if any
    pub declared_length: Option<u64>,

    /// Body bytes actually read (at most `max_bytes`)
    pub body: Vec<u8>,

    /// True when reading stopped because the body exceeded `max_bytes`
    pub truncated: bool,
}

/// Errors raised before a complete response was obtained
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    /// The request could not be issued at all (bad redirect chain, builder error)
    #[error("request rejected: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout(_) | TransportError::Connection(_)
        )
    }
}

/// Performs one HTTP GET
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url`, reading at most `max_bytes` of body within `timeout`
    async fn get(
        &self,
        url: &Url,
        timeout: Duration,
        max_bytes: u64,
    ) -> Result<RawResponse, TransportError>;
}

/// Builds the shared HTTP client
///
/// # Arguments
///
/// * `config` - The full configuration; user agent, timeouts and proxy are read from it
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (e.g. a malformed proxy)
///
/// # Example
///
/// ```no_run
/// use sumi_sieve::config::Config;
/// use sumi_sieve::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.header_value())
        .connect_timeout(config.crawler.request_timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.crawler.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a transport with a client configured from `config`
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &Url,
        timeout: Duration,
        max_bytes: u64,
    ) -> Result<RawResponse, TransportError> {
        let mut response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status().as_u16();

        // Read from the header: reqwest strips it when it decompresses
        let declared_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let mut body = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response.chunk().await.map_err(classify_error)? {
            if body.len() as u64 + chunk.len() as u64 > max_bytes {
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(RawResponse {
            status,
            declared_length,
            body,
            truncated,
        })
    }
}

/// Maps a reqwest error onto the transport taxonomy
fn classify_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_redirect() || err.is_builder() {
        TransportError::Request(err.to_string())
    } else {
        // Connect failures, resets mid-body, DNS errors
        TransportError::Connection(err.to_string())
    }
}
