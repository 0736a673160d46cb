//! Crawler module for fetching and processing seed URLs
//!
//! This module contains the core crawling logic, including:
//! - HTTP transport and client construction
//! - Fetching with bounded retries and exponential backoff
//! - Admission control for the global concurrency limit
//! - Overall crawl coordination and the end-of-run report

mod coordinator;
mod fetcher;
mod report;
mod retry;
mod scheduler;
pub(crate) mod transport;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{FetchErrorKind, FetchOutcome, Fetcher};
pub use report::{CrawlReport, StoreStatus, TaskSummary};
pub use retry::{RetryPolicy, RetryState, Step};
pub use scheduler::{ActiveGauge, ActiveGuard, Admitted, Scheduler};
pub use transport::{build_http_client, HttpTransport, RawResponse, Transport, TransportError};
