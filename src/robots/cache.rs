//! Cached robots.txt policies
//!
//! One [`RobotsPolicy`] is kept per origin for the lifetime of the run.

use crate::robots::RobotsRules;
use chrono::{DateTime, Utc};
use std::fmt;

/// Where a policy's rules came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySource {
    /// A 2xx robots.txt body
    Fetched,
    /// The server answered with this non-success status
    Missing(u16),
    /// Timeout or connection failure
    Unreachable,
}

impl fmt::Display for PolicySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicySource::Fetched => write!(f, "fetched"),
            PolicySource::Missing(status) => write!(f, "missing (HTTP {})", status),
            PolicySource::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// When a cached policy stops being trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Kept until the process exits
    ProcessLifetime,
}

impl fmt::Display for ExpiryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryPolicy::ProcessLifetime => write!(f, "process lifetime"),
        }
    }
}

/// Robots rules for one origin
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Origin key, `scheme://host[:port]`
    pub host: String,

    pub rules: RobotsRules,

    pub source: PolicySource,

    /// When the robots.txt fetch finished
    pub fetched_at: DateTime<Utc>,

    pub expiry: ExpiryPolicy,
}

impl RobotsPolicy {
    /// Creates a policy stamped with the current time
    pub fn new(host: impl Into<String>, rules: RobotsRules, source: PolicySource) -> Self {
        Self {
            host: host.into(),
            rules,
            source,
            fetched_at: Utc::now(),
            expiry: ExpiryPolicy::ProcessLifetime,
        }
    }

    /// An allow-everything policy used when robots.txt is unavailable
    pub fn fail_open(host: impl Into<String>, source: PolicySource) -> Self {
        Self::new(host, RobotsRules::allow_all(), source)
    }

    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        self.rules.is_allowed(url, agent)
    }

    pub fn crawl_delay(&self, agent: &str) -> Option<f64> {
        self.rules.crawl_delay(agent)
    }
}
