//! Robots gate: per-origin cached allow/deny decisions
//!
//! The first task to reach an origin fetches its robots.txt; every other
//! task for the same origin waits on the same in-flight fetch instead of
//! issuing its own. Missing, failing or slow robots.txt never blocks a
//! crawl: the origin is treated as unrestricted.

use crate::config::Config;
use crate::crawler::Transport;
use crate::robots::{PolicySource, RobotsPolicy, RobotsRules};
use crate::url::{host_key, robots_url, sanitize_parsed};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use url::Url;

/// Largest robots.txt body read; anything beyond is ignored
pub const MAX_ROBOTS_BYTES: u64 = 512 * 1024;

type PolicyCell = Arc<OnceCell<Arc<RobotsPolicy>>>;

/// Result of a robots check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotsDecision {
    Allowed,
    Disallowed,
}

impl RobotsDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RobotsDecision::Allowed)
    }
}

/// Shared robots.txt cache and checker
pub struct RobotsGate {
    transport: Arc<dyn Transport>,
    agent: String,
    timeout: Duration,
    cache: Mutex<HashMap<String, PolicyCell>>,
    fetches: AtomicUsize,
}

impl RobotsGate {
    /// Creates a gate
    ///
    /// # Arguments
    ///
    /// * `transport` - Transport used for robots.txt requests
    /// * `agent` - Product token matched against `User-agent` groups
    /// * `timeout` - Upper bound on one robots.txt fetch
    pub fn new(transport: Arc<dyn Transport>, agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            agent: agent.into(),
            timeout,
            cache: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self::new(
            transport,
            config.user_agent.robots_token(),
            config.crawler.robots_timeout(),
        )
    }

    /// Decides whether `url` may be fetched
    ///
    /// Fetches the origin's robots.txt on first use; concurrent callers for
    /// the same origin share that single fetch.
    pub async fn check(&self, url: &Url) -> RobotsDecision {
        let policy = self.policy_for(url).await;
        if policy.is_allowed(url.as_str(), &self.agent) {
            RobotsDecision::Allowed
        } else {
            tracing::info!(
                url = %sanitize_parsed(url),
                agent = %self.agent,
                "Disallowed by robots.txt"
            );
            RobotsDecision::Disallowed
        }
    }

    /// Returns the cached policy for the URL's origin, fetching it if needed
    pub async fn policy_for(&self, url: &Url) -> Arc<RobotsPolicy> {
        let key = host_key(url);
        let cell = self.cell_for(&key);

        cell.get_or_init(|| self.load_policy(url, key.clone()))
            .await
            .clone()
    }

    /// Number of robots.txt fetches issued so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of origins with a cache entry
    pub fn cached_origins(&self) -> usize {
        self.lock_cache().len()
    }

    fn cell_for(&self, key: &str) -> PolicyCell {
        self.lock_cache().entry(key.to_string()).or_default().clone()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, PolicyCell>> {
        // The map holds no invariants a panic could break
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn load_policy(&self, url: &Url, key: String) -> Arc<RobotsPolicy> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let location = robots_url(url);
        let policy = match Url::parse(&location) {
            Ok(robots) => self.fetch_policy(&robots, key).await,
            Err(e) => {
                tracing::warn!(origin = %key, error = %e, "Cannot build robots.txt URL, allowing all");
                RobotsPolicy::fail_open(key, PolicySource::Unreachable)
            }
        };

        tracing::debug!(
            origin = %policy.host,
            source = %policy.source,
            unrestricted = policy.rules.is_unrestricted(),
            crawl_delay = ?policy.crawl_delay(&self.agent),
            expiry = %policy.expiry,
            "Cached robots.txt policy"
        );
        Arc::new(policy)
    }

    async fn fetch_policy(&self, robots: &Url, key: String) -> RobotsPolicy {
        let request = self.transport.get(robots, self.timeout, MAX_ROBOTS_BYTES);

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) if (200..300).contains(&response.status) => {
                let body = String::from_utf8_lossy(&response.body);
                RobotsPolicy::new(key, RobotsRules::from_content(&body), PolicySource::Fetched)
            }
            Ok(Ok(response)) => {
                tracing::debug!(origin = %key, status = response.status, "No usable robots.txt");
                RobotsPolicy::fail_open(key, PolicySource::Missing(response.status))
            }
            Ok(Err(e)) => {
                tracing::warn!(origin = %key, error = %e, "robots.txt fetch failed, allowing all");
                RobotsPolicy::fail_open(key, PolicySource::Unreachable)
            }
            Err(_) => {
                tracing::warn!(
                    origin = %key,
                    timeout = ?self.timeout,
                    "robots.txt fetch timed out, allowing all"
                );
                RobotsPolicy::fail_open(key, PolicySource::Unreachable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::transport::testing::{Reply, ScriptedTransport};

    const ROBOTS: &str = "https://site.test/robots.txt";

    fn gate(transport: Arc<ScriptedTransport>) -> RobotsGate {
        RobotsGate::new(transport, "SieveBot", Duration::from_secs(3))
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_disallow_rules_applied() {
        let transport = Arc::new(
            ScriptedTransport::new().route(ROBOTS, vec![Reply::ok("User-agent: *\nDisallow: /private")]),
        );
        let gate = gate(transport.clone());

        assert_eq!(gate.check(&url("https://site.test/open")).await, RobotsDecision::Allowed);
        assert_eq!(
            gate.check(&url("https://site.test/private/x")).await,
            RobotsDecision::Disallowed
        );
        assert_eq!(transport.calls_to(ROBOTS), 1);
        assert_eq!(gate.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_bom_prefixed_robots_still_disallows() {
        let transport = Arc::new(ScriptedTransport::new().route(
            ROBOTS,
            vec![Reply::ok("\u{feff}User-agent: *\nDisallow: /private\n")],
        ));
        let gate = gate(transport);

        assert_eq!(
            gate.check(&url("https://site.test/private/a")).await,
            RobotsDecision::Disallowed
        );
        assert!(gate.check(&url("https://site.test/open")).await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_checks_share_one_fetch() {
        let transport = Arc::new(
            ScriptedTransport::with_delay(Duration::from_millis(200))
                .route(ROBOTS, vec![Reply::ok("User-agent: *\nDisallow: /p")]),
        );
        let gate = Arc::new(gate(transport.clone()));

        let mut handles = Vec::new();
        for i in 0..10 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move {
                gate.check(&url(&format!("https://site.test/p/{}", i))).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), RobotsDecision::Disallowed);
        }

        assert_eq!(transport.calls_to(ROBOTS), 1);
        assert_eq!(gate.cached_origins(), 1);
    }

    #[tokio::test]
    async fn test_origins_are_cached_separately() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .route(ROBOTS, vec![Reply::ok("User-agent: *\nDisallow: /")])
                .route("http://site.test/robots.txt", vec![Reply::ok("")]),
        );
        let gate = gate(transport.clone());

        assert!(!gate.check(&url("https://site.test/a")).await.is_allowed());
        assert!(gate.check(&url("http://site.test/a")).await.is_allowed());
        assert_eq!(gate.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_robots_fails_open() {
        let transport = Arc::new(
            ScriptedTransport::new().route(ROBOTS, vec![Reply::Status(500, String::new())]),
        );
        let gate = gate(transport.clone());

        assert!(gate.check(&url("https://site.test/anything")).await.is_allowed());
        let policy = gate.policy_for(&url("https://site.test/")).await;
        assert_eq!(policy.source, PolicySource::Missing(500));
        assert_eq!(transport.calls_to(ROBOTS), 1);
    }

    #[tokio::test]
    async fn test_unreachable_robots_fails_open() {
        let transport = Arc::new(ScriptedTransport::new().route(ROBOTS, vec![Reply::Connect]));
        let gate = gate(transport);

        assert!(gate.check(&url("https://site.test/x")).await.is_allowed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_robots_times_out_and_fails_open() {
        let transport = Arc::new(ScriptedTransport::new().route(ROBOTS, vec![Reply::Hang]));
        let gate = gate(transport);

        let started = tokio::time::Instant::now();
        assert!(gate.check(&url("https://site.test/x")).await.is_allowed());
        assert!(started.elapsed() < Duration::from_secs(4));

        let policy = gate.policy_for(&url("https://site.test/")).await;
        assert_eq!(policy.source, PolicySource::Unreachable);
    }

    #[tokio::test]
    async fn test_agent_specific_group() {
        let transport = Arc::new(ScriptedTransport::new().route(
            ROBOTS,
            vec![Reply::ok("User-agent: SieveBot\nDisallow: /\n\nUser-agent: *\nAllow: /")],
        ));

        let ours = RobotsGate::new(transport.clone(), "SieveBot", Duration::from_secs(3));
        assert!(!ours.check(&url("https://site.test/page")).await.is_allowed());

        let theirs = RobotsGate::new(transport, "OtherBot", Duration::from_secs(3));
        assert!(theirs.check(&url("https://site.test/page")).await.is_allowed());
    }
}
