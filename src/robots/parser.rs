//! Robots.txt rule evaluation
//!
//! Matching is delegated to the robotstxt crate (a port of Google's
//! matcher); this module only adds the "no rules" fallback and the
//! non-standard `Crawl-delay` directive.

use robotstxt::DefaultMatcher;

/// Rules parsed from one robots.txt body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotsRules {
    /// Raw body; empty means no restrictions
    content: String,
}

impl RobotsRules {
    /// Wraps a robots.txt body
    ///
    /// Unparseable content is not an error: lines the matcher does not
    /// understand are ignored, so garbage behaves like an empty file.
    /// A leading byte-order mark is dropped so the first line still parses.
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.trim_start_matches('\u{feff}').to_string(),
        }
    }

    /// Rules that allow every URL
    ///
    /// Used whenever robots.txt is missing, unreachable or times out.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// True when these rules can never disallow anything
    pub fn is_unrestricted(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Checks if a URL is allowed for the given robots token
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL being checked
    /// * `agent` - Product token matched against `User-agent` lines
    ///
    /// # Returns
    ///
    /// * `true` - If the URL may be fetched
    /// * `false` - If a matching group disallows it
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }

    /// Gets the `Crawl-delay` for an agent, in seconds
    ///
    /// A group naming the agent wins over the `*` group. Reported only;
    /// the crawler does not pace requests by it.
    pub fn crawl_delay(&self, agent: &str) -> Option<f64> {
        let agent = agent.to_ascii_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut specific = None;
        let mut wildcard = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                // Consecutive User-agent lines share one group
                if !in_agent_lines {
                    group.clear();
                }
                group.push(value.to_ascii_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(delay) = value.parse::<f64>() else {
                continue;
            };
            if !delay.is_finite() || delay < 0.0 {
                continue;
            }
            if group.iter().any(|ua| *ua == agent) {
                specific.get_or_insert(delay);
            } else if group.iter().any(|ua| ua == "*") {
                wildcard.get_or_insert(delay);
            }
        }

        specific.or(wildcard)
    }
}
