//! Content analysis for fetched pages
//!
//! This module turns a successful fetch into a title and a suspicion
//! verdict:
//! - HTML inspection (title, body text, structure)
//! - A configurable table of weighted heuristic signals
//!
//! Analysis is pure and never fails: bodies that cannot be decoded are
//! flagged as suspicious with an empty title.

mod parser;
mod rules;

pub use parser::{parse_page, PageFacts};
pub use rules::{BodyStats, Rule, RuleTable, Signal, Thresholds, Verdict};

use crate::config::AnalysisConfig;
use crate::crawler::FetchOutcome;

/// Title and verdict for one page
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Page title, empty if none was found
    pub title: String,

    pub suspicious: bool,

    /// Summed weight of the signals that fired
    pub score: f64,

    pub signals: Vec<Signal>,

    /// True when the body could not be decoded and was flagged outright
    pub degraded: bool,
}

impl AnalysisResult {
    /// Verdict for a body that could not be analyzed at all
    pub fn degraded() -> Self {
        Self {
            title: String::new(),
            suspicious: true,
            score: 0.0,
            signals: Vec::new(),
            degraded: true,
        }
    }
}

/// Scores fetched pages with a [`RuleTable`]
#[derive(Debug, Clone)]
pub struct ContentAnalyzer {
    table: RuleTable,
}

impl ContentAnalyzer {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(RuleTable::from_config(config))
    }

    /// Analyzes the body of a successful fetch
    ///
    /// # Arguments
    ///
    /// * `outcome` - A fetch outcome with no error kind
    ///
    /// # Returns
    ///
    /// The page title and verdict. A body that is not valid UTF-8 yields
    /// `suspicious = true` and an empty title.
    pub fn analyze(&self, outcome: &FetchOutcome) -> AnalysisResult {
        let body = outcome.body.as_deref().unwrap_or_default();

        let html = match std::str::from_utf8(body) {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!(error = %e, "Body is not valid UTF-8, flagging as suspicious");
                return AnalysisResult::degraded();
            }
        };

        let facts = parse_page(html);
        let verdict = self.table.evaluate(
            &facts,
            BodyStats {
                read_bytes: body.len() as u64,
                declared_length: outcome.declared_length,
            },
        );

        AnalysisResult {
            title: facts.title,
            suspicious: verdict.suspicious,
            score: verdict.score,
            signals: verdict.fired,
            degraded: false,
        }
    }
}
