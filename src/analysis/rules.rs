//! Suspicion heuristics as a weighted rule table
//!
//! Each [`Signal`] is a yes/no test over a fetched page. A page is
//! suspicious when the summed weight of the signals that fire reaches the
//! table's threshold.

use crate::analysis::parser::PageFacts;
use crate::config::AnalysisConfig;
use std::fmt;

/// A single suspicion signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Bytes read differ from the declared `Content-Length` beyond tolerance
    LengthMismatch,
    /// A non-trivial body with no title
    UntitledBody,
    /// Blocklisted keywords appear too densely in the body text
    KeywordDensity,
    /// Few `div.content` blocks and no `<main>`/`<article>`
    SparseStructure,
}

impl Signal {
    /// Configuration name of the signal
    pub fn name(&self) -> &'static str {
        match self {
            Signal::LengthMismatch => "length-mismatch",
            Signal::UntitledBody => "untitled-body",
            Signal::KeywordDensity => "keyword-density",
            Signal::SparseStructure => "sparse-structure",
        }
    }

    /// Looks a signal up by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.name() == name.trim())
    }

    pub fn all() -> &'static [Signal] {
        &[
            Signal::LengthMismatch,
            Signal::UntitledBody,
            Signal::KeywordDensity,
            Signal::SparseStructure,
        ]
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a rule looks at besides the parsed HTML
#[derive(Debug, Clone, Copy)]
pub struct BodyStats {
    /// Bytes actually read
    pub read_bytes: u64,
    /// `Content-Length` the server declared
    pub declared_length: Option<u64>,
}

/// Tunables shared by all signals
#[derive(Debug, Clone)]
pub struct Thresholds {
    pub min_body_bytes: usize,
    pub length_mismatch_tolerance: f64,
    pub keywords: Vec<String>,
    pub keyword_density_per_mille: f64,
    pub min_content_blocks: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for Thresholds {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            min_body_bytes: config.min_body_bytes,
            length_mismatch_tolerance: config.length_mismatch_tolerance,
            keywords: config.keywords.clone(),
            keyword_density_per_mille: config.keyword_density_per_mille,
            min_content_blocks: config.min_content_blocks,
        }
    }
}

impl Signal {
    /// Evaluates this signal for one page
    pub fn fires(&self, facts: &PageFacts, stats: BodyStats, limits: &Thresholds) -> bool {
        match self {
            Signal::LengthMismatch => match stats.declared_length {
                Some(declared) => {
                    let gap = declared.abs_diff(stats.read_bytes) as f64;
                    gap / declared.max(1) as f64 > limits.length_mismatch_tolerance
                }
                None => false,
            },
            Signal::UntitledBody => {
                facts.title.is_empty() && stats.read_bytes >= limits.min_body_bytes as u64
            }
            Signal::KeywordDensity => {
                if facts.word_count == 0 {
                    return false;
                }
                let hits = facts.keyword_hits(&limits.keywords) as f64;
                hits * 1000.0 / facts.word_count as f64 >= limits.keyword_density_per_mille
            }
            Signal::SparseStructure => {
                !facts.has_landmark && facts.content_blocks < limits.min_content_blocks
            }
        }
    }
}

/// A signal with its weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub signal: Signal,
    pub weight: f64,
}

/// Outcome of running the table over a page
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub score: f64,
    pub fired: Vec<Signal>,
    pub suspicious: bool,
}

/// Ordered set of weighted rules plus the flagging threshold
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    threshold: f64,
    limits: Thresholds,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>, threshold: f64, limits: Thresholds) -> Self {
        Self {
            rules,
            threshold,
            limits,
        }
    }

    /// Builds the table from configuration; every enabled signal weighs 1.0
    ///
    /// Unknown names are skipped here; configuration validation rejects
    /// them before a table is ever built.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let rules = config
            .rules
            .iter()
            .filter_map(|name| Signal::from_name(name))
            .map(|signal| Rule {
                signal,
                weight: 1.0,
            })
            .collect();
        Self::new(rules, config.threshold, Thresholds::from(config))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Runs every rule and sums the weights of those that fire
    pub fn evaluate(&self, facts: &PageFacts, stats: BodyStats) -> Verdict {
        let mut score = 0.0;
        let mut fired = Vec::new();
        for rule in &self.rules {
            if rule.signal.fires(facts, stats, &self.limits) {
                score += rule.weight;
                fired.push(rule.signal);
            }
        }
        Verdict {
            score,
            suspicious: score >= self.threshold,
            fired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(title: &str, words: usize, blocks: usize, landmark: bool) -> PageFacts {
        PageFacts {
            title: title.to_string(),
            text: vec!["word"; words].join(" "),
            word_count: words,
            content_blocks: blocks,
            has_landmark: landmark,
        }
    }

    fn stats(read: u64, declared: Option<u64>) -> BodyStats {
        BodyStats {
            read_bytes: read,
            declared_length: declared,
        }
    }

    #[test]
    fn test_signal_names_round_trip() {
        for signal in Signal::all() {
            assert_eq!(Signal::from_name(signal.name()), Some(*signal));
        }
        assert_eq!(Signal::from_name("nope"), None);
    }

    #[test]
    fn test_length_mismatch() {
        let limits = Thresholds::default();
        let page = facts("t", 10, 0, true);
        assert!(!Signal::LengthMismatch.fires(&page, stats(1000, Some(1050)), &limits));
        assert!(Signal::LengthMismatch.fires(&page, stats(1000, Some(2000)), &limits));
        assert!(!Signal::LengthMismatch.fires(&page, stats(1000, None), &limits));
        assert!(Signal::LengthMismatch.fires(&page, stats(10, Some(0)), &limits));
    }

    #[test]
    fn test_untitled_body_needs_non_trivial_size() {
        let limits = Thresholds::default();
        assert!(Signal::UntitledBody.fires(&facts("", 10, 0, true), stats(4096, None), &limits));
        assert!(!Signal::UntitledBody.fires(&facts("", 10, 0, true), stats(100, None), &limits));
        assert!(!Signal::UntitledBody.fires(&facts("Home", 10, 0, true), stats(4096, None), &limits));
    }

    #[test]
    fn test_keyword_density() {
        let limits = Thresholds::default();
        let mut page = facts("t", 0, 0, true);
        page.text = "gift card gift card hello world".to_string();
        page.word_count = 6;
        assert!(Signal::KeywordDensity.fires(&page, stats(100, None), &limits));

        page.text = format!("gift card {}", vec!["filler"; 500].join(" "));
        page.word_count = 502;
        assert!(!Signal::KeywordDensity.fires(&page, stats(100, None), &limits));

        assert!(!Signal::KeywordDensity.fires(&facts("t", 0, 0, true), stats(0, None), &limits));
    }

    #[test]
    fn test_sparse_structure() {
        let limits = Thresholds::default();
        assert!(Signal::SparseStructure.fires(&facts("t", 1, 2, false), stats(1, None), &limits));
        assert!(!Signal::SparseStructure.fires(&facts("t", 1, 2, true), stats(1, None), &limits));
        assert!(!Signal::SparseStructure.fires(&facts("t", 1, 9, false), stats(1, None), &limits));
    }

    #[test]
    fn test_weights_sum_against_threshold() {
        let table = RuleTable::new(
            vec![
                Rule { signal: Signal::UntitledBody, weight: 0.6 },
                Rule { signal: Signal::SparseStructure, weight: 0.6 },
            ],
            1.0,
            Thresholds::default(),
        );

        let one = table.evaluate(&facts("", 10, 0, true), stats(4096, None));
        assert_eq!(one.fired, vec![Signal::UntitledBody]);
        assert!(!one.suspicious);

        let both = table.evaluate(&facts("", 10, 0, false), stats(4096, None));
        assert_eq!(both.fired.len(), 2);
        assert!((both.score - 1.2).abs() < 1e-9);
        assert!(both.suspicious);
    }

    #[test]
    fn test_from_config_follows_rule_list() {
        let mut config = AnalysisConfig::default();
        config.rules = vec!["sparse-structure".to_string()];
        let table = RuleTable::from_config(&config);
        assert_eq!(table.rules().len(), 1);
        assert_eq!(table.rules()[0].signal, Signal::SparseStructure);
        assert_eq!(table.threshold(), 1.0);
    }
}
