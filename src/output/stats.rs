//! End-of-run statistics
//!
//! This module renders a [`CrawlReport`] as the human-readable summary
//! printed once the crawl finishes.

use crate::crawler::CrawlReport;
use std::fmt::Write;

/// Renders the report as a multi-line summary
///
/// # Arguments
///
/// * `report` - The report returned by the coordinator
///
/// # Returns
///
/// The summary text, ending with a newline
pub fn format_statistics(report: &CrawlReport) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_statistics(&mut out, report);
    out
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_statistics(report: &CrawlReport) {
    print!("{}", format_statistics(report));
}

fn write_statistics(out: &mut String, report: &CrawlReport) -> std::fmt::Result {
    writeln!(out, "=== Crawl Statistics ===\n")?;

    writeln!(out, "Seeds:")?;
    writeln!(out, "  Supplied: {}", report.seeds_total)?;
    writeln!(out, "  Blank: {}", report.blank_seeds)?;
    writeln!(out, "  Duplicates: {}", report.duplicate_seeds)?;
    writeln!(out, "  Already recorded: {}", report.already_recorded)?;
    if report.not_started > 0 {
        writeln!(out, "  Not started: {}", report.not_started)?;
    }
    writeln!(out)?;

    let total = report.tasks.len();
    writeln!(out, "Outcomes ({} recorded):", total)?;
    // Sort outcomes by count (descending), then by label
    let mut outcomes: Vec<_> = report.outcome_breakdown().into_iter().collect();
    outcomes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (label, count) in outcomes {
        writeln!(out, "  {}: {} ({:.1}%)", label, count, percentage(count, total))?;
    }
    writeln!(out)?;

    writeln!(out, "Analysis:")?;
    writeln!(
        out,
        "  Suspicious: {} of {} analyzed",
        report.suspicious(),
        report.successes()
    )?;
    writeln!(out)?;

    writeln!(out, "Run:")?;
    writeln!(out, "  Peak concurrency: {}", report.peak_active)?;
    writeln!(out, "  robots.txt fetches: {}", report.robots_fetches)?;
    writeln!(out, "  Store errors: {}", report.store_failures())?;
    writeln!(out, "  Elapsed: {:.2}s", report.elapsed.as_secs_f64())?;
    if report.interrupted {
        writeln!(out, "  Interrupted: yes")?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} URLs fetched successfully)",
        percentage(report.successes(), total),
        report.successes(),
        total
    )
}

fn percentage(count: usize, total: usize) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{FetchErrorKind, StoreStatus, TaskSummary};
    use crate::state::{RecordOutcome, SkipReason};

    fn task(url: &str, outcome: RecordOutcome, suspicious: Option<bool>) -> TaskSummary {
        TaskSummary {
            url: url.to_string(),
            outcome,
            status_code: None,
            attempts: 1,
            suspicious,
            stored: StoreStatus::Appended,
        }
    }

    #[test]
    fn test_summary_lists_outcomes_and_counts() {
        let report = CrawlReport {
            tasks: vec![
                task("a", RecordOutcome::Success, Some(true)),
                task("b", RecordOutcome::Success, Some(false)),
                task("c", RecordOutcome::Failure(FetchErrorKind::HttpError), None),
                task("d", RecordOutcome::Skipped(SkipReason::InvalidUrl), None),
            ],
            seeds_total: 5,
            duplicate_seeds: 1,
            peak_active: 2,
            ..CrawlReport::default()
        };

        let text = format_statistics(&report);
        assert!(text.contains("Supplied: 5"));
        assert!(text.contains("Duplicates: 1"));
        assert!(text.contains("success: 2 (50.0%)"));
        assert!(text.contains("failure(http_error): 1"));
        assert!(text.contains("Suspicious: 1 of 2 analyzed"));
        assert!(text.contains("Peak concurrency: 2"));
        assert!(!text.contains("Interrupted"));
    }

    #[test]
    fn test_empty_report_has_zero_rate() {
        let text = format_statistics(&CrawlReport::default());
        assert!(text.contains("Success Rate: 0.0% (0 / 0"));
    }
}
