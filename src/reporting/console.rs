//! Styled terminal reporter

use crate::reporting::{Reporter, RunSummary, TestCaseResult, TestOutcome};
use console::{style, Emoji};

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Prints one block per test case and a closing summary line
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

/// Lines printed for a finished test case
pub fn format_test_case(result: &TestCaseResult) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(reason) = &result.skip_reason {
        lines.push(format!(
            "{}{} {}",
            SKIP,
            style(&result.name).dim(),
            style(format!("(skipped: {})", reason)).dim()
        ));
    } else {
        let icon = if result.is_failed() { CROSS } else { CHECK };
        lines.push(format!(
            "{}{} {}",
            icon,
            style(&result.name).bold(),
            style(format!("{} ms", result.duration.as_millis())).dim()
        ));
    }

    for test in &result.tests {
        let line = match &test.outcome {
            TestOutcome::Passed => format!("    {}{}", CHECK, style(&test.name).green()),
            TestOutcome::Failed(message) => format!(
                "    {}{}: {}",
                CROSS,
                style(&test.name).red(),
                style(message).dim()
            ),
            TestOutcome::Skipped => format!("    {}{}", SKIP, style(&test.name).dim()),
        };
        lines.push(line);
    }
    lines
}

/// Closing line with the run totals
pub fn format_summary(summary: &RunSummary) -> String {
    let failed = summary.failed_tests();
    let counts = format!(
        "{} passed, {} failed, {} skipped",
        summary.passed_tests(),
        failed,
        summary.skipped_tests()
    );
    let counts = if failed > 0 {
        style(counts).red().bold()
    } else {
        style(counts).green().bold()
    };
    format!(
        "{} {} test case(s): {} in {:.2}s",
        style(&summary.collection_name).bold(),
        summary.test_cases.len(),
        counts,
        summary.duration().as_secs_f64()
    )
}

impl Reporter for ConsoleReporter {
    fn report_start(&self, collection: &str, test_cases: usize) -> anyhow::Result<()> {
        println!(
            "{}Running {} ({} test case(s))",
            ROCKET,
            style(collection).bold(),
            test_cases
        );
        Ok(())
    }

    fn report_test_case(&self, result: &TestCaseResult) -> anyhow::Result<()> {
        for line in format_test_case(result) {
            println!("{}", line);
        }
        Ok(())
    }

    fn report_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        println!();
        println!("{}", format_summary(summary));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::TestResult;
    use std::time::Duration;

    #[test]
    fn test_format_test_case_lists_every_test() {
        console::set_colors_enabled(false);
        let result = TestCaseResult {
            name: "users/get".to_string(),
            tests: vec![
                TestResult::passed("ok", Duration::ZERO),
                TestResult::failed("body", "mismatch", Duration::ZERO),
            ],
            skip_reason: None,
            duration: Duration::from_millis(12),
        };

        let lines = format_test_case(&result);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("users/get"));
        assert!(lines[2].contains("body: mismatch"));
    }

    #[test]
    fn test_format_summary_counts() {
        console::set_colors_enabled(false);
        let summary = RunSummary {
            collection_name: "demo".to_string(),
            test_cases: vec![TestCaseResult {
                name: "later".to_string(),
                tests: vec![],
                skip_reason: Some("wip".to_string()),
                duration: Duration::ZERO,
            }],
        };
        assert!(format_summary(&summary).contains("0 passed, 0 failed, 1 skipped"));
    }
}
