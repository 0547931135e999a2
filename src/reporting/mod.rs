//! Test results and the reporters that publish them

pub mod console;
pub mod junit;
pub mod steps;

pub use console::ConsoleReporter;
pub use junit::{format_seconds, write_junit, JUnitReporter};
pub use steps::ReportSummaryStep;

use std::sync::Arc;
use std::time::Duration;

/// Result of a single named test
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    Passed,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub name: String,
    pub outcome: TestOutcome,
    pub duration: Duration,
}

impl TestResult {
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            outcome: TestOutcome::Passed,
            duration,
        }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            outcome: TestOutcome::Failed(message.into()),
            duration,
        }
    }

    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: TestOutcome::Skipped,
            duration: Duration::ZERO,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, TestOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, TestOutcome::Skipped)
    }
}

/// Everything recorded for one finished test case
#[derive(Debug, Clone, PartialEq)]
pub struct TestCaseResult {
    pub name: String,
    pub tests: Vec<TestResult>,
    /// Set when a script skipped the rest of the case
    pub skip_reason: Option<String>,
    pub duration: Duration,
}

impl TestCaseResult {
    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.tests.iter().any(TestResult::is_failed)
    }
}

/// Aggregated results of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub collection_name: String,
    pub test_cases: Vec<TestCaseResult>,
}

impl RunSummary {
    pub fn record(&mut self, result: TestCaseResult) {
        self.test_cases.push(result);
    }

    /// Number of reported tests; a skipped case without tests counts as one
    pub fn total_tests(&self) -> usize {
        self.test_cases
            .iter()
            .map(|case| case.tests.len().max(usize::from(case.is_skipped())))
            .sum()
    }

    pub fn failed_tests(&self) -> usize {
        self.tests().filter(|t| t.is_failed()).count()
    }

    pub fn skipped_tests(&self) -> usize {
        self.test_cases
            .iter()
            .map(|case| {
                let skipped = case.tests.iter().filter(|t| t.is_skipped()).count();
                if case.is_skipped() && case.tests.is_empty() {
                    1
                } else {
                    skipped
                }
            })
            .sum()
    }

    pub fn passed_tests(&self) -> usize {
        self.total_tests() - self.failed_tests() - self.skipped_tests()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_tests() > 0
    }

    pub fn duration(&self) -> Duration {
        self.test_cases.iter().map(|case| case.duration).sum()
    }

    fn tests(&self) -> impl Iterator<Item = &TestResult> {
        self.test_cases.iter().flat_map(|case| case.tests.iter())
    }
}

/// Publishes progress and results
pub trait Reporter: Send + Sync {
    fn report_start(&self, _collection: &str, _test_cases: usize) -> anyhow::Result<()> {
        Ok(())
    }

    fn report_test_case(&self, result: &TestCaseResult) -> anyhow::Result<()>;

    fn report_summary(&self, summary: &RunSummary) -> anyhow::Result<()>;
}

/// Fans every call out to several reporters, stopping at the first error
#[derive(Clone, Default)]
pub struct CompositeReporter {
    reporters: Vec<Arc<dyn Reporter>>,
}

impl CompositeReporter {
    pub fn new(reporters: Vec<Arc<dyn Reporter>>) -> Self {
        Self { reporters }
    }

    pub fn push(&mut self, reporter: Arc<dyn Reporter>) {
        self.reporters.push(reporter);
    }
}

impl Reporter for CompositeReporter {
    fn report_start(&self, collection: &str, test_cases: usize) -> anyhow::Result<()> {
        self.reporters
            .iter()
            .try_for_each(|r| r.report_start(collection, test_cases))
    }

    fn report_test_case(&self, result: &TestCaseResult) -> anyhow::Result<()> {
        self.reporters
            .iter()
            .try_for_each(|r| r.report_test_case(result))
    }

    fn report_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        self.reporters
            .iter()
            .try_for_each(|r| r.report_summary(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn case(name: &str, tests: Vec<TestResult>, skip: Option<&str>) -> TestCaseResult {
        TestCaseResult {
            name: name.to_string(),
            tests,
            skip_reason: skip.map(String::from),
            duration: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::default();
        summary.record(case(
            "get",
            vec![
                TestResult::passed("a", Duration::ZERO),
                TestResult::failed("b", "boom", Duration::ZERO),
                TestResult::skipped("c"),
            ],
            None,
        ));
        summary.record(case("later", vec![], Some("not deployed")));

        assert_eq!(summary.total_tests(), 4);
        assert_eq!(summary.failed_tests(), 1);
        assert_eq!(summary.skipped_tests(), 2);
        assert_eq!(summary.passed_tests(), 1);
        assert!(summary.has_failures());
        assert_eq!(summary.duration(), Duration::from_millis(20));
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    impl Reporter for Recording {
        fn report_test_case(&self, result: &TestCaseResult) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(result.name.clone());
            Ok(())
        }

        fn report_summary(&self, _summary: &RunSummary) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn test_composite_reporter_fans_out() {
        let first = Arc::new(Recording::default());
        let second = Arc::new(Recording::default());
        let composite = CompositeReporter::new(vec![first.clone() as Arc<dyn Reporter>, second.clone()]);

        composite.report_test_case(&case("get", vec![], None)).unwrap();
        assert_eq!(*first.0.lock().unwrap(), vec!["get".to_string()]);
        assert_eq!(*second.0.lock().unwrap(), vec!["get".to_string()]);
        assert!(composite.report_summary(&RunSummary::default()).is_err());
    }
}
