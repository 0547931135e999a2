//! JUnit-style XML results file

use crate::reporting::{Reporter, RunSummary, TestCaseResult, TestOutcome};
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use xml::writer::{EmitterConfig, XmlEvent};

/// Seconds with three decimals, never below `0.001`
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64().max(0.001))
}

/// Write `summary` as a single `<testsuite>` inside `<testsuites>`
pub fn write_junit<W: Write>(summary: &RunSummary, out: W) -> Result<(), xml::writer::Error> {
    let mut writer = EmitterConfig::new()
        .perform_indent(true)
        .create_writer(out);

    let tests = summary.total_tests().to_string();
    let failures = summary.failed_tests().to_string();
    let skipped = summary.skipped_tests().to_string();
    let time = format_seconds(summary.duration());

    writer.write(
        XmlEvent::start_element("testsuites")
            .attr("name", &summary.collection_name)
            .attr("tests", &tests)
            .attr("failures", &failures)
            .attr("skipped", &skipped)
            .attr("time", &time),
    )?;
    writer.write(
        XmlEvent::start_element("testsuite")
            .attr("name", &summary.collection_name)
            .attr("tests", &tests)
            .attr("skipped", &skipped)
            .attr("failures", &failures)
            .attr("time", &time),
    )?;

    for case in &summary.test_cases {
        write_test_case(&mut writer, case)?;
    }

    writer.write(XmlEvent::end_element())?;
    writer.write(XmlEvent::end_element())?;
    Ok(())
}

fn write_test_case<W: Write>(
    writer: &mut xml::writer::EventWriter<W>,
    case: &TestCaseResult,
) -> Result<(), xml::writer::Error> {
    if case.tests.is_empty() {
        if let Some(reason) = &case.skip_reason {
            let time = format_seconds(case.duration);
            writer.write(
                XmlEvent::start_element("testcase")
                    .attr("classname", &case.name)
                    .attr("name", &case.name)
                    .attr("time", &time),
            )?;
            writer.write(XmlEvent::start_element("skipped").attr("message", reason))?;
            writer.write(XmlEvent::end_element())?;
            writer.write(XmlEvent::end_element())?;
        }
        return Ok(());
    }

    for test in &case.tests {
        let time = format_seconds(test.duration);
        writer.write(
            XmlEvent::start_element("testcase")
                .attr("classname", &case.name)
                .attr("name", &test.name)
                .attr("time", &time),
        )?;
        match &test.outcome {
            TestOutcome::Passed => {}
            TestOutcome::Failed(message) => {
                writer.write(
                    XmlEvent::start_element("failure")
                        .attr("message", message)
                        .attr("type", "AssertionFailed"),
                )?;
                writer.write(XmlEvent::end_element())?;
            }
            TestOutcome::Skipped => {
                writer.write(XmlEvent::start_element("skipped"))?;
                writer.write(XmlEvent::end_element())?;
            }
        }
        writer.write(XmlEvent::end_element())?;
    }
    Ok(())
}

/// Writes the results file once the run summary is known
#[derive(Debug, Clone)]
pub struct JUnitReporter {
    path: PathBuf,
}

impl JUnitReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Reporter for JUnitReporter {
    fn report_test_case(&self, _result: &TestCaseResult) -> anyhow::Result<()> {
        Ok(())
    }

    fn report_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create '{}'", parent.display()))?;
        }
        let file = File::create(&self.path)
            .with_context(|| format!("Failed to create report '{}'", self.path.display()))?;
        let mut out = BufWriter::new(file);
        write_junit(summary, &mut out)
            .with_context(|| format!("Failed to write report '{}'", self.path.display()))?;
        out.flush()?;

        info!("JUnit report written to {}", self.path.display());
        Ok(())
    }
}
