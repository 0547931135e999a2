//! Test case boundaries

use crate::core::{ApplicationContext, PipelineHandle, Step, TestCaseExecution};
use crate::reporting::TestCaseResult;
use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

/// Makes a test case current
#[derive(Debug)]
pub struct StartTestCaseStep {
    name: String,
    request_path: PathBuf,
}

impl StartTestCaseStep {
    pub fn new(name: impl Into<String>, request_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            request_path: request_path.into(),
        }
    }
}

#[async_trait]
impl Step for StartTestCaseStep {
    fn name(&self) -> String {
        format!("StartTestCase({})", self.name)
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        info!("Test case '{}'", self.name);
        context.current_test_case = Some(TestCaseExecution::new(&self.name, &self.request_path));
        Ok(())
    }
}

/// Records and reports the current test case, then clears TestCase scope
#[derive(Debug, Default)]
pub struct FinishTestCaseStep;

#[async_trait]
impl Step for FinishTestCaseStep {
    fn name(&self) -> String {
        "FinishTestCase".to_string()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let case = context
            .current_test_case
            .take()
            .context("No test case is running")?;

        let result = TestCaseResult {
            name: case.name,
            tests: case.tests,
            skip_reason: case.skip_reason,
            duration: case.started.elapsed(),
        };
        debug!(
            "Test case '{}' finished with {} tests",
            result.name,
            result.tests.len()
        );

        context.services.reporter.report_test_case(&result)?;
        context.summary.record(result);
        context.variables.test_case.clear();
        Ok(())
    }
}
