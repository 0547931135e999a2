//! Run-level reporting step

use crate::core::{ApplicationContext, PipelineHandle, Step};
use anyhow::Context;
use async_trait::async_trait;
use tracing::info;

/// Hands the aggregated results to the configured reporter
#[derive(Debug, Default)]
pub struct ReportSummaryStep;

#[async_trait]
impl Step for ReportSummaryStep {
    fn name(&self) -> String {
        "ReportSummary".to_string()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let summary = &context.summary;
        info!(
            "Run finished: {} passed, {} failed, {} skipped",
            summary.passed_tests(),
            summary.failed_tests(),
            summary.skipped_tests()
        );
        context
            .services
            .reporter
            .report_summary(summary)
            .context("Failed to report run summary")
    }
}
