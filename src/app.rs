//! Assembles a run: context, initial steps and exit code

use crate::core::{
    ApplicationContext, CancellationToken, Pipeline, RunOutcome, RunnerConfig, Services, StepRef,
    EXIT_FAILURE,
};
use crate::environments::{EnvironmentError, InitializeEnvironmentsStep};
use crate::execution::{remove_temp_folder, CleanUpTemporaryFolderStep, GenerateStepsForCollectionStep};
use crate::reporting::{CompositeReporter, JUnitReporter, ReportSummaryStep, Reporter, RunSummary};
use crate::scripts::NuGetPackageHandler;
use crate::structure::ExploreStructureStep;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// What a finished run hands back to the caller
#[derive(Debug)]
pub struct RunReport {
    pub exit_code: i32,
    pub summary: RunSummary,
}

/// A configured test run over one collection
pub struct Application {
    path: PathBuf,
    config: RunnerConfig,
    services: Services,
}

impl Application {
    pub fn new(path: impl Into<PathBuf>, config: RunnerConfig) -> Self {
        let mut services = Services::default();
        if let Some(cache) = &config.package_cache {
            services = services.with_packages(Arc::new(NuGetPackageHandler::new(cache)));
        }
        Self {
            path: path.into(),
            config,
            services,
        }
    }

    /// Replace the collaborators, e.g. with test doubles
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Steps every run starts with; the generation step expands the middle
    pub fn initial_steps() -> Vec<StepRef> {
        vec![
            Arc::new(ExploreStructureStep),
            Arc::new(InitializeEnvironmentsStep),
            Arc::new(GenerateStepsForCollectionStep),
            Arc::new(ReportSummaryStep),
            Arc::new(CleanUpTemporaryFolderStep),
        ]
    }

    /// Build the context for a run, failing early on a missing environment file
    pub fn build_context(&self) -> Result<ApplicationContext> {
        if let Some(file) = &self.config.environment_file {
            if !file.is_file() {
                return Err(EnvironmentError::FileNotFound(file.display().to_string()).into());
            }
        }

        let mut services = self.services.clone();
        if let Some(report_file) = &self.config.report_file {
            let reporters: Vec<Arc<dyn Reporter>> = vec![
                services.reporter.clone(),
                Arc::new(JUnitReporter::new(report_file)),
            ];
            services = services.with_reporter(Arc::new(CompositeReporter::new(reporters)));
        }

        let mut context = ApplicationContext::new(&self.path, services);
        context.environment_file = self.config.environment_file.clone();
        context.environment_name = self.config.environment.clone();
        context.report_file = self.config.report_file.clone();
        if let Some(base) = &self.config.temp_path {
            context.temp_path = base.join(context.run_id.to_string());
        }
        if let Some(secs) = self.config.request_timeout_secs {
            context.request_timeout = Duration::from_secs(secs);
        }
        Ok(context)
    }

    /// Run the collection and compute the process exit code.
    ///
    /// A run that completes with failed tests exits with [`EXIT_FAILURE`].
    pub async fn run(&self, cancellation: CancellationToken) -> Result<RunReport> {
        let mut context = self.build_context()?;
        info!(
            "Run {} over '{}' (temp folder {})",
            context.run_id,
            self.path.display(),
            context.temp_path.display()
        );

        let mut pipeline = Pipeline::new();
        pipeline.add_steps(Self::initial_steps())?;
        let outcome = pipeline.execute(&mut context, cancellation).await;

        let exit_code = match &outcome {
            RunOutcome::Completed if context.summary.has_failures() => EXIT_FAILURE,
            other => other.exit_code(),
        };
        if !matches!(outcome, RunOutcome::Completed) {
            remove_temp_folder(&context.temp_path).await;
        }

        Ok(RunReport {
            exit_code,
            summary: context.summary,
        })
    }
}
