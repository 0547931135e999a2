//! Sequential, self-extending pipeline

use crate::core::{
    cancellation::CancellationToken,
    context::ApplicationContext,
    step::{PipelineHandle, StepRef},
    steps::{StepsCollection, StepsError},
};
use tracing::{debug, error, info, warn};

/// Exit code of a run that finished every step
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code of a run aborted by an unhandled step error
pub const EXIT_FAILURE: i32 = 1;

/// Exit code of a cancelled run
pub const EXIT_CANCELLED: i32 = 130;

/// How a pipeline run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Every step ran (or was skipped)
    Completed,
    /// A step failed; no later step ran
    Failed(anyhow::Error),
    /// A step asked the run to stop with this code
    ExitRequested(i32),
    /// Cancellation was requested before a step or while it ran
    Cancelled,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed => EXIT_SUCCESS,
            RunOutcome::Failed(_) => EXIT_FAILURE,
            RunOutcome::ExitRequested(code) => *code,
            RunOutcome::Cancelled => EXIT_CANCELLED,
        }
    }
}

/// An ordered list of steps run one at a time against a shared context.
///
/// Steps may insert further steps while the pipeline runs; anything inserted
/// after the executing step is picked up by the same run.
#[derive(Debug, Default)]
pub struct Pipeline {
    steps: StepsCollection,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append steps at the tail
    pub fn add_steps(&mut self, steps: Vec<StepRef>) -> Result<(), StepsError> {
        self.steps.add_range(steps)
    }

    /// Insert steps, in order, immediately after `predecessor`
    pub fn insert_steps(&mut self, predecessor: &StepRef, steps: Vec<StepRef>) -> Result<(), StepsError> {
        self.steps.insert_range(predecessor, steps)
    }

    pub fn steps(&self) -> &StepsCollection {
        &self.steps
    }

    /// Run every step and return the process exit code
    pub async fn run(&mut self, context: &mut ApplicationContext, cancellation: CancellationToken) -> i32 {
        self.execute(context, cancellation).await.exit_code()
    }

    /// Run every step and report how the run ended
    pub async fn execute(
        &mut self,
        context: &mut ApplicationContext,
        cancellation: CancellationToken,
    ) -> RunOutcome {
        context.cancellation = cancellation;
        info!("Starting pipeline with {} initial steps", self.steps.len());

        let mut cursor = self.steps.cursor();
        while cursor.move_next(&self.steps) {
            let step = match cursor.current(&self.steps) {
                Ok(step) => step.clone(),
                Err(e) => return RunOutcome::Failed(e.into()),
            };

            if context.cancellation.is_cancelled() {
                warn!("Pipeline cancelled before step: {}", step.name());
                return RunOutcome::Cancelled;
            }

            if !step.should_execute(context) {
                debug!("Skipping step: {}", step.name());
                continue;
            }

            debug!("Executing step: {}", step.name());
            let result = {
                let mut handle = PipelineHandle::new(&mut self.steps, &step);
                step.execute(context, &mut handle).await
            };

            if let Err(e) = result {
                if context.cancellation.is_cancelled() {
                    warn!("Pipeline cancelled during step {}: {:#}", step.name(), e);
                    return RunOutcome::Cancelled;
                }
                error!("Step '{}' failed: {:#}", step.name(), e);
                return RunOutcome::Failed(e);
            }

            if let Some(code) = context.exit_code {
                info!("Step '{}' requested exit with code {}", step.name(), code);
                return RunOutcome::ExitRequested(code);
            }
        }

        info!("Pipeline finished: {} steps", self.steps.len());
        RunOutcome::Completed
    }
}
