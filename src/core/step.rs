//! Step domain model

use crate::core::{context::ApplicationContext, steps::{StepsCollection, StepsError}};
use async_trait::async_trait;
use std::sync::Arc;

/// A shared reference to a pipeline step.
///
/// Steps are compared by identity (the allocation they live in), never by value,
/// so the same step type may appear many times in one pipeline.
pub type StepRef = Arc<dyn Step>;

/// A single unit of work in a pipeline
#[async_trait]
pub trait Step: Send + Sync {
    /// Human-readable name used in logs
    fn name(&self) -> String;

    /// Whether the step should run against the current context.
    ///
    /// Returning `false` skips the step without removing it from the pipeline.
    fn should_execute(&self, _context: &ApplicationContext) -> bool {
        true
    }

    /// Execute the step.
    ///
    /// The handle lets the step splice further steps into the running pipeline,
    /// typically right after itself.
    async fn execute(
        &self,
        context: &mut ApplicationContext,
        pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()>;
}

/// Identity key of a step reference
pub(crate) fn step_key(step: &StepRef) -> usize {
    Arc::as_ptr(step) as *const () as usize
}

/// Whether two step references point at the same step
pub fn same_step(a: &StepRef, b: &StepRef) -> bool {
    step_key(a) == step_key(b)
}

/// Mutable view of the running pipeline handed to the executing step
pub struct PipelineHandle<'a> {
    steps: &'a mut StepsCollection,
    current: &'a StepRef,
}

impl<'a> PipelineHandle<'a> {
    pub fn new(steps: &'a mut StepsCollection, current: &'a StepRef) -> Self {
        Self { steps, current }
    }

    /// The step currently being executed
    pub fn current(&self) -> &StepRef {
        self.current
    }

    /// Insert steps, in order, immediately after the executing step
    pub fn insert_after_current(&mut self, steps: Vec<StepRef>) -> Result<(), StepsError> {
        self.steps.insert_range(self.current, steps)
    }

    /// Insert steps, in order, immediately after `predecessor`
    pub fn insert(&mut self, predecessor: &StepRef, steps: Vec<StepRef>) -> Result<(), StepsError> {
        self.steps.insert_range(predecessor, steps)
    }

    /// Append steps at the tail of the pipeline
    pub fn add(&mut self, steps: Vec<StepRef>) -> Result<(), StepsError> {
        self.steps.add_range(steps)
    }
}
