//! tpie - runs collections of HTTP requests with pre-request and post-response scripts

pub mod app;
pub mod cli;
pub mod core;
pub mod environments;
pub mod execution;
pub mod http;
pub mod reporting;
pub mod scripts;
pub mod structure;
pub mod variables;

// Re-export commonly used types
pub use app::{Application, RunReport};
pub use core::{
    ApplicationContext, CancellationToken, Pipeline, RunOutcome, RunnerConfig, Services, Step,
    StepRef, StepsCollection,
};
pub use variables::{VariableScope, VariableValue, Variables};
