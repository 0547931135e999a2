//! Core pipeline machinery
//!
//! This module defines the step abstraction, the self-extending steps
//! collection, the pipeline runner and the context shared by every step.

pub mod cancellation;
pub mod config;
pub mod context;
pub mod pipeline;
pub mod services;
pub mod step;
pub mod steps;

pub use cancellation::CancellationToken;
pub use config::RunnerConfig;
pub use context::*;
pub use pipeline::*;
pub use services::Services;
pub use step::*;
pub use steps::{StepsCollection, StepsCursor, StepsError};
