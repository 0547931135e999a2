//! Environment initialization and selection steps

use crate::core::{ApplicationContext, PipelineHandle, Step};
use crate::environments::{load_environments, EnvironmentError, DEFAULT_ENVIRONMENT_NAME};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Loads the environment file, applies the default environment to Global scope
/// and schedules [`SetEnvironmentStep`] right after itself
#[derive(Debug, Default)]
pub struct InitializeEnvironmentsStep;

#[async_trait]
impl Step for InitializeEnvironmentsStep {
    fn name(&self) -> String {
        "InitializeEnvironments".to_string()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let Some(path) = context.environment_file.clone() else {
            debug!("No environment file found, skipping environment setup");
            return Ok(());
        };

        let environments = load_environments(&path)
            .await
            .with_context(|| format!("Failed to load environments from '{}'", path.display()))?;

        for environment in environments {
            context.environments.register_environment(environment)?;
        }
        info!(
            "Registered environments: {}",
            context.environments.names().join(", ")
        );

        match context
            .environments
            .try_get_environment(DEFAULT_ENVIRONMENT_NAME)
        {
            Some(default) => default.apply(&mut context.variables.global)?,
            None => warn!(
                "Environment file '{}' has no '{}' environment",
                path.display(),
                DEFAULT_ENVIRONMENT_NAME
            ),
        }

        pipeline.insert_after_current(vec![Arc::new(SetEnvironmentStep)])?;
        Ok(())
    }
}

/// Applies the selected environment to Environment scope
#[derive(Debug, Default)]
pub struct SetEnvironmentStep;

#[async_trait]
impl Step for SetEnvironmentStep {
    fn name(&self) -> String {
        "SetEnvironment".to_string()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let (name, selected) = match &context.environment_name {
            Some(name) => (name.clone(), true),
            None => (DEFAULT_ENVIRONMENT_NAME.to_string(), false),
        };

        let Some(environment) = context.environments.try_get_environment(&name) else {
            if selected {
                return Err(EnvironmentError::NotFound(name).into());
            }
            // already warned about when the file was loaded
            debug!("No environment selected and no '{}' environment defined", name);
            return Ok(());
        };

        environment.apply(&mut context.variables.environment)?;
        info!("Environment '{}' is active", name);
        Ok(())
    }
}
