//! Named environments loaded from a JSON file

pub mod steps;

pub use steps::{InitializeEnvironmentsStep, SetEnvironmentStep};

use crate::variables::{VariableError, VariableValue, VariablesCollection};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Reserved name of the environment applied to Global scope at startup
pub const DEFAULT_ENVIRONMENT_NAME: &str = "$shared";

/// Errors raised while loading or applying environments
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("Environment file '{0}' does not exist")]
    FileNotFound(String),

    #[error("Failed to read environment file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid environment file: {0}")]
    Invalid(String),

    #[error("Environment '{0}' is already registered")]
    Duplicate(String),

    #[error("Environment '{0}' was not found")]
    NotFound(String),

    #[error(transparent)]
    Variable(#[from] VariableError),
}

/// A named, immutable set of variables
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    name: String,
    variables: Vec<(String, VariableValue)>,
}

impl Environment {
    pub fn new(name: impl Into<String>, variables: Vec<(String, VariableValue)>) -> Self {
        Self {
            name: name.into(),
            variables,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[(String, VariableValue)] {
        &self.variables
    }

    /// Copy every variable into `target`, overwriting existing keys
    pub fn apply(&self, target: &mut VariablesCollection) -> Result<(), VariableError> {
        for (key, value) in &self.variables {
            target.set(key, value.clone())?;
        }
        Ok(())
    }
}

/// All environments known to a run, keyed by name
#[derive(Debug, Clone, Default)]
pub struct EnvironmentsRegistry {
    environments: HashMap<String, Environment>,
}

impl EnvironmentsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_environment(&mut self, environment: Environment) -> Result<(), EnvironmentError> {
        if self.environments.contains_key(environment.name()) {
            return Err(EnvironmentError::Duplicate(environment.name().to_string()));
        }
        self.environments
            .insert(environment.name().to_string(), environment);
        Ok(())
    }

    pub fn try_get_environment(&self, name: &str) -> Option<&Environment> {
        self.environments.get(name)
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.environments.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Parse an environment file: a JSON object whose members are objects of variables
pub fn parse_environments(json: &str) -> Result<Vec<Environment>, EnvironmentError> {
    let root: JsonValue =
        serde_json::from_str(json).map_err(|e| EnvironmentError::Invalid(e.to_string()))?;

    let JsonValue::Object(entries) = root else {
        return Err(EnvironmentError::Invalid(
            "top level must be an object of environments".to_string(),
        ));
    };

    entries
        .iter()
        .map(|(name, body)| {
            let JsonValue::Object(variables) = body else {
                return Err(EnvironmentError::Invalid(format!(
                    "environment '{}' must be an object",
                    name
                )));
            };
            let variables = variables
                .iter()
                .map(|(key, value)| (key.clone(), VariableValue::from_json(value)))
                .collect();
            Ok(Environment::new(name.clone(), variables))
        })
        .collect()
}

/// Read and parse an environment file
pub async fn load_environments(path: &Path) -> Result<Vec<Environment>, EnvironmentError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| EnvironmentError::Read {
            path: path.display().to_string(),
            source,
        })?;
    parse_environments(&content)
}
