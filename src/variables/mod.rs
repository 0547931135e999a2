//! Layered variable scopes
//!
//! Five independent stores are searched narrowest first:
//! TestCase → Scope → Collection → Environment → Global.
//! Scripts write through [`Variables::set_variable`], which always targets the
//! Scope layer.

pub mod collection;
pub mod value;

pub use collection::{is_valid_name, VariablesCollection};
pub use value::{FromVariable, VariableValue};

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors raised by variable stores
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VariableError {
    #[error("Invalid variable name '{0}': only letters, digits and '-' are allowed")]
    InvalidName(String),

    #[error("Variable '{0}' was not found in any scope")]
    NotFound(String),

    #[error("Variable '{name}' holds a {actual} value, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// One of the five variable layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableScope {
    Global,
    Environment,
    Collection,
    Scope,
    TestCase,
}

impl VariableScope {
    /// Scopes in lookup order, narrowest first
    pub const RESOLUTION_ORDER: [VariableScope; 5] = [
        VariableScope::TestCase,
        VariableScope::Scope,
        VariableScope::Collection,
        VariableScope::Environment,
        VariableScope::Global,
    ];
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9-]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// All five scopes plus the resolution rules over them
#[derive(Debug, Clone)]
pub struct Variables {
    pub global: VariablesCollection,
    pub environment: VariablesCollection,
    pub collection: VariablesCollection,
    pub scope: VariablesCollection,
    pub test_case: VariablesCollection,
}

impl Default for Variables {
    fn default() -> Self {
        Self::new()
    }
}

impl Variables {
    pub fn new() -> Self {
        Self {
            global: VariablesCollection::new("GlobalVariables"),
            environment: VariablesCollection::new("EnvironmentVariables"),
            collection: VariablesCollection::new("CollectionVariables"),
            scope: VariablesCollection::new("ScopeVariables"),
            test_case: VariablesCollection::new("TestCaseVariables"),
        }
    }

    pub fn scope(&self, scope: VariableScope) -> &VariablesCollection {
        match scope {
            VariableScope::Global => &self.global,
            VariableScope::Environment => &self.environment,
            VariableScope::Collection => &self.collection,
            VariableScope::Scope => &self.scope,
            VariableScope::TestCase => &self.test_case,
        }
    }

    pub fn scope_mut(&mut self, scope: VariableScope) -> &mut VariablesCollection {
        match scope {
            VariableScope::Global => &mut self.global,
            VariableScope::Environment => &mut self.environment,
            VariableScope::Collection => &mut self.collection,
            VariableScope::Scope => &mut self.scope,
            VariableScope::TestCase => &mut self.test_case,
        }
    }

    /// The narrowest scope holding `name`, if any
    pub fn find_scope(&self, name: &str) -> Option<VariableScope> {
        VariableScope::RESOLUTION_ORDER
            .into_iter()
            .find(|scope| self.scope(*scope).contains(name))
    }

    pub fn contains_variable(&self, name: &str) -> bool {
        self.find_scope(name).is_some()
    }

    /// Resolve `name` through all scopes; absent everywhere is `NotFound`
    pub fn get_variable<T: FromVariable>(&self, name: &str) -> Result<T, VariableError> {
        let scope = self
            .find_scope(name)
            .ok_or_else(|| VariableError::NotFound(name.to_string()))?;
        self.scope(scope)
            .get(name)?
            .ok_or_else(|| VariableError::NotFound(name.to_string()))
    }

    /// Resolve `name` through all scopes, returning `default` when absent everywhere
    pub fn get_variable_or<T: FromVariable>(&self, name: &str, default: T) -> Result<T, VariableError> {
        match self.get_variable(name) {
            Err(VariableError::NotFound(_)) => Ok(default),
            other => other,
        }
    }

    /// Set a variable in the Scope layer
    pub fn set_variable(&mut self, name: &str, value: impl Into<VariableValue>) -> Result<(), VariableError> {
        self.scope.set(name, value)
    }

    /// Remove `name` from the narrowest scope holding it, so a wider value
    /// shows through again. Returns whether any scope held it.
    pub fn remove_variable(&mut self, name: &str) -> Result<bool, VariableError> {
        collection::validate_name(name)?;
        match self.find_scope(name) {
            Some(scope) => self.scope_mut(scope).remove(name),
            None => Ok(false),
        }
    }

    /// Remove every key starting with `prefix` from every scope.
    /// Returns whether at least one scope removed something.
    pub fn remove_variables(&mut self, prefix: &str) -> bool {
        let mut removed = false;
        for scope in VariableScope::RESOLUTION_ORDER {
            removed |= self.scope_mut(scope).remove_variables(prefix);
        }
        removed
    }

    /// Replace `{{name}}` placeholders with resolved values.
    /// Unknown names are left as written.
    pub fn interpolate(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &regex::Captures<'_>| {
                match self.get_variable::<VariableValue>(&caps[1]) {
                    Ok(value) => value.to_string(),
                    Err(_) => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
