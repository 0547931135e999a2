//! A single named variable store

use crate::variables::{value::FromVariable, VariableError, VariableValue};
use std::collections::HashMap;

/// Whether `key` is a legal variable name: ASCII letters, digits and hyphens
pub fn is_valid_name(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

pub(crate) fn validate_name(key: &str) -> Result<(), VariableError> {
    if is_valid_name(key) {
        Ok(())
    } else {
        Err(VariableError::InvalidName(key.to_string()))
    }
}

/// Key/value store for one variable scope
#[derive(Debug, Clone, Default)]
pub struct VariablesCollection {
    name: String,
    values: HashMap<String, VariableValue>,
}

impl VariablesCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Store a value, replacing any previous value under the same key
    pub fn set(&mut self, key: &str, value: impl Into<VariableValue>) -> Result<(), VariableError> {
        validate_name(key)?;
        self.values.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Typed lookup: `Ok(None)` when absent, an error when the stored value
    /// cannot be read as `T`
    pub fn get<T: FromVariable>(&self, key: &str) -> Result<Option<T>, VariableError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => T::from_variable(value).map(Some).ok_or_else(|| {
                VariableError::TypeMismatch {
                    name: key.to_string(),
                    expected: T::TYPE_NAME,
                    actual: value.type_name(),
                }
            }),
        }
    }

    /// Typed lookup falling back to `default` when the key is absent
    pub fn get_or<T: FromVariable>(&self, key: &str, default: T) -> Result<T, VariableError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Raw stored value
    pub fn value(&self, key: &str) -> Option<&VariableValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove one key. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> Result<bool, VariableError> {
        validate_name(key)?;
        Ok(self.values.remove(key).is_some())
    }

    /// Remove every key starting with `prefix`. Returns whether anything was removed.
    pub fn remove_variables(&mut self, prefix: &str) -> bool {
        let before = self.values.len();
        self.values.retain(|key, _| !key.starts_with(prefix));
        self.values.len() != before
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Keys in sorted order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
