//! Tagged variable values and typed conversions

use chrono::{DateTime, FixedOffset};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A variable value as stored in any scope
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    Null,
    String(String),
    Bool(bool),
    Int(i32),
    Long(i64),
    Decimal(f64),
    DateTime(DateTime<FixedOffset>),
    Guid(Uuid),
    List(Vec<VariableValue>),
    Object(BTreeMap<String, VariableValue>),
}

impl VariableValue {
    /// Short name of the variant, used in type mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            VariableValue::Null => "null",
            VariableValue::String(_) => "string",
            VariableValue::Bool(_) => "bool",
            VariableValue::Int(_) => "int",
            VariableValue::Long(_) => "long",
            VariableValue::Decimal(_) => "decimal",
            VariableValue::DateTime(_) => "datetime",
            VariableValue::Guid(_) => "guid",
            VariableValue::List(_) => "list",
            VariableValue::Object(_) => "object",
        }
    }

    /// Build a value from JSON, picking the narrowest numeric tier that fits
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => VariableValue::Null,
            JsonValue::Bool(b) => VariableValue::Bool(*b),
            JsonValue::String(s) => VariableValue::String(s.clone()),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(int) => VariableValue::Int(int),
                        Err(_) => VariableValue::Long(i),
                    }
                } else if n.is_u64() {
                    // beyond i64: keep the exact digits rather than rounding to f64
                    VariableValue::String(n.to_string())
                } else {
                    VariableValue::Decimal(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::Array(items) => {
                VariableValue::List(items.iter().map(Self::from_json).collect())
            }
            JsonValue::Object(map) => VariableValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back to JSON
    pub fn to_json(&self) -> JsonValue {
        match self {
            VariableValue::Null => JsonValue::Null,
            VariableValue::String(s) => JsonValue::String(s.clone()),
            VariableValue::Bool(b) => JsonValue::Bool(*b),
            VariableValue::Int(i) => JsonValue::from(*i),
            VariableValue::Long(l) => JsonValue::from(*l),
            VariableValue::Decimal(d) => serde_json::Number::from_f64(*d)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            VariableValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
            VariableValue::Guid(g) => JsonValue::String(g.to_string()),
            VariableValue::List(items) => {
                JsonValue::Array(items.iter().map(Self::to_json).collect())
            }
            VariableValue::Object(map) => JsonValue::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Parse a literal as written in scripts.
    ///
    /// Quoted text is a string, then `null`, booleans, integers and decimals are
    /// recognised; anything else is kept as a bare string.
    pub fn parse_literal(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
            return VariableValue::String(raw[1..raw.len() - 1].to_string());
        }
        match raw {
            "null" => return VariableValue::Null,
            "true" => return VariableValue::Bool(true),
            "false" => return VariableValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = raw.parse::<i64>() {
            return match i32::try_from(i) {
                Ok(int) => VariableValue::Int(int),
                Err(_) => VariableValue::Long(i),
            };
        }
        if let Ok(d) = raw.parse::<f64>() {
            if d.is_finite() {
                return VariableValue::Decimal(d);
            }
        }
        VariableValue::String(raw.to_string())
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Null => Ok(()),
            VariableValue::String(s) => f.write_str(s),
            VariableValue::Bool(b) => write!(f, "{}", b),
            VariableValue::Int(i) => write!(f, "{}", i),
            VariableValue::Long(l) => write!(f, "{}", l),
            VariableValue::Decimal(d) => write!(f, "{}", d),
            VariableValue::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            VariableValue::Guid(g) => write!(f, "{}", g),
            VariableValue::List(_) | VariableValue::Object(_) => {
                write!(f, "{}", self.to_json())
            }
        }
    }
}

/// Typed extraction of a stored value
pub trait FromVariable: Sized {
    /// Name of the target type, used in error messages
    const TYPE_NAME: &'static str;

    fn from_variable(value: &VariableValue) -> Option<Self>;
}

impl FromVariable for VariableValue {
    const TYPE_NAME: &'static str = "value";

    fn from_variable(value: &VariableValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromVariable for String {
    const TYPE_NAME: &'static str = "string";

    fn from_variable(value: &VariableValue) -> Option<Self> {
        match value {
            VariableValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromVariable for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_variable(value: &VariableValue) -> Option<Self> {
        match value {
            VariableValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromVariable for i32 {
    const TYPE_NAME: &'static str = "int";

    fn from_variable(value: &VariableValue) -> Option<Self> {
        match value {
            VariableValue::Int(i) => Some(*i),
            VariableValue::Long(l) => i32::try_from(*l).ok(),
            _ => None,
        }
    }
}

impl FromVariable for i64 {
    const TYPE_NAME: &'static str = "long";

    fn from_variable(value: &VariableValue) -> Option<Self> {
        match value {
            VariableValue::Int(i) => Some(i64::from(*i)),
            VariableValue::Long(l) => Some(*l),
            _ => None,
        }
    }
}

impl FromVariable for f64 {
    const TYPE_NAME: &'static str = "decimal";

    fn from_variable(value: &VariableValue) -> Option<Self> {
        match value {
            VariableValue::Int(i) => Some(f64::from(*i)),
            VariableValue::Long(l) => Some(*l as f64),
            VariableValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromVariable for DateTime<FixedOffset> {
    const TYPE_NAME: &'static str = "datetime";

    fn from_variable(value: &VariableValue) -> Option<Self> {
        match value {
            VariableValue::DateTime(dt) => Some(*dt),
            VariableValue::String(s) => DateTime::parse_from_rfc3339(s).ok(),
            _ => None,
        }
    }
}

impl FromVariable for Uuid {
    const TYPE_NAME: &'static str = "guid";

    fn from_variable(value: &VariableValue) -> Option<Self> {
        match value {
            VariableValue::Guid(g) => Some(*g),
            VariableValue::String(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }
}

impl FromVariable for Vec<VariableValue> {
    const TYPE_NAME: &'static str = "list";

    fn from_variable(value: &VariableValue) -> Option<Self> {
        match value {
            VariableValue::List(items) => Some(items.clone()),
            _ => None,
        }
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::String(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::String(value)
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        VariableValue::Bool(value)
    }
}

impl From<i32> for VariableValue {
    fn from(value: i32) -> Self {
        VariableValue::Int(value)
    }
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        VariableValue::Long(value)
    }
}

impl From<f64> for VariableValue {
    fn from(value: f64) -> Self {
        VariableValue::Decimal(value)
    }
}

impl From<DateTime<FixedOffset>> for VariableValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        VariableValue::DateTime(value)
    }
}

impl From<Uuid> for VariableValue {
    fn from(value: Uuid) -> Self {
        VariableValue::Guid(value)
    }
}

impl From<Vec<VariableValue>> for VariableValue {
    fn from(value: Vec<VariableValue>) -> Self {
        VariableValue::List(value)
    }
}

impl From<&JsonValue> for VariableValue {
    fn from(value: &JsonValue) -> Self {
        VariableValue::from_json(value)
    }
}
