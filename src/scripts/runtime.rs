//! Executes compiled scripts

use crate::core::CancellationToken;
use crate::http::{HttpRequest, HttpResponse};
use crate::reporting::TestResult;
use crate::scripts::{
    Assertion, CompiledScript, Instruction, Operator, ScriptError, Statement, Subject,
};
use crate::variables::{VariableError, VariableValue, Variables};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Instant;
use tracing::{debug, info};

/// What a script can see and change
pub struct ScriptGlobals<'a> {
    pub variables: &'a mut Variables,
    pub request: Option<&'a HttpRequest>,
    pub response: Option<&'a HttpResponse>,
    /// Where `test` and `skip` statements record their results
    pub tests: &'a mut Vec<TestResult>,
    /// Set by `skip-case`
    pub skip_reason: Option<String>,
    /// Set by `exit`; stops the script and the run
    pub exit_code: Option<i32>,
}

impl<'a> ScriptGlobals<'a> {
    pub fn new(variables: &'a mut Variables, tests: &'a mut Vec<TestResult>) -> Self {
        Self {
            variables,
            request: None,
            response: None,
            tests,
            skip_reason: None,
            exit_code: None,
        }
    }

    pub fn with_exchange(
        mut self,
        request: Option<&'a HttpRequest>,
        response: Option<&'a HttpResponse>,
    ) -> Self {
        self.request = request;
        self.response = response;
        self
    }
}

/// Runs a compiled script against its globals
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn run(
        &self,
        script: &CompiledScript,
        globals: &mut ScriptGlobals<'_>,
        cancellation: &CancellationToken,
    ) -> Result<(), ScriptError>;
}

/// Interpreter for [`CompiledScript`] instructions
#[derive(Debug, Clone, Copy, Default)]
pub struct LineScriptExecutor;

#[async_trait]
impl ScriptExecutor for LineScriptExecutor {
    async fn run(
        &self,
        script: &CompiledScript,
        globals: &mut ScriptGlobals<'_>,
        cancellation: &CancellationToken,
    ) -> Result<(), ScriptError> {
        debug!(
            "Running {} ({} instructions)",
            script.path.display(),
            script.instructions.len()
        );

        for instruction in &script.instructions {
            if cancellation.is_cancelled() {
                return Err(ScriptError::Cancelled);
            }
            execute_instruction(instruction, globals)?;
            if globals.exit_code.is_some() {
                break;
            }
        }
        Ok(())
    }
}

fn execute_instruction(
    instruction: &Instruction,
    globals: &mut ScriptGlobals<'_>,
) -> Result<(), ScriptError> {
    let fail = |message: String| ScriptError::Execution {
        path: instruction.source.display().to_string(),
        line: instruction.line,
        message,
    };
    let variable_error = |e: VariableError| fail(e.to_string());

    match &instruction.statement {
        Statement::Set { scope, name, value } => {
            let value = resolve_literal(&*globals.variables, value);
            globals
                .variables
                .scope_mut(*scope)
                .set(name, value)
                .map_err(variable_error)?;
        }
        Statement::Remove(name) => {
            globals
                .variables
                .remove_variable(name)
                .map_err(variable_error)?;
        }
        Statement::RemovePrefix(prefix) => {
            globals.variables.remove_variables(prefix);
        }
        Statement::Log(message) => {
            info!(target: "script", "{}", globals.variables.interpolate(message));
        }
        Statement::Capture { name, subject } => {
            let value = resolve_subject(subject, globals)
                .map_err(&fail)?
                .ok_or_else(|| fail(format!("nothing to capture from {}", subject)))?;
            globals.variables.set_variable(name, value).map_err(variable_error)?;
        }
        Statement::Test { name, assertion } => {
            let started = Instant::now();
            let result = match evaluate(assertion, globals) {
                Ok(()) => TestResult::passed(name.as_str(), started.elapsed()),
                Err(message) => TestResult::failed(name.as_str(), message, started.elapsed()),
            };
            globals.tests.push(result);
        }
        Statement::Skip(name) => globals.tests.push(TestResult::skipped(name.as_str())),
        Statement::SkipCase(reason) => {
            globals.skip_reason = Some(globals.variables.interpolate(reason));
        }
        Statement::Exit(code) => globals.exit_code = Some(*code),
    }
    Ok(())
}

/// Quoted literals stay strings; anything else is re-typed after interpolation
fn resolve_literal(variables: &Variables, raw: &str) -> VariableValue {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        VariableValue::String(variables.interpolate(&raw[1..raw.len() - 1]))
    } else {
        VariableValue::parse_literal(&variables.interpolate(raw))
    }
}

fn resolve_subject(
    subject: &Subject,
    globals: &ScriptGlobals<'_>,
) -> Result<Option<VariableValue>, String> {
    if let Subject::Variable(name) = subject {
        return match globals.variables.get_variable::<VariableValue>(name) {
            Ok(value) => Ok(Some(value)),
            Err(VariableError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.to_string()),
        };
    }

    let response = globals
        .response
        .ok_or_else(|| format!("{} needs a response but none is available", subject))?;

    match subject {
        Subject::Status => Ok(Some(VariableValue::Int(i32::from(response.status)))),
        Subject::Body => Ok(Some(VariableValue::String(response.body.clone()))),
        Subject::Header(name) => Ok(response
            .header(name)
            .map(|value| VariableValue::String(value.to_string()))),
        Subject::Json(path) => {
            let document: JsonValue = serde_json::from_str(&response.body)
                .map_err(|e| format!("response body is not JSON: {}", e))?;
            Ok(json_path(&document, path).map(VariableValue::from_json))
        }
        Subject::Variable(_) => Ok(None),
    }
}

/// Walk a dotted path; numeric segments index arrays. `$` is the root.
fn json_path<'a>(document: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.strip_prefix('$').unwrap_or(path);
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(document, |node, segment| match node {
            JsonValue::Object(map) => map.get(segment),
            JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn as_number(value: &VariableValue) -> Option<f64> {
    match value {
        VariableValue::Int(i) => Some(f64::from(*i)),
        VariableValue::Long(l) => Some(*l as f64),
        VariableValue::Decimal(d) => Some(*d),
        VariableValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn values_equal(actual: &VariableValue, expected: &VariableValue) -> bool {
    match (as_number(actual), as_number(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => actual.to_string() == expected.to_string(),
    }
}

fn evaluate(assertion: &Assertion, globals: &ScriptGlobals<'_>) -> Result<(), String> {
    let actual = resolve_subject(&assertion.subject, globals)?;
    if assertion.operator == Operator::Exists {
        return match actual {
            Some(_) => Ok(()),
            None => Err(format!("expected {} to exist", assertion.subject)),
        };
    }

    let expected = assertion
        .expected
        .as_deref()
        .map(|raw| resolve_literal(&*globals.variables, raw))
        .unwrap_or(VariableValue::Null);
    let Some(actual) = actual else {
        return Err(format!("{} does not exist", assertion.subject));
    };

    let passed = match assertion.operator {
        Operator::Equal => values_equal(&actual, &expected),
        Operator::NotEqual => !values_equal(&actual, &expected),
        Operator::Contains => actual.to_string().contains(&expected.to_string()),
        Operator::LessThan | Operator::GreaterThan => {
            let (Some(a), Some(b)) = (as_number(&actual), as_number(&expected)) else {
                return Err(format!(
                    "cannot compare '{}' and '{}' numerically",
                    actual, expected
                ));
            };
            if assertion.operator == Operator::LessThan {
                a < b
            } else {
                a > b
            }
        }
        Operator::Exists => true,
    };

    if passed {
        Ok(())
    } else {
        Err(format!(
            "expected {} {} '{}' but was '{}'",
            assertion.subject, assertion.operator, expected, actual
        ))
    }
}
