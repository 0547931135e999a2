//! The line-oriented script language and its compiler
//!
//! One statement per line; blank lines and `//` comments are ignored.
//!
//! ```text
//! set user-id 42
//! set-global token "{{login-token}}"
//! capture item-id json:data.id
//! test "status is OK" status == 200
//! test "has items" json:data.items exists
//! skip-case "endpoint not deployed"
//! exit 3
//! ```

use crate::scripts::ScriptError;
use crate::variables::{is_valid_name, VariableScope};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// What an assertion or capture reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// Response status code
    Status,
    /// Raw response body
    Body,
    /// Response header, case-insensitive
    Header(String),
    /// Variable resolved through all scopes
    Variable(String),
    /// Dotted path into the JSON response body
    Json(String),
}

impl Subject {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "status" => return Some(Subject::Status),
            "body" => return Some(Subject::Body),
            _ => {}
        }
        let (kind, argument) = token.split_once(':')?;
        if argument.is_empty() {
            return None;
        }
        match kind {
            "header" => Some(Subject::Header(argument.to_string())),
            "var" => Some(Subject::Variable(argument.to_string())),
            "json" => Some(Subject::Json(argument.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Status => f.write_str("status"),
            Subject::Body => f.write_str("body"),
            Subject::Header(name) => write!(f, "header:{}", name),
            Subject::Variable(name) => write!(f, "var:{}", name),
            Subject::Json(path) => write!(f, "json:{}", path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    Contains,
    LessThan,
    GreaterThan,
    Exists,
}

impl Operator {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Operator::Equal),
            "!=" => Some(Operator::NotEqual),
            "contains" => Some(Operator::Contains),
            "<" => Some(Operator::LessThan),
            ">" => Some(Operator::GreaterThan),
            "exists" => Some(Operator::Exists),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Contains => "contains",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::Exists => "exists",
        };
        f.write_str(symbol)
    }
}

/// `<subject> <operator> [expected]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub subject: Subject,
    pub operator: Operator,
    /// Raw literal, interpolated at run time. `None` only for `exists`.
    pub expected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Set {
        scope: VariableScope,
        name: String,
        value: String,
    },
    Remove(String),
    RemovePrefix(String),
    Log(String),
    Capture {
        name: String,
        subject: Subject,
    },
    Test {
        name: String,
        assertion: Assertion,
    },
    Skip(String),
    SkipCase(String),
    Exit(i32),
}

/// A statement plus where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub source: PathBuf,
    pub line: usize,
    pub statement: Statement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A compiler message tied to a source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: PathBuf,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(
            f,
            "{}({}): {}: {}",
            self.path.display(),
            self.line,
            severity,
            self.message
        )
    }
}

/// Executable form of a script with every `#load` inlined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledScript {
    pub path: PathBuf,
    pub instructions: Vec<Instruction>,
    pub warnings: Vec<Diagnostic>,
}

/// Turns pre-processed script text into a [`CompiledScript`]
pub trait ScriptCompiler: Send + Sync {
    fn compile(&self, path: &Path, content: &str) -> Result<CompiledScript, ScriptError>;
}

/// Compiler for the line-oriented language.
///
/// All errors of a script are collected before failing. Unknown `#`
/// directives are reported as warnings and ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineScriptCompiler;

struct Unit<'a> {
    path: &'a Path,
    instructions: Vec<Instruction>,
    diagnostics: Vec<Diagnostic>,
    loading: Vec<PathBuf>,
}

impl Unit<'_> {
    fn report(&mut self, severity: Severity, path: &Path, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_path_buf(),
            line,
            message: message.into(),
        });
    }
}

impl ScriptCompiler for LineScriptCompiler {
    fn compile(&self, path: &Path, content: &str) -> Result<CompiledScript, ScriptError> {
        let mut unit = Unit {
            path,
            instructions: Vec::new(),
            diagnostics: Vec::new(),
            loading: vec![path.to_path_buf()],
        };
        compile_source(&mut unit, path, content);

        let (errors, warnings): (Vec<_>, Vec<_>) = unit
            .diagnostics
            .into_iter()
            .partition(|d| d.severity == Severity::Error);

        for warning in &warnings {
            warn!("{}", warning);
        }
        if !errors.is_empty() {
            for e in &errors {
                error!("{}", e);
            }
            return Err(ScriptError::Compilation {
                path: unit.path.display().to_string(),
                errors: errors.iter().map(ToString::to_string).collect(),
            });
        }

        Ok(CompiledScript {
            path: path.to_path_buf(),
            instructions: unit.instructions,
            warnings,
        })
    }
}

fn compile_source(unit: &mut Unit<'_>, source: &Path, content: &str) {
    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with("//") {
            continue;
        }

        if let Some(directive) = text.strip_prefix('#') {
            compile_directive(unit, source, line, directive);
            continue;
        }

        match parse_statement(text) {
            Ok(statement) => unit.instructions.push(Instruction {
                source: source.to_path_buf(),
                line,
                statement,
            }),
            Err(message) => unit.report(Severity::Error, source, line, message),
        }
    }
}

fn compile_directive(unit: &mut Unit<'_>, source: &Path, line: usize, directive: &str) {
    let (keyword, rest) = split_word(directive);
    if keyword != "load" {
        unit.report(
            Severity::Warning,
            source,
            line,
            format!("unknown directive '#{}' ignored", keyword),
        );
        return;
    }

    let Some((target, trailing)) = parse_quoted(rest) else {
        unit.report(Severity::Error, source, line, "#load expects a quoted path");
        return;
    };
    if !trailing.trim().is_empty() {
        unit.report(Severity::Error, source, line, "unexpected text after #load path");
        return;
    }

    let target = PathBuf::from(target);
    if unit.loading.contains(&target) {
        unit.report(
            Severity::Error,
            source,
            line,
            format!("circular #load of '{}'", target.display()),
        );
        return;
    }

    match std::fs::read_to_string(&target) {
        Ok(content) => {
            unit.loading.push(target.clone());
            compile_source(unit, &target, &content);
            unit.loading.pop();
        }
        Err(e) => unit.report(
            Severity::Error,
            source,
            line,
            format!("cannot load '{}': {}", target.display(), e),
        ),
    }
}

fn parse_statement(text: &str) -> Result<Statement, String> {
    let (command, rest) = split_word(text);
    let set_scope = match command {
        "set" => Some(VariableScope::Scope),
        "set-global" => Some(VariableScope::Global),
        "set-environment" => Some(VariableScope::Environment),
        "set-collection" => Some(VariableScope::Collection),
        "set-testcase" => Some(VariableScope::TestCase),
        _ => None,
    };
    if let Some(scope) = set_scope {
        let (name, value) = split_word(rest);
        let name = variable_name(name)?;
        if value.trim().is_empty() {
            return Err(format!("'{}' expects a value for '{}'", command, name));
        }
        return Ok(Statement::Set {
            scope,
            name,
            value: value.trim().to_string(),
        });
    }

    match command {
        "remove" => Ok(Statement::Remove(variable_name(rest.trim())?)),
        "remove-prefix" => {
            let prefix = rest.trim();
            if prefix.is_empty() {
                return Err("'remove-prefix' expects a prefix".to_string());
            }
            Ok(Statement::RemovePrefix(prefix.to_string()))
        }
        "log" => Ok(Statement::Log(unquote(rest))),
        "capture" => {
            let (name, subject) = split_word(rest);
            let name = variable_name(name)?;
            let subject = Subject::parse(subject.trim())
                .ok_or_else(|| format!("unknown subject '{}'", subject.trim()))?;
            Ok(Statement::Capture { name, subject })
        }
        "test" => {
            let (name, rest) =
                parse_quoted(rest).ok_or_else(|| "'test' expects a quoted name".to_string())?;
            Ok(Statement::Test {
                name,
                assertion: parse_assertion(rest)?,
            })
        }
        "skip" => {
            let (name, _) =
                parse_quoted(rest).ok_or_else(|| "'skip' expects a quoted name".to_string())?;
            Ok(Statement::Skip(name))
        }
        "skip-case" => Ok(Statement::SkipCase(unquote(rest))),
        "exit" => rest
            .trim()
            .parse::<i32>()
            .map(Statement::Exit)
            .map_err(|_| format!("'exit' expects an integer code, found '{}'", rest.trim())),
        other => Err(format!("unknown statement '{}'", other)),
    }
}

fn parse_assertion(text: &str) -> Result<Assertion, String> {
    let (subject, rest) = split_word(text);
    let subject =
        Subject::parse(subject).ok_or_else(|| format!("unknown subject '{}'", subject))?;
    let (operator, expected) = split_word(rest);
    let operator =
        Operator::parse(operator).ok_or_else(|| format!("unknown operator '{}'", operator))?;
    let expected = expected.trim();

    let expected = match (operator, expected.is_empty()) {
        (Operator::Exists, true) => None,
        (Operator::Exists, false) => return Err("'exists' takes no value".to_string()),
        (_, true) => return Err(format!("'{}' expects a value", operator)),
        (_, false) => Some(expected.to_string()),
    };

    Ok(Assertion {
        subject,
        operator,
        expected,
    })
}

fn variable_name(name: &str) -> Result<String, String> {
    if is_valid_name(name) {
        Ok(name.to_string())
    } else {
        Err(format!("invalid variable name '{}'", name))
    }
}

/// First whitespace-delimited word and the remainder
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], &text[end..]),
        None => (text, ""),
    }
}

/// A leading `"..."` and the remainder
fn parse_quoted(text: &str) -> Option<(String, &str)> {
    let text = text.trim_start().strip_prefix('"')?;
    let end = text.find('"')?;
    Some((text[..end].to_string(), &text[end + 1..]))
}

fn unquote(text: &str) -> String {
    let text = text.trim();
    match parse_quoted(text) {
        Some((inner, rest)) if rest.is_empty() => inner,
        _ => text.to_string(),
    }
}
