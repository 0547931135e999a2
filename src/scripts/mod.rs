//! User scripts: directive pre-processing, compilation and execution
//!
//! Scripts are plain text, one statement per line. Before compilation the
//! pre-processor rewrites `#load` directives to point into the temp folder and
//! resolves `#nuget` directives through the package handler.

pub mod language;
pub mod packages;
pub mod preprocessor;
pub mod runtime;
pub mod steps;

pub use language::{
    Assertion, CompiledScript, Diagnostic, Instruction, LineScriptCompiler, Operator,
    ScriptCompiler, Severity, Statement, Subject,
};
pub use packages::{NuGetPackageHandler, PackageError, PackageHandler};
pub use preprocessor::{DirectivePreProcessor, PreProcessInput, ScriptPreProcessor};
pub use runtime::{LineScriptExecutor, ScriptExecutor, ScriptGlobals};
pub use steps::{
    preparation_chain, script_chain, CompileScriptStep, ExecuteScriptStep, PreProcessScriptStep,
    ReadScriptFileStep, SaveTempScriptStep,
};

use crate::variables::VariableError;
use thiserror::Error;

/// Errors raised while preparing or running scripts
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Script '{}' failed to compile with {} error(s): {}", .path, .errors.len(), .errors.join("; "))]
    Compilation { path: String, errors: Vec<String> },

    #[error("Invalid directive in '{path}' at line {line}: {message}")]
    InvalidDirective {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Script '{path}' references missing file '{reference}'")]
    MissingReference { path: String, reference: String },

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error("Script '{path}' failed at line {line}: {message}")]
    Execution {
        path: String,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Variable(#[from] VariableError),

    #[error("Script execution was cancelled")]
    Cancelled,
}
