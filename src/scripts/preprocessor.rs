//! Directive rewriting done before a script is compiled

use crate::scripts::{PackageHandler, ScriptError};
use crate::structure::{mirror_path, normalize_path};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static LOAD_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*#load\s+"([^"]+)"\s*$"#).expect("load pattern is valid")
});

static NUGET_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*#nuget\s+"([^"]*)"\s*$"#).expect("nuget pattern is valid")
});

/// What the pre-processor works on
#[derive(Debug, Clone, Copy)]
pub struct PreProcessInput<'a> {
    /// Source path of the script
    pub path: &'a Path,
    pub content: &'a str,
    /// Collection root
    pub root: &'a Path,
    /// Temp folder mirroring the collection
    pub temp: &'a Path,
}

/// Rewrites a script's directives before compilation.
///
/// Source paths of every script referenced through `#load` are appended to
/// `referenced` so their own preparation can be scheduled.
#[async_trait]
pub trait ScriptPreProcessor: Send + Sync {
    async fn process(
        &self,
        input: PreProcessInput<'_>,
        packages: &dyn PackageHandler,
        referenced: &mut Vec<PathBuf>,
    ) -> Result<String, ScriptError>;
}

/// Handles `#load "<path>"` and `#nuget "<name>, <version>"`.
///
/// `#load` paths are resolved against the script's folder and rewritten to
/// the referenced script's location in the temp folder. `#nuget` lines are
/// installed through the package handler and replaced by blank lines so line
/// numbers stay stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectivePreProcessor;

impl DirectivePreProcessor {
    fn resolve_reference(script: &Path, reference: &str) -> PathBuf {
        let reference = Path::new(reference);
        if reference.is_absolute() {
            normalize_path(reference)
        } else {
            let folder = script.parent().unwrap_or_else(|| Path::new(""));
            normalize_path(&folder.join(reference))
        }
    }
}

/// Split `"Name, Version"` into its parts
fn parse_package_reference(value: &str) -> Option<(&str, &str)> {
    let (name, version) = value.split_once(',')?;
    let (name, version) = (name.trim(), version.trim());
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name, version))
}

#[async_trait]
impl ScriptPreProcessor for DirectivePreProcessor {
    async fn process(
        &self,
        input: PreProcessInput<'_>,
        packages: &dyn PackageHandler,
        referenced: &mut Vec<PathBuf>,
    ) -> Result<String, ScriptError> {
        let mut output = Vec::new();

        for (index, line) in input.content.lines().enumerate() {
            if let Some(caps) = LOAD_DIRECTIVE.captures(line) {
                let source = Self::resolve_reference(input.path, &caps[1]);
                if !source.is_file() {
                    return Err(ScriptError::MissingReference {
                        path: input.path.display().to_string(),
                        reference: caps[1].to_string(),
                    });
                }

                let target = mirror_path(&source, input.root, input.temp);
                debug!("Rewriting #load {} -> {}", source.display(), target.display());
                output.push(format!("#load \"{}\"", target.display()));
                if !referenced.contains(&source) {
                    referenced.push(source);
                }
            } else if let Some(caps) = NUGET_DIRECTIVE.captures(line) {
                let (name, version) = parse_package_reference(&caps[1]).ok_or_else(|| {
                    ScriptError::InvalidDirective {
                        path: input.path.display().to_string(),
                        line: index + 1,
                        message: format!(
                            "expected \"<name>, <version>\" but found \"{}\"",
                            &caps[1]
                        ),
                    }
                })?;
                packages.fetch(name, version).await?;
                output.push(String::new());
            } else {
                output.push(line.to_string());
            }
        }

        let mut processed = output.join("\n");
        if input.content.ends_with('\n') {
            processed.push('\n');
        }
        Ok(processed)
    }
}
