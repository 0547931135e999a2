//! Script chain steps: read → pre-process → save → compile → execute

use crate::core::{ApplicationContext, PipelineHandle, Step, StepRef, TestCaseExecution};
use crate::reporting::TestCaseResult;
use crate::scripts::{PreProcessInput, ScriptGlobals};
use crate::structure::relative_to;
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Full chain that prepares and runs `path`
pub fn script_chain(path: &Path) -> Vec<StepRef> {
    let mut chain = preparation_chain(path);
    chain.push(Arc::new(CompileScriptStep::new(path)));
    chain.push(Arc::new(ExecuteScriptStep::new(path)));
    chain
}

/// Steps that leave a rewritten copy of `path` in the temp folder
pub fn preparation_chain(path: &Path) -> Vec<StepRef> {
    vec![
        Arc::new(ReadScriptFileStep::new(path)),
        Arc::new(PreProcessScriptStep::new(path)),
        Arc::new(SaveTempScriptStep::new(path)),
    ]
}

/// Reads the script source
#[derive(Debug)]
pub struct ReadScriptFileStep {
    path: PathBuf,
}

impl ReadScriptFileStep {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Step for ReadScriptFileStep {
    fn name(&self) -> String {
        format!("ReadScriptFile({})", self.path.display())
    }

    fn should_execute(&self, context: &ApplicationContext) -> bool {
        !context.is_current_test_case_skipped()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read script '{}'", self.path.display()))?;
        context.script_state(&self.path).raw = Some(raw);
        Ok(())
    }
}

/// Rewrites directives and schedules preparation of referenced scripts
#[derive(Debug)]
pub struct PreProcessScriptStep {
    path: PathBuf,
}

impl PreProcessScriptStep {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Step for PreProcessScriptStep {
    fn name(&self) -> String {
        format!("PreProcessScript({})", self.path.display())
    }

    fn should_execute(&self, context: &ApplicationContext) -> bool {
        !context.is_current_test_case_skipped()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let raw = context
            .script_state(&self.path)
            .raw
            .clone()
            .with_context(|| format!("Script '{}' was not read", self.path.display()))?;

        let pre_processor = context.services.pre_processor.clone();
        let packages = context.services.packages.clone();
        let mut referenced = Vec::new();
        let processed = pre_processor
            .process(
                PreProcessInput {
                    path: &self.path,
                    content: &raw,
                    root: &context.structure.root,
                    temp: &context.temp_path,
                },
                packages.as_ref(),
                &mut referenced,
            )
            .await
            .with_context(|| format!("Failed to pre-process script '{}'", self.path.display()))?;

        context.script_state(&self.path).processed = Some(processed);
        context.prepared_scripts.insert(self.path.clone());

        let mut chain = Vec::new();
        for source in referenced {
            if context.prepared_scripts.insert(source.clone()) {
                debug!(
                    "Scheduling preparation of {} referenced by {}",
                    source.display(),
                    self.path.display()
                );
                chain.extend(preparation_chain(&source));
            }
        }
        if !chain.is_empty() {
            pipeline.insert_after_current(chain)?;
        }
        Ok(())
    }
}

/// Writes the processed script to its mirrored temp location
#[derive(Debug)]
pub struct SaveTempScriptStep {
    path: PathBuf,
}

impl SaveTempScriptStep {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Step for SaveTempScriptStep {
    fn name(&self) -> String {
        format!("SaveTempScript({})", self.path.display())
    }

    fn should_execute(&self, context: &ApplicationContext) -> bool {
        !context.is_current_test_case_skipped()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let target = context.temp_path_for(&self.path);
        let processed = context
            .script_state(&self.path)
            .processed
            .clone()
            .with_context(|| format!("Script '{}' was not pre-processed", self.path.display()))?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create '{}'", parent.display()))?;
        }
        tokio::fs::write(&target, processed)
            .await
            .with_context(|| format!("Failed to write '{}'", target.display()))?;

        debug!("Saved {} to {}", self.path.display(), target.display());
        context.script_state(&self.path).temp_path = Some(target);
        Ok(())
    }
}

/// Compiles the saved temp copy
#[derive(Debug)]
pub struct CompileScriptStep {
    path: PathBuf,
}

impl CompileScriptStep {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Step for CompileScriptStep {
    fn name(&self) -> String {
        format!("CompileScript({})", self.path.display())
    }

    fn should_execute(&self, context: &ApplicationContext) -> bool {
        !context.is_current_test_case_skipped()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let state = context.script_state(&self.path);
        let (Some(temp_path), Some(processed)) = (state.temp_path.clone(), state.processed.clone())
        else {
            anyhow::bail!("Script '{}' was not saved to the temp folder", self.path.display());
        };

        let compiled = context
            .services
            .compiler
            .compile(&temp_path, &processed)
            .with_context(|| format!("Failed to compile script '{}'", self.path.display()))?;

        context.script_state(&self.path).compiled = Some(Arc::new(compiled));
        Ok(())
    }
}

/// Runs the compiled script against the current test case
#[derive(Debug)]
pub struct ExecuteScriptStep {
    path: PathBuf,
}

impl ExecuteScriptStep {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Step for ExecuteScriptStep {
    fn name(&self) -> String {
        format!("ExecuteScript({})", self.path.display())
    }

    fn should_execute(&self, context: &ApplicationContext) -> bool {
        !context.is_current_test_case_skipped()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let compiled = context
            .script_state(&self.path)
            .compiled
            .clone()
            .with_context(|| format!("Script '{}' was not compiled", self.path.display()))?;
        let executor = context.services.executor.clone();
        let cancellation = context.cancellation.clone();

        let started = std::time::Instant::now();
        let mut scratch = Vec::new();
        let (skip_reason, exit_code) = {
            let ApplicationContext {
                variables,
                current_test_case,
                ..
            } = &mut *context;
            let mut globals = match current_test_case.as_mut() {
                Some(case) => {
                    let TestCaseExecution {
                        request,
                        response,
                        tests,
                        ..
                    } = case;
                    ScriptGlobals::new(variables, tests)
                        .with_exchange(request.as_ref(), response.as_ref())
                }
                None => ScriptGlobals::new(variables, &mut scratch),
            };
            executor
                .run(&compiled, &mut globals, &cancellation)
                .await
                .with_context(|| format!("Script '{}' failed", self.path.display()))?;
            (globals.skip_reason.take(), globals.exit_code)
        };

        if let Some(reason) = skip_reason {
            match context.current_test_case.as_mut() {
                Some(case) => {
                    info!("Skipping test case '{}': {}", case.name, reason);
                    case.skip_reason = Some(reason);
                }
                None => warn!(
                    "skip-case in '{}' ignored outside of a test case",
                    self.path.display()
                ),
            }
        }

        if !scratch.is_empty() {
            let result = TestCaseResult {
                name: relative_to(&self.path, &context.structure.root)
                    .display()
                    .to_string(),
                tests: scratch,
                skip_reason: None,
                duration: started.elapsed(),
            };
            context.services.reporter.report_test_case(&result)?;
            context.summary.record(result);
        }

        if let Some(code) = exit_code {
            info!("Script '{}' requested exit with code {}", self.path.display(), code);
            context.request_exit(code);
        }
        Ok(())
    }
}
