//! Request chain steps: read → parse → execute

use crate::core::{ApplicationContext, PipelineHandle, Step};
use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{error, info};

/// Reads a request file into the running test case
#[derive(Debug)]
pub struct ReadRequestFileStep {
    path: PathBuf,
}

impl ReadRequestFileStep {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Step for ReadRequestFileStep {
    fn name(&self) -> String {
        format!("ReadRequestFile({})", self.path.display())
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
            .with_context(|| format!("Failed to read request file '{}'", self.path.display()))?;
        context.current_test_case_mut()?.raw_request = Some(raw);
        Ok(())
    }
}

/// Resolves variables in the request text and parses it
#[derive(Debug)]
pub struct ParseRequestStep {
    path: PathBuf,
}

impl ParseRequestStep {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Step for ParseRequestStep {
    fn name(&self) -> String {
        format!("ParseRequest({})", self.path.display())
    }

    fn should_execute(&self, context: &ApplicationContext) -> bool {
        !context.is_current_test_case_skipped()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let raw = context
            .current_test_case_mut()?
            .raw_request
            .clone()
            .with_context(|| format!("Request file '{}' was not read", self.path.display()))?;

        let resolved = context.variables.interpolate(&raw);
        let request = context
            .services
            .request_parser
            .parse(&resolved)
            .with_context(|| format!("Failed to parse request file '{}'", self.path.display()))?;

        context.current_test_case_mut()?.request = Some(request);
        Ok(())
    }
}

/// Sends the parsed request and stores the response
#[derive(Debug)]
pub struct ExecuteRequestStep {
    path: PathBuf,
}

impl ExecuteRequestStep {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Step for ExecuteRequestStep {
    fn name(&self) -> String {
        format!("ExecuteRequest({})", self.path.display())
    }

    fn should_execute(&self, context: &ApplicationContext) -> bool {
        !context.is_current_test_case_skipped()
    }

    async fn execute(
        &self,
        context: &mut ApplicationContext,
        _pipeline: &mut PipelineHandle<'_>,
    ) -> anyhow::Result<()> {
        let request = context
            .current_test_case_mut()?
            .request
            .clone()
            .with_context(|| format!("Request file '{}' was not parsed", self.path.display()))?;

        let client = context.services.http_client.clone();
        let response = client
            .send(&request, context.request_timeout, &context.cancellation)
            .await
            .map_err(|e| {
                error!("Request '{}' failed: {}", self.path.display(), e);
                e
            })
            .with_context(|| format!("Failed to execute request '{}'", self.path.display()))?;

        info!(
            "{} {} -> {} ({} ms)",
            request.method, request.url, response.status, response.duration_ms
        );
        context.current_test_case_mut()?.response = Some(response);
        Ok(())
    }
}
