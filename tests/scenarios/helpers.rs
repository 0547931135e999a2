//! Shared fixtures: an on-disk collection, a scripted HTTP client and a recording reporter

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tpie::core::CancellationToken;
use tpie::http::{HttpClient, HttpError, HttpRequest, HttpResponse};
use tpie::reporting::{Reporter, RunSummary, TestCaseResult};
use tpie::{Application, RunReport, RunnerConfig, Services};

/// Collection folder in a temporary directory, removed on drop
pub struct Collection {
    dir: TempDir,
    name: String,
}

impl Collection {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(name)).unwrap();
        Self {
            dir,
            name: name.to_string(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join(&self.name)
    }

    /// Folder for temporary files, outside the collection
    pub fn temp(&self) -> PathBuf {
        self.dir.path().join("tmp")
    }

    pub fn file(self, relative: &str, content: &str) -> Self {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
        self
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn config(&self) -> RunnerConfig {
        RunnerConfig {
            temp_path: Some(self.temp()),
            ..Default::default()
        }
    }
}

/// Answers requests by URL and records what was sent
#[derive(Default)]
pub struct MockHttpClient {
    routes: Vec<(String, HttpResponse)>,
    delay: Option<Duration>,
    pub sent: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.push((
            url.to_string(),
            HttpResponse {
                status,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body: body.to_string(),
                duration_ms: 1,
            },
        ));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent_urls(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|r| r.url.clone()).collect()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(
        &self,
        request: &HttpRequest,
        _timeout: Duration,
        cancellation: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if cancellation.is_cancelled() {
            return Err(HttpError::Cancelled);
        }

        self.sent.lock().unwrap().push(request.clone());
        self.routes
            .iter()
            .find(|(url, _)| *url == request.url)
            .map(|(_, response)| response.clone())
            .ok_or_else(|| HttpError::Transport(format!("no route for {}", request.url)))
    }
}

/// Keeps every reported test case
#[derive(Default)]
pub struct RecordingReporter {
    pub cases: Mutex<Vec<TestCaseResult>>,
    pub summaries: Mutex<usize>,
}

impl RecordingReporter {
    pub fn case(&self, name: &str) -> TestCaseResult {
        self.cases
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("test case '{}' was not reported", name))
    }
}

impl Reporter for RecordingReporter {
    fn report_test_case(&self, result: &TestCaseResult) -> anyhow::Result<()> {
        self.cases.lock().unwrap().push(result.clone());
        Ok(())
    }

    fn report_summary(&self, _summary: &RunSummary) -> anyhow::Result<()> {
        *self.summaries.lock().unwrap() += 1;
        Ok(())
    }
}

/// Run `path` with the given doubles
pub async fn run(
    path: &Path,
    config: RunnerConfig,
    client: Arc<MockHttpClient>,
    reporter: Arc<RecordingReporter>,
) -> RunReport {
    run_with_token(path, config, client, reporter, CancellationToken::new()).await
}

pub async fn run_with_token(
    path: &Path,
    config: RunnerConfig,
    client: Arc<MockHttpClient>,
    reporter: Arc<RecordingReporter>,
    cancellation: CancellationToken,
) -> RunReport {
    let services = Services::default()
        .with_http_client(client)
        .with_reporter(reporter);
    Application::new(path, config)
        .with_services(services)
        .run(cancellation)
        .await
        .unwrap()
}
