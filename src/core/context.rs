//! Application context - the mutable state threaded through every step

use crate::{
    core::{cancellation::CancellationToken, services::Services},
    environments::EnvironmentsRegistry,
    http::{HttpRequest, HttpResponse},
    reporting::{RunSummary, TestResult},
    scripts::CompiledScript,
    structure::{mirror_path, CollectionStructure},
    variables::Variables,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Everything a single run knows about
pub struct ApplicationContext {
    /// Unique id of this run
    pub run_id: Uuid,

    /// Collection folder, or a single request file
    pub path: PathBuf,

    /// Folder that mirrors the collection for rewritten scripts
    pub temp_path: PathBuf,

    /// Explicitly configured environment file
    pub environment_file: Option<PathBuf>,

    /// Environment selected for the run (the default one when `None`)
    pub environment_name: Option<String>,

    /// Where to write the JUnit report, if anywhere
    pub report_file: Option<PathBuf>,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Discovery results
    pub structure: CollectionStructure,

    pub variables: Variables,
    pub environments: EnvironmentsRegistry,

    /// Collaborators used by the steps
    pub services: Services,

    /// Per-script working state, keyed by the script's source path
    pub scripts: HashMap<PathBuf, ScriptState>,

    /// Scripts that already have a preparation chain scheduled
    pub prepared_scripts: HashSet<PathBuf>,

    /// The test case currently executing
    pub current_test_case: Option<TestCaseExecution>,

    /// Aggregated results
    pub summary: RunSummary,

    /// Exit code requested by a step; stops the pipeline after that step
    pub exit_code: Option<i32>,

    pub cancellation: CancellationToken,

    pub started_at: DateTime<Utc>,
}

impl ApplicationContext {
    pub fn new(path: impl Into<PathBuf>, services: Services) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            run_id,
            path: path.into(),
            temp_path: std::env::temp_dir().join("tpie").join(run_id.to_string()),
            environment_file: None,
            environment_name: None,
            report_file: None,
            request_timeout: Duration::from_secs(100),
            structure: CollectionStructure::default(),
            variables: Variables::new(),
            environments: EnvironmentsRegistry::new(),
            services,
            scripts: HashMap::new(),
            prepared_scripts: HashSet::new(),
            current_test_case: None,
            summary: RunSummary::default(),
            exit_code: None,
            cancellation: CancellationToken::new(),
            started_at: Utc::now(),
        }
    }

    /// Collection root folder
    pub fn root_path(&self) -> &Path {
        &self.structure.root
    }

    /// Request that the pipeline stops after the current step
    pub fn request_exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    /// Working state of a script, created on first use
    pub fn script_state(&mut self, path: &Path) -> &mut ScriptState {
        self.scripts.entry(path.to_path_buf()).or_default()
    }

    /// Where the rewritten copy of `source` lives inside the temp folder
    pub fn temp_path_for(&self, source: &Path) -> PathBuf {
        mirror_path(source, &self.structure.root, &self.temp_path)
    }

    /// The running test case, or an error when steps run outside of one
    pub fn current_test_case_mut(&mut self) -> anyhow::Result<&mut TestCaseExecution> {
        self.current_test_case
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("No test case is running"))
    }

    /// Whether the current test case was marked skipped
    pub fn is_current_test_case_skipped(&self) -> bool {
        self.current_test_case
            .as_ref()
            .is_some_and(|case| case.skip_reason.is_some())
    }
}

/// Intermediate artifacts of one script
#[derive(Debug, Clone, Default)]
pub struct ScriptState {
    pub raw: Option<String>,
    pub processed: Option<String>,
    pub temp_path: Option<PathBuf>,
    pub compiled: Option<Arc<CompiledScript>>,
}

/// State of the test case being executed
#[derive(Debug, Clone)]
pub struct TestCaseExecution {
    pub name: String,
    pub request_path: PathBuf,
    pub raw_request: Option<String>,
    pub request: Option<HttpRequest>,
    pub response: Option<HttpResponse>,
    pub tests: Vec<TestResult>,
    pub skip_reason: Option<String>,
    pub started: Instant,
}

impl TestCaseExecution {
    pub fn new(name: impl Into<String>, request_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            request_path: request_path.into(),
            raw_request: None,
            request: None,
            response: None,
            tests: Vec::new(),
            skip_reason: None,
            started: Instant::now(),
        }
    }
}
