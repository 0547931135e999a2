//! Discovered collection structure

pub mod explorer;
pub mod scaffold;
pub mod steps;

pub use explorer::FileSystemExplorer;
pub use scaffold::scaffold_test_case;
pub use steps::ExploreStructureStep;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix of request files
pub const REQUEST_SUFFIX: &str = "-req.http";
/// Suffix of pre-request scripts
pub const PRE_REQUEST_SUFFIX: &str = "-init.tps";
/// Suffix of post-response scripts
pub const POST_RESPONSE_SUFFIX: &str = "-test.tps";
/// Extension of script files
pub const SCRIPT_EXTENSION: &str = "tps";
/// Suffix of the auto-discovered environment file
pub const ENVIRONMENT_FILE_SUFFIX: &str = "-env.json";

/// Errors raised during discovery
#[derive(Debug, Error)]
pub enum ExploreError {
    #[error("Path '{0}' does not exist")]
    NotFound(String),

    #[error("Path '{0}' is neither a folder nor a request file")]
    Unsupported(String),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A script file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub path: PathBuf,
    pub relative_path: PathBuf,
}

impl Script {
    pub fn new(path: impl Into<PathBuf>, root: &Path) -> Self {
        let path = path.into();
        let relative_path = relative_to(&path, root);
        Self { path, relative_path }
    }
}

/// A request file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFile {
    pub path: PathBuf,
    pub relative_path: PathBuf,
}

/// One request with its surrounding scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Display name, the request file name without its suffix
    pub name: String,
    pub request: RequestFile,
    pub pre_request_scripts: Vec<Script>,
    pub post_response_scripts: Vec<Script>,
}

impl TestCase {
    /// Unique key: the request path relative to the collection root
    pub fn key(&self) -> String {
        self.request.relative_path.to_string_lossy().replace('\\', "/")
    }
}

/// Everything discovered under a collection root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStructure {
    pub root: PathBuf,
    pub name: String,
    /// Test cases in discovery order
    pub test_cases: Vec<TestCase>,
    /// Scripts in the root folder that belong to no test case
    pub scripts: Vec<Script>,
    /// Auto-discovered environment file
    pub environment_file: Option<PathBuf>,
}

impl CollectionStructure {
    pub fn test_case(&self, key: &str) -> Option<&TestCase> {
        self.test_cases.iter().find(|case| case.key() == key)
    }
}

/// Discovers the test cases and scripts of a collection
pub trait StructureExplorer: Send + Sync {
    /// Explore a collection folder, or a single request file.
    /// Ordering must be deterministic for the same filesystem state.
    fn explore(&self, path: &Path) -> Result<CollectionStructure, ExploreError>;
}

pub(crate) fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.file_name().map(PathBuf::from).unwrap_or_default())
}

/// Location of `source` inside `temp`, mirroring its place under `root`.
/// Files outside the collection land in `temp/external`.
pub fn mirror_path(source: &Path, root: &Path, temp: &Path) -> PathBuf {
    match source.strip_prefix(root) {
        Ok(relative) if !root.as_os_str().is_empty() => temp.join(relative),
        _ => {
            let name = source.file_name().map(PathBuf::from).unwrap_or_default();
            temp.join("external").join(name)
        }
    }
}

/// Resolve `.` and `..` components without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
