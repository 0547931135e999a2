//! Run configuration from YAML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional settings for a run, read from `tpie.yaml` or `--config`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Environment to select
    pub environment: Option<String>,

    /// Environment file, instead of `<collection>-env.json`
    pub environment_file: Option<PathBuf>,

    /// Base folder for per-run temp folders
    pub temp_path: Option<PathBuf>,

    /// Where to write the JUnit report
    pub report_file: Option<PathBuf>,

    /// Package cache folder
    pub package_cache: Option<PathBuf>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

impl RunnerConfig {
    /// File looked up next to the collection when no `--config` is given
    pub const FILE_NAME: &'static str = "tpie.yaml";

    /// Load from a file. Relative paths inside are resolved against its folder.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config '{}'", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve_paths(base))
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RunnerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// `tpie.yaml` in the collection folder (or next to a single request file)
    pub fn discover(collection: &Path) -> Result<Option<Self>> {
        let folder = if collection.is_file() {
            collection.parent().unwrap_or_else(|| Path::new(""))
        } else {
            collection
        };
        let candidate = folder.join(Self::FILE_NAME);
        if candidate.is_file() {
            Self::from_file(candidate).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == Some(0) {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        if self.environment.as_deref().is_some_and(|e| e.trim().is_empty()) {
            anyhow::bail!("environment must not be empty");
        }
        Ok(())
    }

    /// Values set in `overrides` win over values in `self`
    pub fn merge(self, overrides: RunnerConfig) -> RunnerConfig {
        RunnerConfig {
            environment: overrides.environment.or(self.environment),
            environment_file: overrides.environment_file.or(self.environment_file),
            temp_path: overrides.temp_path.or(self.temp_path),
            report_file: overrides.report_file.or(self.report_file),
            package_cache: overrides.package_cache.or(self.package_cache),
            request_timeout_secs: overrides.request_timeout_secs.or(self.request_timeout_secs),
        }
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |path: Option<PathBuf>| {
            path.map(|p| if p.is_relative() { base.join(p) } else { p })
        };
        self.environment_file = resolve(self.environment_file);
        self.temp_path = resolve(self.temp_path);
        self.report_file = resolve(self.report_file);
        self.package_cache = resolve(self.package_cache);
        self
    }
}
