//! CLI command definitions

use crate::core::RunnerConfig;
use clap::Args;
use std::path::PathBuf;

/// Run a collection
#[derive(Debug, Args, Clone)]
pub struct TestCommand {
    /// Collection folder or request file
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Environment to select
    #[arg(short, long = "env")]
    pub environment: Option<String>,

    /// Environment file to use instead of `<collection>-env.json`
    #[arg(long = "env-file")]
    pub environment_file: Option<PathBuf>,

    /// Run configuration file (defaults to tpie.yaml in the collection)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base folder for temporary files
    #[arg(long = "temp")]
    pub temp_path: Option<PathBuf>,

    /// Write a JUnit XML report to this file
    #[arg(short, long)]
    pub report_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// Package cache folder
    #[arg(long)]
    pub package_cache: Option<PathBuf>,
}

impl TestCommand {
    /// Settings given on the command line
    pub fn overrides(&self) -> RunnerConfig {
        RunnerConfig {
            environment: self.environment.clone(),
            environment_file: self.environment_file.clone(),
            temp_path: self.temp_path.clone(),
            report_file: self.report_file.clone(),
            package_cache: self.package_cache.clone(),
            request_timeout_secs: self.timeout_secs,
        }
    }
}

/// Show what a collection contains
#[derive(Debug, Args, Clone)]
pub struct ExploreCommand {
    /// Collection folder or request file
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Scaffold a test case
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Test case name, used as the file name prefix
    pub name: String,

    /// Folder to create the files in
    #[arg(short, long, default_value = ".")]
    pub folder: PathBuf,
}
