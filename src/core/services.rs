//! Explicit registry of the collaborators steps depend on

use crate::{
    http::{HttpClient, HttpFileParser, PlainHttpFileParser, ReqwestHttpClient},
    reporting::{ConsoleReporter, Reporter},
    scripts::{
        DirectivePreProcessor, LineScriptCompiler, LineScriptExecutor, NuGetPackageHandler,
        PackageHandler, ScriptCompiler, ScriptExecutor, ScriptPreProcessor,
    },
    structure::{FileSystemExplorer, StructureExplorer},
};
use std::sync::Arc;

/// Shared handles to every external collaborator
#[derive(Clone)]
pub struct Services {
    pub explorer: Arc<dyn StructureExplorer>,
    pub pre_processor: Arc<dyn ScriptPreProcessor>,
    pub compiler: Arc<dyn ScriptCompiler>,
    pub executor: Arc<dyn ScriptExecutor>,
    pub request_parser: Arc<dyn HttpFileParser>,
    pub http_client: Arc<dyn HttpClient>,
    pub packages: Arc<dyn PackageHandler>,
    pub reporter: Arc<dyn Reporter>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            explorer: Arc::new(FileSystemExplorer),
            pre_processor: Arc::new(DirectivePreProcessor),
            compiler: Arc::new(LineScriptCompiler),
            executor: Arc::new(LineScriptExecutor),
            request_parser: Arc::new(PlainHttpFileParser),
            http_client: Arc::new(ReqwestHttpClient::new()),
            packages: Arc::new(NuGetPackageHandler::with_default_cache()),
            reporter: Arc::new(ConsoleReporter),
        }
    }
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_explorer(mut self, explorer: Arc<dyn StructureExplorer>) -> Self {
        self.explorer = explorer;
        self
    }

    pub fn with_pre_processor(mut self, pre_processor: Arc<dyn ScriptPreProcessor>) -> Self {
        self.pre_processor = pre_processor;
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn ScriptCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn ScriptExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_request_parser(mut self, parser: Arc<dyn HttpFileParser>) -> Self {
        self.request_parser = parser;
        self
    }

    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = client;
        self
    }

    pub fn with_packages(mut self, packages: Arc<dyn PackageHandler>) -> Self {
        self.packages = packages;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }
}
