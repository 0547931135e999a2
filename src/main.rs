use anyhow::{Context, Result};
use tpie::app::Application;
use tpie::cli::commands::{ExploreCommand, GenerateCommand, TestCommand};
use tpie::cli::output::*;
use tpie::cli::{Cli, Command};
use tpie::core::{CancellationToken, RunnerConfig, EXIT_SUCCESS};
use tpie::structure::{scaffold_test_case, FileSystemExplorer, StructureExplorer};
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Test(cmd) => {
            let code = run_tests(cmd).await?;
            std::process::exit(code);
        }
        Command::Explore(cmd) => explore_collection(cmd)?,
        Command::Generate(cmd) => generate_test_case(cmd)?,
    }

    Ok(())
}

async fn run_tests(cmd: &TestCommand) -> Result<i32> {
    let file_config = match &cmd.config {
        Some(path) => RunnerConfig::from_file(path)?,
        None => RunnerConfig::discover(&cmd.path)?.unwrap_or_default(),
    };
    let config = file_config.merge(cmd.overrides());

    let cancellation = CancellationToken::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            on_interrupt.cancel();
        }
    });

    let report = Application::new(&cmd.path, config)
        .run(cancellation)
        .await?;

    if report.exit_code == EXIT_SUCCESS {
        println!("\n{}{}", CHECK, style("All tests passed").green());
    } else {
        println!(
            "\n{}{} {}",
            CROSS,
            style("Run failed with exit code").red(),
            style(report.exit_code).bold()
        );
    }
    Ok(report.exit_code)
}

fn explore_collection(cmd: &ExploreCommand) -> Result<()> {
    let structure = FileSystemExplorer
        .explore(&cmd.path)
        .with_context(|| format!("Failed to explore '{}'", cmd.path.display()))?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&structure_json(&structure))?);
        return Ok(());
    }

    for line in format_structure(&structure) {
        println!("{}", line);
    }
    if structure.test_cases.is_empty() {
        println!("{}No test cases found", WARN);
    }
    Ok(())
}

fn generate_test_case(cmd: &GenerateCommand) -> Result<()> {
    let created = scaffold_test_case(&cmd.folder, &cmd.name)?;
    println!("{}Created test case {}", CHECK, style(&cmd.name).bold());
    for path in created {
        println!("  {}", style(path.display()).dim());
    }
    Ok(())
}
