use anyhow::{Context, Result};
use buildmachine::prelude::*;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// buildmachine - Sync a working copy and build its targets
#[derive(Parser)]
#[command(name = "buildmachine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (JSON)
    #[arg(short, long)]
    settings: PathBuf,

    /// Ordered target list (JSON array)
    #[arg(short, long)]
    targets: PathBuf,

    /// Revision to update the working copy to
    #[arg(short, long)]
    revision: u64,

    /// Build without updating the working copy first
    #[arg(long)]
    skip_sync: bool,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<bool> {
    let settings = BuildMachineSettings::from_json_file(&cli.settings)
        .with_context(|| format!("loading settings from {}", cli.settings.display()))?;
    let targets = load_targets(&cli.targets)?;

    let runner = Arc::new(TokioProcessRunner::new().with_optional_timeout(settings.process_timeout()));
    let events = Arc::new(LoggingEventSink::debug());

    let machine = if cli.skip_sync {
        BuildMachine::build_only(&settings, runner, events)
    } else {
        BuildMachine::from_settings(&settings, runner, events)
    }
    .context("initializing build machine")?;

    let report = machine.run(cli.revision, &targets).await;
    report.log_summary();

    if cli.json {
        println!("{}", report.to_json().context("serializing report")?);
    }
    Ok(report.success())
}

fn load_targets(path: &Path) -> Result<Vec<BuildTarget>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading targets from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing targets in {}", path.display()))
}
