use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cdcwatch_cdc::{CdcInspector, DebeziumInspector};
use cdcwatch_core::{CdcResult, Config, FailOn, OutputFormat};
use cdcwatch_engine::DriftEngine;
use cdcwatch_source::source_from_config;

mod render;

use render::CheckRun;

const DEFAULT_CONFIG: &str = "cdcwatch.toml";

/// cdcwatch - CDC schema drift audit
#[derive(Parser)]
#[command(name = "cdcwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: cdcwatch.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare the source schema with what CDC is capturing
    Check {
        /// Severity that fails the run: info, warn or block
        #[arg(long)]
        fail_on: Option<String>,

        /// Output format: human or json
        #[arg(long)]
        format: Option<String>,

        /// Also write the drift report JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = config_path(cli.config.as_deref())?;
    if cli.verbose {
        eprintln!("{} {}", "Loading config from:".cyan(), config_path.display());
    }
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    match cli.command {
        Commands::Check { fail_on, format, output } => {
            let fail_on = fail_on
                .as_deref()
                .map(FailOn::parse_lenient)
                .unwrap_or(config.fail_on);
            let format = format
                .as_deref()
                .map(OutputFormat::parse_lenient)
                .unwrap_or(config.format);

            let code = check_command(&config, fail_on, format, output.as_deref(), cli.verbose).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over the verbosity flag
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let default = Path::new(DEFAULT_CONFIG);
    if default.exists() {
        Ok(default.to_path_buf())
    } else {
        Err(anyhow::anyhow!(
            "No config file found. Pass --config <path> or create {} in the current directory.",
            DEFAULT_CONFIG
        ))
    }
}

/// Check command - inspect both sides, detect drift, report
///
/// Returns the process exit code.
async fn check_command(
    config: &Config,
    fail_on: FailOn,
    format: OutputFormat,
    output: Option<&Path>,
    verbose: bool,
) -> Result<i32> {
    if verbose {
        eprintln!("{} {} source...", "Inspecting".cyan(), config.source.source_type);
    }

    let source = source_from_config(config)
        .await
        .context("failed to open source")?;
    let snapshot = source
        .inspect()
        .await
        .with_context(|| format!("failed to inspect {} source", source.name()))?;

    if verbose {
        eprintln!("{} {} table(s) in source", "Found".green(), snapshot.tables.len());
        eprintln!("{} {}...", "Querying Kafka Connect at".cyan(), config.cdc.connect_url);
    }

    let inspector = DebeziumInspector::from_config(&config.cdc)
        .context("failed to create CDC inspector")?;
    let connectors = inspector
        .inspect_connectors()
        .await
        .context("CDC inspection failed")?;
    let cdc = CdcResult::from_connectors(&connectors);

    if verbose {
        eprintln!(
            "{} {} connector(s), {} captured table(s)",
            "Inspected".green(),
            connectors.iter().filter(|c| !c.name.is_empty()).count(),
            cdc.captured_tables.len()
        );
    }

    let report = DriftEngine::validate(&snapshot, Some(&cdc));

    if let Some(path) = output {
        report
            .save_to_file(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        if verbose {
            eprintln!("{} {}", "Drift report saved to:".green(), path.display());
        }
    }

    let run = CheckRun {
        source_name: source.name(),
        snapshot,
        cdc_name: inspector.name(),
        cdc_endpoint: inspector.connect_url().to_string(),
        connectors,
        cdc,
        report,
    };

    match format {
        OutputFormat::Human => render::render_human(&mut std::io::stdout().lock(), &run)
            .context("failed to write report")?,
        OutputFormat::Json => println!("{}", render::render_json(&run)?),
    }

    let code = fail_on.exit_code(&run.report);
    if verbose && code != 0 {
        eprintln!(
            "{} highest severity {:?} meets --fail-on {}",
            "✗".red(),
            run.report.highest_severity(),
            fail_on
        );
    }

    Ok(code)
}
