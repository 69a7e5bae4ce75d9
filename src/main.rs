use anyhow::{Context, Result};
use clap::Parser;
use layerwise::{Config, Diagnostics, Pipeline};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Detect communities in signed and multi-layer networks.
#[derive(Debug, Parser)]
#[command(name = "layerwise", version, about)]
struct Cli {
    /// Configuration file
    #[arg(default_value = "config.json")]
    config: PathBuf,

    /// Output directory (overrides `output` in the configuration)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(output) = cli.output {
        config.output = output;
    }

    let mut diagnostics = Diagnostics::new();
    let result = config.source().and_then(|source| {
        Pipeline::from_config(&config, &mut diagnostics)?
            .with_progress(!cli.quiet)
            .run(&source, &mut diagnostics)
    });
    match result {
        Ok(summary) => tracing::info!(
            processed = summary.processed,
            failed = summary.failed,
            "run finished"
        ),
        Err(err) => diagnostics.error(err.to_string()),
    }

    diagnostics
        .write(&config.status)
        .with_context(|| format!("failed to write {}", config.status.display()))?;

    Ok(ExitCode::from(diagnostics.exit_code()))
}
