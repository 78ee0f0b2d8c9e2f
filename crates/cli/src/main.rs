//! Pagelens CLI - Main Entry Point
//!
//! Command-line interface for capturing the cross-browser screenshot
//! matrix, running assertion specs, and managing visual baselines.

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{baseline, capture, check, spec};

/// Pagelens - cross-browser visual regression harness
#[derive(Parser)]
#[command(name = "pagelens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the engine × viewport screenshot matrix
    Capture(capture::CaptureArgs),

    /// Run assertion specs against the live page
    Check(check::CheckArgs),

    /// Manage visual regression baselines
    #[command(subcommand)]
    Baseline(baseline::BaselineCommands),

    /// Inspect test specs
    #[command(subcommand)]
    Spec(spec::SpecCommands),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PAGELENS_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Capture(args) => capture::execute(args).await?,
        Commands::Check(args) => check::execute(args).await?,
        Commands::Baseline(cmd) => baseline::execute(cmd)?,
        Commands::Spec(cmd) => spec::execute(cmd)?,
    }

    Ok(())
}
