//! Cross-browser capture command

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use indicatif::ProgressBar;

use pagelens_common::report::{summarize, ViewportOutcome};
use pagelens_common::Engine;
use pagelens_harness::capture::{CaptureConfig, CaptureOrchestrator};
use pagelens_harness::driver::DriverConfig;
use pagelens_harness::report;

use crate::output;

#[derive(Args)]
pub struct CaptureArgs {
    /// Base URL of the served page
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Directory for screenshots and results.json
    #[arg(short, long, default_value = "screenshots")]
    out: PathBuf,

    /// Engines to capture, in order
    #[arg(long, value_delimiter = ',', default_value = "chromium,firefox,webkit")]
    engines: Vec<Engine>,

    /// Hero region selector
    #[arg(long, default_value = ".hero")]
    hero_selector: String,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Chromium browser channel (e.g. chrome)
    #[arg(long)]
    channel: Option<String>,
}

pub async fn execute(args: CaptureArgs) -> Result<()> {
    println!("Cross-Browser Capture");
    println!("=====================");

    let orchestrator = CaptureOrchestrator::new(CaptureConfig {
        hero_selector: args.hero_selector.clone(),
        driver: DriverConfig {
            base_url: args.url.clone(),
            screenshot_dir: args.out.clone(),
            channel: args.channel.clone(),
            navigation_timeout_ms: args.timeout_ms,
            headless: true,
        },
        ..CaptureConfig::default()
    })?;

    let mut reports = Vec::with_capacity(args.engines.len());
    for &engine in &args.engines {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message(format!("capturing {engine}..."));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let report = orchestrator.run_for_engine(engine).await?;
        spinner.finish_and_clear();

        println!("\n{} {engine}", output::glyph(report.passed()));
        for vp in &report.viewports {
            match &vp.outcome {
                ViewportOutcome::Captured { hero, .. } => {
                    let hero_note = if hero.is_some() { " (+hero)" } else { "" };
                    println!("  {} {}{hero_note}", output::mark(true), vp.viewport);
                }
                ViewportOutcome::NavigationTimedOut { error } => {
                    println!("  {} {}: {error}", output::mark(false), vp.viewport);
                }
                ViewportOutcome::Failed { error } => {
                    println!("  {} {}: {error}", output::mark(false), vp.viewport);
                }
            }
        }

        reports.push(report);
    }

    let results_path = report::write_results(&reports, &args.out)?;

    println!("\nSummary");
    println!("=======");
    for (engine, ok) in summarize(&reports) {
        println!("  {engine}: {}", output::pass_fail(ok));
    }

    println!("\nScreenshots saved to {}", args.out.display());
    println!("Results written to {}", results_path.display());

    if reports.iter().any(|r| !r.passed()) {
        std::process::exit(1);
    }
    Ok(())
}
