//! Baseline management commands

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use pagelens_common::profile::DiffTolerance;
use pagelens_harness::visual::{VisualConfig, VisualTester};

use crate::output;

#[derive(Subcommand)]
pub enum BaselineCommands {
    /// Adopt the current screenshots as baselines
    Update {
        /// Directory containing the freshly captured screenshots
        #[arg(long, default_value = "test-results/screenshots")]
        screenshots: PathBuf,

        /// Baseline directory to update
        #[arg(long, default_value = "test-results/baselines")]
        baselines: PathBuf,
    },

    /// List stored baselines
    List {
        #[arg(long, default_value = "test-results/baselines")]
        baselines: PathBuf,
    },
}

pub fn execute(cmd: BaselineCommands) -> Result<()> {
    match cmd {
        BaselineCommands::Update {
            screenshots,
            baselines,
        } => {
            let tester = VisualTester::new(VisualConfig {
                baseline_dir: baselines,
                actual_dir: screenshots,
                diff_dir: PathBuf::from("test-results/diffs"),
                tolerance: DiffTolerance::STRICT,
                auto_update: true,
            })?;

            let updated = tester.update_all_baselines()?;
            if updated.is_empty() {
                println!("No screenshots to adopt.");
            } else {
                for name in &updated {
                    println!("{} {name}", output::mark(true));
                }
                println!("\nUpdated {} baseline(s)", updated.len());
            }
        }
        BaselineCommands::List { baselines } => {
            let tester = VisualTester::new(VisualConfig {
                baseline_dir: baselines,
                actual_dir: PathBuf::from("test-results/screenshots"),
                diff_dir: PathBuf::from("test-results/diffs"),
                tolerance: DiffTolerance::STRICT,
                auto_update: false,
            })?;

            let names = tester.list_baselines()?;
            if names.is_empty() {
                println!("No baselines stored.");
            } else {
                for name in &names {
                    println!("{name}");
                }
            }
        }
    }
    Ok(())
}
