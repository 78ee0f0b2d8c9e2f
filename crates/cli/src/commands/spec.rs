//! Spec inspection commands

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use pagelens_harness::spec::{breakpoint_visual_specs, TestSpec};
use pagelens_harness::toggle;

use crate::output::{self, TableDisplay};

#[derive(Subcommand)]
pub enum SpecCommands {
    /// List test specs with their viewports and tags
    List {
        /// Directory containing YAML test specs
        #[arg(long, default_value = "specs")]
        specs: PathBuf,

        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Include the generated toggle and breakpoint suites
        #[arg(long)]
        builtin: bool,
    },
}

struct SpecRow(TestSpec);

impl TableDisplay for SpecRow {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Viewport", "Steps", "Visual", "Tags"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.0.name.clone(),
            self.0.viewport.label(),
            self.0.steps.len().to_string(),
            if self.0.visual_regression { "✓" } else { "" }.to_string(),
            self.0.tags.join(", "),
        ]
    }
}

pub fn execute(cmd: SpecCommands) -> Result<()> {
    match cmd {
        SpecCommands::List {
            specs,
            tag,
            builtin,
        } => {
            let mut all = TestSpec::load_all(&specs)?;
            if builtin {
                all.extend(toggle::builtin_specs());
                all.extend(breakpoint_visual_specs(".hero"));
            }
            if let Some(tag) = &tag {
                all.retain(|s| s.has_tag(tag));
            }

            let rows: Vec<SpecRow> = all.into_iter().map(SpecRow).collect();
            output::print_table(&rows);
        }
    }
    Ok(())
}
