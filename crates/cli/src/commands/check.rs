//! Check command: run assertion specs under a profile

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use pagelens_common::profile::{ci_from_env, Profile};
use pagelens_harness::driver::DriverConfig;
use pagelens_harness::runner::{CheckRunner, SpecResult};
use pagelens_harness::server::{ServerConfig, ServerHandle};
use pagelens_harness::spec::{breakpoint_visual_specs, TestSpec};
use pagelens_harness::toggle;
use pagelens_harness::visual::VisualConfig;

use crate::output::{self, TableDisplay};

#[derive(Args)]
pub struct CheckArgs {
    /// Run profile (primary or cross-browser)
    #[arg(long, default_value = "primary")]
    profile: Profile,

    /// Directory containing YAML test specs
    #[arg(long, default_value = "specs")]
    specs: PathBuf,

    /// Run only specs with this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only the spec with this name
    #[arg(short, long)]
    name: Option<String>,

    /// Base URL of the served page
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Output directory for run artifacts
    #[arg(short, long, default_value = "test-results")]
    out: PathBuf,

    /// Directory served as the site root
    #[arg(long, default_value = ".")]
    serve_dir: PathBuf,

    /// Do not spawn (or reuse) the static server
    #[arg(long)]
    no_server: bool,

    /// Skip the generated toggle and breakpoint suites
    #[arg(long)]
    skip_builtin: bool,

    /// Hero region selector for the generated breakpoint suite
    #[arg(long, default_value = ".hero")]
    hero_selector: String,

    /// Adopt actual screenshots as baselines when none exist
    #[arg(long)]
    update_baselines: bool,

    /// Chromium browser channel (e.g. chrome)
    #[arg(long)]
    channel: Option<String>,
}

struct ResultRow<'a>(&'a SpecResult);

impl TableDisplay for ResultRow<'_> {
    fn headers() -> Vec<&'static str> {
        vec!["Spec", "Engine", "Viewport", "Result", "Duration"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.0.name.clone(),
            self.0.engine.to_string(),
            self.0.viewport.clone(),
            if self.0.success { "✓" } else { "✗" }.to_string(),
            format!("{}ms", self.0.duration_ms),
        ]
    }
}

pub async fn execute(args: CheckArgs) -> Result<()> {
    let ci = ci_from_env();
    let settings = args.profile.settings(ci);

    // Keep the handle alive for the whole run; drop stops an owned server.
    let _server = if args.no_server {
        None
    } else {
        Some(ServerHandle::ensure(server_config(&args.url, &args.serve_dir, ci)).await?)
    };

    let mut specs = TestSpec::load_all(&args.specs)?;
    tracing::debug!("loaded {} spec(s) from {}", specs.len(), args.specs.display());
    if !args.skip_builtin {
        specs.extend(toggle::builtin_specs());
        if args.profile == Profile::Primary {
            specs.extend(breakpoint_visual_specs(&args.hero_selector));
        }
    }
    if let Some(tag) = &args.tag {
        specs.retain(|s| s.has_tag(tag));
    }
    if let Some(name) = &args.name {
        specs.retain(|s| &s.name == name);
    }
    if specs.is_empty() {
        anyhow::bail!("no specs selected");
    }

    println!(
        "Running {} spec(s) under the {} profile{}",
        specs.len(),
        args.profile,
        if ci { " (CI)" } else { "" }
    );

    let runner = CheckRunner::new(
        DriverConfig {
            base_url: args.url.clone(),
            screenshot_dir: args.out.join("screenshots"),
            channel: args.channel.clone(),
            ..DriverConfig::default()
        },
        VisualConfig {
            baseline_dir: args.out.join("baselines"),
            actual_dir: args.out.join("screenshots"),
            diff_dir: args.out.join("diffs"),
            tolerance: settings.tolerance,
            auto_update: args.update_baselines,
        },
        settings,
    )?;

    let suite = runner.run_suite(&specs).await?;

    let rows: Vec<ResultRow> = suite.results.iter().map(ResultRow).collect();
    output::print_table(&rows);

    for result in suite.results.iter().filter(|r| !r.success) {
        println!(
            "{} {} [{}]: {}",
            output::mark(false),
            result.name,
            result.engine,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!(
        "\n{} passed, {} failed ({} ms)",
        suite.passed, suite.failed, suite.duration_ms
    );

    let report_path = suite.write(&args.out)?;
    println!("Report written to {}", report_path.display());

    if suite.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn server_config(url: &str, serve_dir: &Path, ci: bool) -> ServerConfig {
    let port = url
        .rsplit(':')
        .next()
        .and_then(|p| p.trim_end_matches('/').parse::<u16>().ok())
        .unwrap_or(3000);

    ServerConfig {
        command: vec![
            "npx".to_string(),
            "http-server".to_string(),
            ".".to_string(),
            "-p".to_string(),
            port.to_string(),
            "-c-1".to_string(),
        ],
        serve_dir: serve_dir.to_path_buf(),
        url: url.to_string(),
        // CI always gets a fresh server; local runs reuse a dev server.
        reuse_existing: !ci,
        ..ServerConfig::default()
    }
}
