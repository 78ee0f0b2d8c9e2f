//! Check runner: executes assertion specs against the live page.
//!
//! One run covers every (engine, spec) pair the profile asks for. Each spec
//! executes in its own driver process, so pairs are independent; the
//! profile's worker count decides whether they run serially (the
//! cross-browser matrix) or concurrently (the primary suite).

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use pagelens_common::profile::ProfileSettings;
use pagelens_common::Engine;

use crate::driver::{Driver, DriverConfig, DriverEvent};
use crate::error::{HarnessError, HarnessResult};
use crate::spec::TestSpec;
use crate::visual::{VisualConfig, VisualTester};

/// Result of one step within a spec run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualDiffResult {
    pub name: String,
    pub matches: bool,
    pub diff_pixels: u64,
    pub diff_ratio: f64,
    pub diff_image_path: Option<String>,
}

/// Result of running a single spec on a single engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecResult {
    pub name: String,
    pub engine: Engine,
    pub viewport: String,
    pub success: bool,
    pub duration_ms: u64,
    pub retries_used: u32,
    pub steps: Vec<StepResult>,
    pub visual: Vec<VisualDiffResult>,
    pub error: Option<String>,
}

/// Result of a whole check run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub results: Vec<SpecResult>,
}

impl SuiteResult {
    /// Write the rich per-check report next to the other run artifacts.
    pub fn write(&self, dir: &std::path::Path) -> HarnessResult<std::path::PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("check-results.json");
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

#[derive(Clone)]
pub struct CheckRunner {
    driver: Driver,
    visual: VisualTester,
    settings: ProfileSettings,
}

impl CheckRunner {
    pub fn new(
        driver_config: DriverConfig,
        visual_config: VisualConfig,
        settings: ProfileSettings,
    ) -> HarnessResult<Self> {
        Ok(Self {
            driver: Driver::new(driver_config)?,
            visual: VisualTester::new(visual_config)?,
            settings,
        })
    }

    /// Run every spec on every engine the profile covers.
    pub async fn run_suite(&self, specs: &[TestSpec]) -> HarnessResult<SuiteResult> {
        let start = Instant::now();
        let started_at = Utc::now();

        let focused: Vec<&str> = specs
            .iter()
            .filter(|s| s.only)
            .map(|s| s.name.as_str())
            .collect();
        if !focused.is_empty() && self.settings.forbid_only {
            return Err(HarnessError::OnlyForbidden(focused.join(", ")));
        }

        let selected: Vec<&TestSpec> = if focused.is_empty() {
            specs.iter().collect()
        } else {
            specs.iter().filter(|s| s.only).collect()
        };

        let pairs: Vec<(Engine, TestSpec)> = self
            .settings
            .engines
            .iter()
            .flat_map(|&engine| selected.iter().map(move |&s| (engine, s.clone())))
            .collect();

        let workers = self.settings.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        });

        info!(
            "running {} check(s) across {} engine(s), {} worker(s)",
            pairs.len(),
            self.settings.engines.len(),
            workers
        );

        let results = if workers <= 1 {
            let mut results = Vec::with_capacity(pairs.len());
            for (engine, spec) in &pairs {
                results.push(self.run_one(*engine, spec).await);
            }
            results
        } else {
            self.run_concurrent(pairs, workers).await?
        };

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("check results: {passed} passed, {failed} failed ({duration_ms} ms)");

        Ok(SuiteResult {
            total: results.len(),
            passed,
            failed,
            duration_ms,
            started_at,
            results,
        })
    }

    async fn run_concurrent(
        &self,
        pairs: Vec<(Engine, TestSpec)>,
        workers: usize,
    ) -> HarnessResult<Vec<SpecResult>> {
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut join_set = tokio::task::JoinSet::new();

        for (idx, (engine, spec)) in pairs.into_iter().enumerate() {
            let runner = self.clone();
            let semaphore = semaphore.clone();
            join_set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("worker semaphore stays open for the whole run");
                (idx, runner.run_one(engine, &spec).await)
            });
        }

        let mut slots: Vec<Option<SpecResult>> = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            let (idx, result) =
                joined.map_err(|e| HarnessError::Protocol(format!("worker panicked: {e}")))?;
            if slots.len() <= idx {
                slots.resize_with(idx + 1, || None);
            }
            slots[idx] = Some(result);
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Run one spec, retrying per the profile.
    pub async fn run_one(&self, engine: Engine, spec: &TestSpec) -> SpecResult {
        let mut attempt = 0;
        loop {
            let mut result = self.attempt_spec(engine, spec).await;
            result.retries_used = attempt;

            if result.success {
                info!("✓ {} [{engine}] ({} ms)", result.name, result.duration_ms);
                return result;
            }

            if attempt >= self.settings.retries {
                error!(
                    "✗ {} [{engine}] - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
                return result;
            }

            attempt += 1;
            warn!("retrying {} [{engine}] (attempt {})", spec.name, attempt + 1);
        }
    }

    async fn attempt_spec(&self, engine: Engine, spec: &TestSpec) -> SpecResult {
        let start = Instant::now();
        let mut steps = Vec::new();
        let mut spec_error: Option<String> = None;

        let run = match self
            .driver
            .spec_script(engine, spec, self.settings.screenshot_policy)
        {
            Ok(script) => self.driver.run(&script).await,
            Err(e) => Err(e),
        };

        match run {
            Ok(events) => {
                for event in events {
                    match event {
                        DriverEvent::LaunchError { error } => {
                            spec_error.get_or_insert(format!("launch failed: {error}"));
                        }
                        DriverEvent::Step {
                            index,
                            ok,
                            observed,
                            error,
                        } => {
                            let step = spec.steps.get(index);
                            let label = step
                                .map(|s| s.describe())
                                .unwrap_or_else(|| format!("step {index}"));

                            if !ok {
                                let reason =
                                    error.unwrap_or_else(|| "unknown step error".to_string());
                                spec_error.get_or_insert(format!("{label}: {reason}"));
                                steps.push(StepResult {
                                    step: label,
                                    success: false,
                                    error: Some(reason),
                                });
                                continue;
                            }

                            let verdict = step
                                .map(|s| s.evaluate(&observed.unwrap_or_default()))
                                .unwrap_or(Ok(()));
                            match verdict {
                                Ok(()) => steps.push(StepResult {
                                    step: label,
                                    success: true,
                                    error: None,
                                }),
                                Err(reason) => {
                                    spec_error.get_or_insert(reason.clone());
                                    steps.push(StepResult {
                                        step: label,
                                        success: false,
                                        error: Some(reason),
                                    });
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Err(e) => {
                spec_error = Some(e.to_string());
            }
        }

        let mut visual = Vec::new();
        if spec.visual_regression && spec_error.is_none() {
            for name in spec.screenshot_names() {
                match self.visual.compare(name, Some(self.settings.tolerance)) {
                    Ok(diff) => {
                        if !diff.matches {
                            spec_error.get_or_insert(format!(
                                "visual regression in '{name}': {} pixels differ",
                                diff.diff_pixels
                            ));
                        }
                        visual.push(VisualDiffResult {
                            name: name.to_string(),
                            matches: diff.matches,
                            diff_pixels: diff.diff_pixels,
                            diff_ratio: diff.diff_ratio,
                            diff_image_path: diff
                                .diff_image_path
                                .map(|p| p.to_string_lossy().to_string()),
                        });
                    }
                    Err(HarnessError::BaselineNotFound(_)) => {
                        // First run for this screenshot; adopt with
                        // `pagelens baseline update`.
                        info!("no baseline for '{name}' yet");
                    }
                    Err(e) => {
                        spec_error.get_or_insert(format!("visual comparison error: {e}"));
                    }
                }
            }
        }

        SpecResult {
            name: spec.name.clone(),
            engine,
            viewport: spec.viewport.label(),
            success: spec_error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            retries_used: 0,
            steps,
            visual,
            error: spec_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelens_common::profile::Profile;

    #[test]
    fn suite_result_serializes_with_counts() {
        let suite = SuiteResult {
            total: 2,
            passed: 1,
            failed: 1,
            duration_ms: 42,
            started_at: Utc::now(),
            results: vec![],
        };
        let json = serde_json::to_string(&suite).unwrap();
        assert!(json.contains("\"passed\":1"));
    }

    #[tokio::test]
    async fn forbid_only_rejects_focused_specs() {
        let runner = CheckRunner {
            driver: crate::driver::offline_driver(DriverConfig::default()),
            visual: VisualTester::new(VisualConfig {
                baseline_dir: std::env::temp_dir().join("pagelens-test-baselines"),
                actual_dir: std::env::temp_dir().join("pagelens-test-actual"),
                diff_dir: std::env::temp_dir().join("pagelens-test-diffs"),
                ..VisualConfig::default()
            })
            .unwrap(),
            settings: Profile::Primary.settings(true),
        };

        let yaml = "name: focused\nonly: true\nsteps:\n  - action: navigate\n";
        let spec = TestSpec::from_yaml(yaml).unwrap();

        let err = runner.run_suite(&[spec]).await.unwrap_err();
        assert!(matches!(err, HarnessError::OnlyForbidden(names) if names.contains("focused")));
    }
}
