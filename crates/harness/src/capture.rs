//! Capture orchestration: engines × viewports → screenshots.
//!
//! Engines run strictly sequentially, one browser fully torn down before the
//! next starts; within an engine, viewports run sequentially, each in a
//! fresh browsing context. Every failure is scoped: a viewport failure is
//! recorded and the loop continues, a launch failure ends that engine only.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use pagelens_common::report::{
    EngineReport, LaunchOutcome, ViewportCapture, ViewportOutcome,
};
use pagelens_common::viewport::CAPTURE_MATRIX;
use pagelens_common::{Engine, Viewport};

use crate::driver::{Driver, DriverConfig, DriverEvent};
use crate::error::{HarnessError, HarnessResult};

/// Screenshot kind suffix in capture filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotKind {
    Full,
    Hero,
}

impl ShotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotKind::Full => "full",
            ShotKind::Hero => "hero",
        }
    }
}

/// Canonical capture filename: `{engine}-{viewport}-{full|hero}.png`.
pub fn screenshot_file_name(engine: Engine, viewport: &str, kind: ShotKind) -> String {
    format!("{engine}-{viewport}-{}.png", kind.as_str())
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub viewports: Vec<Viewport>,
    pub hero_selector: String,
    pub driver: DriverConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            viewports: CAPTURE_MATRIX.to_vec(),
            hero_selector: ".hero".to_string(),
            driver: DriverConfig::default(),
        }
    }
}

pub struct CaptureOrchestrator {
    driver: Driver,
    config: CaptureConfig,
}

impl CaptureOrchestrator {
    pub fn new(config: CaptureConfig) -> HarnessResult<Self> {
        let driver = Driver::new(config.driver.clone())?;
        Ok(Self { driver, config })
    }

    pub fn viewports(&self) -> &[Viewport] {
        &self.config.viewports
    }

    /// Run the capture loop for one engine. Infallible in the per-engine
    /// sense: any failure short of a missing driver install becomes part of
    /// the returned report.
    pub async fn run_for_engine(&self, engine: Engine) -> HarnessResult<EngineReport> {
        info!("capturing {engine} across {} viewport(s)", self.config.viewports.len());

        let script = self.driver.capture_script(
            engine,
            &self.config.viewports,
            &self.config.hero_selector,
        );

        let events = match self.driver.run(&script).await {
            Ok(events) => events,
            Err(HarnessError::DriverNotFound) => return Err(HarnessError::DriverNotFound),
            Err(e) => {
                warn!("{engine}: driver run failed: {e}");
                return Ok(EngineReport::launch_failed(engine, e.to_string()));
            }
        };

        let report = events_to_report(engine, &events, &self.driver.config().screenshot_dir);

        match &report.launch {
            LaunchOutcome::Launched => {
                for vp in &report.viewports {
                    match &vp.outcome {
                        ViewportOutcome::Captured { .. } => {}
                        ViewportOutcome::NavigationTimedOut { error } => {
                            warn!("{engine}/{}: navigation timed out: {error}", vp.viewport)
                        }
                        ViewportOutcome::Failed { error } => {
                            warn!("{engine}/{}: {error}", vp.viewport)
                        }
                    }
                }
            }
            LaunchOutcome::Failed { error } => warn!("{engine}: launch failed: {error}"),
        }

        Ok(report)
    }

    /// Run every engine in order. A launch failure is reported and the next
    /// engine still runs.
    pub async fn run_matrix(&self, engines: &[Engine]) -> HarnessResult<Vec<EngineReport>> {
        let mut reports = Vec::with_capacity(engines.len());
        for &engine in engines {
            reports.push(self.run_for_engine(engine).await?);
        }
        Ok(reports)
    }
}

/// Fold a capture run's event stream into the engine's report.
pub fn events_to_report(
    engine: Engine,
    events: &[DriverEvent],
    screenshot_dir: &Path,
) -> EngineReport {
    let mut launch: Option<LaunchOutcome> = None;
    let mut viewports = Vec::new();

    for event in events {
        match event {
            DriverEvent::Launched => launch = Some(LaunchOutcome::Launched),
            DriverEvent::LaunchError { error } => {
                launch = Some(LaunchOutcome::Failed {
                    error: error.clone(),
                })
            }
            DriverEvent::ViewportCaptured { name, hero } => {
                let full = shot_path(screenshot_dir, engine, name, ShotKind::Full);
                let hero = hero.then(|| shot_path(screenshot_dir, engine, name, ShotKind::Hero));
                viewports.push(ViewportCapture {
                    viewport: name.clone(),
                    outcome: ViewportOutcome::Captured { full, hero },
                });
            }
            DriverEvent::ViewportTimeout { name, error } => viewports.push(ViewportCapture {
                viewport: name.clone(),
                outcome: ViewportOutcome::NavigationTimedOut {
                    error: error.clone(),
                },
            }),
            DriverEvent::ViewportError { name, error } => viewports.push(ViewportCapture {
                viewport: name.clone(),
                outcome: ViewportOutcome::Failed {
                    error: error.clone(),
                },
            }),
            DriverEvent::Step { .. } | DriverEvent::Done => {}
        }
    }

    let launch = launch.unwrap_or(LaunchOutcome::Failed {
        error: "driver reported no launch outcome".to_string(),
    });

    EngineReport {
        engine,
        launch,
        viewports,
    }
}

fn shot_path(dir: &Path, engine: Engine, viewport: &str, kind: ShotKind) -> PathBuf {
    dir.join(screenshot_file_name(engine, viewport, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_follow_the_capture_scheme() {
        assert_eq!(
            screenshot_file_name(Engine::Chromium, "desktop", ShotKind::Full),
            "chromium-desktop-full.png"
        );
        assert_eq!(
            screenshot_file_name(Engine::Webkit, "mobile", ShotKind::Hero),
            "webkit-mobile-hero.png"
        );
    }

    #[test]
    fn event_stream_folds_into_a_mixed_report() {
        let events = vec![
            DriverEvent::Launched,
            DriverEvent::ViewportCaptured {
                name: "desktop".to_string(),
                hero: true,
            },
            DriverEvent::ViewportTimeout {
                name: "tablet".to_string(),
                error: "Timeout 30000ms exceeded".to_string(),
            },
            DriverEvent::ViewportCaptured {
                name: "mobile".to_string(),
                hero: false,
            },
            DriverEvent::Done,
        ];

        let report = events_to_report(Engine::Firefox, &events, Path::new("shots"));
        assert!(report.passed());
        assert_eq!(report.viewports.len(), 3);
        assert_eq!(report.captured_count(), 2);

        match &report.viewports[0].outcome {
            ViewportOutcome::Captured { full, hero } => {
                assert_eq!(full, &PathBuf::from("shots/firefox-desktop-full.png"));
                assert_eq!(
                    hero.as_deref(),
                    Some(Path::new("shots/firefox-desktop-hero.png"))
                );
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        // Hero not visible at mobile: no hero path recorded.
        match &report.viewports[2].outcome {
            ViewportOutcome::Captured { hero, .. } => assert!(hero.is_none()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn launch_error_means_no_viewports_and_a_failed_report() {
        let events = vec![DriverEvent::LaunchError {
            error: "browserType.launch: Executable doesn't exist".to_string(),
        }];
        let report = events_to_report(Engine::Webkit, &events, Path::new("shots"));
        assert!(!report.passed());
        assert!(report.viewports.is_empty());
    }

    #[test]
    fn empty_event_stream_counts_as_a_launch_failure() {
        let report = events_to_report(Engine::Chromium, &[], Path::new("shots"));
        assert!(!report.passed());
    }
}
