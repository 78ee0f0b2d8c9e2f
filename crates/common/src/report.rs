//! Typed per-engine capture reports.
//!
//! Each engine run produces one immutable [`EngineReport`]; the caller folds
//! the reports into the flat engine → bool summary written to `results.json`.
//! There is no shared accumulator, so reports stay race-free even if engine
//! runs were ever parallelized.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::Engine;

/// Whether the engine's browser process came up at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaunchOutcome {
    Launched,
    Failed { error: String },
}

/// Outcome of one viewport within one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ViewportOutcome {
    /// Screenshots captured; `hero` is present only when the hero region was
    /// visible at this viewport.
    Captured {
        full: PathBuf,
        hero: Option<PathBuf>,
    },
    /// The page did not reach network-idle within the navigation bound.
    NavigationTimedOut { error: String },
    /// Any other per-viewport failure (element errors, capture errors).
    Failed { error: String },
}

impl ViewportOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, ViewportOutcome::Captured { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportCapture {
    pub viewport: String,
    #[serde(flatten)]
    pub outcome: ViewportOutcome,
}

/// Immutable record of one engine's capture run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineReport {
    pub engine: Engine,
    pub launch: LaunchOutcome,
    /// Empty when the launch failed; no viewports are attempted then.
    pub viewports: Vec<ViewportCapture>,
}

impl EngineReport {
    pub fn launch_failed(engine: Engine, error: impl Into<String>) -> Self {
        Self {
            engine,
            launch: LaunchOutcome::Failed {
                error: error.into(),
            },
            viewports: Vec::new(),
        }
    }

    /// The aggregate boolean for `results.json`: `true` iff the engine
    /// launched. Viewport-level failures do not flip it; they are visible in
    /// `viewports` for callers that want a stricter fold.
    pub fn passed(&self) -> bool {
        matches!(self.launch, LaunchOutcome::Launched)
    }

    pub fn captured_count(&self) -> usize {
        self.viewports
            .iter()
            .filter(|v| v.outcome.is_captured())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.viewports.len() - self.captured_count()
    }
}

/// Fold engine reports into the flat `{engineName: bool}` mapping. Keys are
/// ordered, so serializing the map twice yields identical bytes.
pub fn summarize<'a, I>(reports: I) -> BTreeMap<String, bool>
where
    I: IntoIterator<Item = &'a EngineReport>,
{
    reports
        .into_iter()
        .map(|r| (r.engine.to_string(), r.passed()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(viewport: &str) -> ViewportCapture {
        ViewportCapture {
            viewport: viewport.to_string(),
            outcome: ViewportOutcome::Captured {
                full: PathBuf::from(format!("chromium-{viewport}-full.png")),
                hero: None,
            },
        }
    }

    fn timed_out(viewport: &str) -> ViewportCapture {
        ViewportCapture {
            viewport: viewport.to_string(),
            outcome: ViewportOutcome::NavigationTimedOut {
                error: "Timeout 30000ms exceeded".to_string(),
            },
        }
    }

    #[test]
    fn viewport_failures_do_not_flip_the_engine_boolean() {
        let report = EngineReport {
            engine: Engine::Firefox,
            launch: LaunchOutcome::Launched,
            viewports: vec![captured("desktop"), timed_out("tablet"), timed_out("mobile")],
        };

        assert!(report.passed());
        assert_eq!(report.captured_count(), 1);
        assert_eq!(report.failed_count(), 2);
    }

    #[test]
    fn launch_failure_is_the_only_false_case() {
        let report = EngineReport::launch_failed(Engine::Webkit, "missing system libraries");
        assert!(!report.passed());
        assert!(report.viewports.is_empty());
    }

    #[test]
    fn summary_has_one_ordered_entry_per_engine() {
        let reports = vec![
            EngineReport {
                engine: Engine::Webkit,
                launch: LaunchOutcome::Launched,
                viewports: vec![captured("desktop")],
            },
            EngineReport::launch_failed(Engine::Firefox, "boom"),
            EngineReport {
                engine: Engine::Chromium,
                launch: LaunchOutcome::Launched,
                viewports: vec![],
            },
        ];

        let summary = summarize(&reports);
        assert_eq!(summary.len(), 3);
        let keys: Vec<_> = summary.keys().cloned().collect();
        assert_eq!(keys, ["chromium", "firefox", "webkit"]);
        assert_eq!(summary["firefox"], false);
        assert_eq!(summary["webkit"], true);
    }
}
