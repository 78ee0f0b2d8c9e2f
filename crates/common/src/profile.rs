//! Run profiles.
//!
//! Two profiles cover the two ways the suite runs: `primary` exercises one
//! engine across spec files in parallel with strict pixel tolerance, while
//! `cross-browser` runs the full engine matrix serially with a lenient
//! tolerance, since anti-aliasing and font rendering differ by engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::Engine;

/// Pixel-difference tolerance for screenshot comparison.
///
/// `threshold` is the per-channel color distance (0.0 - 1.0) below which two
/// pixels count as equal; `max_diff_pixels` is how many differing pixels a
/// comparison may contain and still match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffTolerance {
    pub max_diff_pixels: u64,
    pub threshold: f64,
}

impl DiffTolerance {
    /// Same-engine regression: tight bound, small anti-aliasing allowance.
    pub const STRICT: DiffTolerance = DiffTolerance {
        max_diff_pixels: 100,
        threshold: 0.2,
    };

    /// Cross-engine comparison: font rendering and anti-aliasing vary per
    /// engine, so allow more variance.
    pub const LENIENT: DiffTolerance = DiffTolerance {
        max_diff_pixels: 500,
        threshold: 0.3,
    };
}

/// When the check runner captures screenshots beyond explicit screenshot
/// steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenshotPolicy {
    Always,
    OnlyOnFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    Primary,
    CrossBrowser,
}

/// Resolved settings for one run of the check suite.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSettings {
    pub engines: Vec<Engine>,
    /// `None` means one worker per available core.
    pub workers: Option<usize>,
    pub retries: u32,
    /// Reject suites containing `only`-marked specs (CI guard).
    pub forbid_only: bool,
    pub screenshot_policy: ScreenshotPolicy,
    pub tolerance: DiffTolerance,
}

impl Profile {
    /// Resolve the profile against the CI flag.
    pub fn settings(&self, ci: bool) -> ProfileSettings {
        match self {
            Profile::Primary => ProfileSettings {
                engines: vec![Engine::Chromium],
                workers: if ci { Some(1) } else { None },
                retries: if ci { 2 } else { 0 },
                forbid_only: ci,
                screenshot_policy: ScreenshotPolicy::OnlyOnFailure,
                tolerance: DiffTolerance::STRICT,
            },
            // Screenshot comparison is sensitive to resource contention, so
            // the full engine matrix is pinned to a single worker.
            Profile::CrossBrowser => ProfileSettings {
                engines: Engine::ALL.to_vec(),
                workers: Some(1),
                retries: 0,
                forbid_only: ci,
                screenshot_policy: ScreenshotPolicy::Always,
                tolerance: DiffTolerance::LENIENT,
            },
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Primary => f.write_str("primary"),
            Profile::CrossBrowser => f.write_str("cross-browser"),
        }
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Profile::Primary),
            "cross-browser" => Ok(Profile::CrossBrowser),
            other => Err(format!(
                "unknown profile: {other} (expected primary or cross-browser)"
            )),
        }
    }
}

/// CI detection: any value in the `CI` environment variable counts.
pub fn ci_from_env() -> bool {
    std::env::var_os("CI").is_some_and(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_is_parallel_locally_and_pinned_on_ci() {
        let local = Profile::Primary.settings(false);
        assert_eq!(local.engines, vec![Engine::Chromium]);
        assert_eq!(local.workers, None);
        assert_eq!(local.retries, 0);
        assert!(!local.forbid_only);

        let ci = Profile::Primary.settings(true);
        assert_eq!(ci.workers, Some(1));
        assert_eq!(ci.retries, 2);
        assert!(ci.forbid_only);
    }

    #[test]
    fn cross_browser_runs_all_engines_on_one_worker() {
        let settings = Profile::CrossBrowser.settings(false);
        assert_eq!(settings.engines.len(), 3);
        assert_eq!(settings.workers, Some(1));
        assert_eq!(settings.retries, 0);
        assert_eq!(settings.tolerance, DiffTolerance::LENIENT);
        assert_eq!(settings.screenshot_policy, ScreenshotPolicy::Always);
    }

    #[test]
    fn tolerances_match_the_two_policies() {
        assert_eq!(DiffTolerance::STRICT.max_diff_pixels, 100);
        assert_eq!(DiffTolerance::STRICT.threshold, 0.2);
        assert_eq!(DiffTolerance::LENIENT.max_diff_pixels, 500);
        assert_eq!(DiffTolerance::LENIENT.threshold, 0.3);
    }

    #[test]
    fn profile_parses_from_cli_strings() {
        assert_eq!("primary".parse::<Profile>().unwrap(), Profile::Primary);
        assert_eq!(
            "cross-browser".parse::<Profile>().unwrap(),
            Profile::CrossBrowser
        );
        assert!("nightly".parse::<Profile>().is_err());
    }
}
