//! Error types for the harness.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("node runtime or playwright not found. Install Node.js and run: npx playwright install")]
    DriverNotFound,

    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation did not reach network-idle within {timeout_ms} ms: {url}")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("spec error: {0}")]
    Spec(String),

    #[error("unknown viewport: {0}")]
    UnknownViewport(String),

    #[error("suite contains 'only'-marked specs, which is forbidden on CI: {0}")]
    OnlyForbidden(String),

    #[error("baseline not found: {0}")]
    BaselineNotFound(String),

    #[error("screenshot mismatch: {name} differs by {diff_pixels} pixels (allowed: {max_diff_pixels})")]
    ScreenshotMismatch {
        name: String,
        diff_pixels: u64,
        max_diff_pixels: u64,
    },

    #[error("server failed to start: {0}")]
    ServerStartup(String),

    #[error("server not ready after {0} attempts")]
    ServerReadiness(usize),

    #[error("driver protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
