//! Pagelens harness
//!
//! Browser-driving core of pagelens: captures screenshots of a static page
//! across a browser engine × viewport matrix, evaluates declarative layout
//! and ARIA assertions, compares images against stored baselines, and
//! writes the durable `results.json` summary.
//!
//! Browser control goes through Playwright: each run generates a Node
//! script, executes it, and reads newline-delimited JSON events back. The
//! page itself, its CSS engine, and report rendering are external; the
//! harness only asserts what the rendered page exposes.

pub mod capture;
pub mod driver;
pub mod error;
pub mod report;
pub mod runner;
pub mod server;
pub mod spec;
pub mod style;
pub mod toggle;
pub mod visual;

pub use capture::{CaptureConfig, CaptureOrchestrator};
pub use driver::{Driver, DriverConfig};
pub use error::{HarnessError, HarnessResult};
pub use runner::{CheckRunner, SpecResult, SuiteResult};
pub use spec::{TestSpec, TestStep};
pub use visual::{VisualConfig, VisualTester};
