//! Pagelens Common Library
//!
//! Shared data model for the pagelens harness: the viewport breakpoint
//! matrices, the browser engine set, run profiles, and the typed per-engine
//! capture reports that every other crate consumes.

pub mod engine;
pub mod profile;
pub mod report;
pub mod viewport;

// Re-export commonly used types
pub use engine::{Engine, ParseEngineError};
pub use profile::{DiffTolerance, Profile, ProfileSettings, ScreenshotPolicy};
pub use report::{EngineReport, LaunchOutcome, ViewportCapture, ViewportOutcome};
pub use viewport::{Viewport, BREAKPOINT_MATRIX, CAPTURE_MATRIX};

/// Pagelens version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
