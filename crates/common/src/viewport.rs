//! Viewport definitions and the breakpoint matrices.
//!
//! Both matrices are ordered constants. Every consumer iterates the same
//! ordered set, so screenshot filenames stay deterministic and diffable
//! across runs.

use serde::Serialize;

/// A named width × height pair defining the simulated browser window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(name: &'static str, width: u32, height: u32) -> Self {
        Self {
            name,
            width,
            height,
        }
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}x{})", self.name, self.width, self.height)
    }
}

/// The capture matrix: desktop, tablet, and mobile layouts, in the order
/// screenshots are taken for every engine.
pub const CAPTURE_MATRIX: [Viewport; 3] = [
    Viewport::new("desktop", 1440, 900),
    Viewport::new("tablet", 900, 1024),
    Viewport::new("mobile", 375, 667),
];

/// The fine-grained breakpoint matrix used by the dedicated visual
/// regression suite, from 1920px down to 320px.
pub const BREAKPOINT_MATRIX: [Viewport; 9] = [
    Viewport::new("large-desktop", 1920, 1080),
    Viewport::new("desktop", 1440, 900),
    Viewport::new("small-desktop", 1200, 800),
    Viewport::new("tablet-landscape", 1024, 768),
    Viewport::new("tablet", 900, 1024),
    Viewport::new("tablet-portrait", 768, 1024),
    Viewport::new("mobile-large", 414, 896),
    Viewport::new("mobile", 375, 667),
    Viewport::new("mobile-small", 320, 568),
];

/// Look up a viewport by name, searching the capture matrix first and then
/// the breakpoint matrix. Names shared between the two (e.g. `desktop`)
/// resolve to identical dimensions.
pub fn by_name(name: &str) -> Option<Viewport> {
    CAPTURE_MATRIX
        .iter()
        .chain(BREAKPOINT_MATRIX.iter())
        .find(|v| v.name == name)
        .copied()
}
