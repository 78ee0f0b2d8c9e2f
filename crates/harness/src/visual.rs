//! Visual regression: screenshot comparison against stored baselines.

use std::path::{Path, PathBuf};

use image::{GenericImageView, Pixel, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use pagelens_common::profile::DiffTolerance;

use crate::error::{HarnessError, HarnessResult};

/// Result of a visual comparison.
#[derive(Debug, Clone)]
pub struct VisualDiff {
    /// Whether the images match within the tolerance
    pub matches: bool,

    /// Number of differing pixels
    pub diff_pixels: u64,

    /// Total pixels compared
    pub total_pixels: u64,

    /// Differing fraction (0.0 - 1.0)
    pub diff_ratio: f64,

    /// Path to the diff image, when one was written
    pub diff_image_path: Option<PathBuf>,

    /// SHA-256 of the actual screenshot
    pub actual_hash: String,

    /// SHA-256 of the baseline screenshot
    pub baseline_hash: String,
}

#[derive(Debug, Clone)]
pub struct VisualConfig {
    pub baseline_dir: PathBuf,
    pub actual_dir: PathBuf,
    pub diff_dir: PathBuf,
    pub tolerance: DiffTolerance,
    /// Adopt the actual screenshot as baseline when none exists
    pub auto_update: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("test-results/baselines"),
            actual_dir: PathBuf::from("screenshots"),
            diff_dir: PathBuf::from("test-results/diffs"),
            tolerance: DiffTolerance::STRICT,
            auto_update: false,
        }
    }
}

/// Screenshot comparison against the baseline directory.
#[derive(Debug, Clone)]
pub struct VisualTester {
    baseline_dir: PathBuf,
    actual_dir: PathBuf,
    diff_dir: PathBuf,
    tolerance: DiffTolerance,
    auto_update: bool,
}

impl VisualTester {
    pub fn new(config: VisualConfig) -> HarnessResult<Self> {
        std::fs::create_dir_all(&config.baseline_dir)?;
        std::fs::create_dir_all(&config.actual_dir)?;
        std::fs::create_dir_all(&config.diff_dir)?;

        Ok(Self {
            baseline_dir: config.baseline_dir,
            actual_dir: config.actual_dir,
            diff_dir: config.diff_dir,
            tolerance: config.tolerance,
            auto_update: config.auto_update,
        })
    }

    /// Compare a named screenshot against its baseline.
    pub fn compare(&self, name: &str, tolerance: Option<DiffTolerance>) -> HarnessResult<VisualDiff> {
        let tolerance = tolerance.unwrap_or(self.tolerance);

        let actual_path = self.actual_dir.join(format!("{name}.png"));
        let baseline_path = self.baseline_dir.join(format!("{name}.png"));

        if !actual_path.exists() {
            return Err(HarnessError::Spec(format!(
                "actual screenshot not found: {}",
                actual_path.display()
            )));
        }

        if !baseline_path.exists() {
            if self.auto_update {
                info!("adopting baseline for '{name}'");
                std::fs::copy(&actual_path, &baseline_path)?;

                let hash = hash_file(&actual_path)?;
                return Ok(VisualDiff {
                    matches: true,
                    diff_pixels: 0,
                    total_pixels: 0,
                    diff_ratio: 0.0,
                    diff_image_path: None,
                    actual_hash: hash.clone(),
                    baseline_hash: hash,
                });
            }
            return Err(HarnessError::BaselineNotFound(
                baseline_path.to_string_lossy().to_string(),
            ));
        }

        let actual_hash = hash_file(&actual_path)?;
        let baseline_hash = hash_file(&baseline_path)?;

        let actual_img = image::open(&actual_path)?;
        let baseline_img = image::open(&baseline_path)?;

        // Identical bytes: nothing to diff.
        if actual_hash == baseline_hash {
            debug!("'{name}' matches baseline exactly");
            let (w, h) = actual_img.dimensions();
            return Ok(VisualDiff {
                matches: true,
                diff_pixels: 0,
                total_pixels: u64::from(w) * u64::from(h),
                diff_ratio: 0.0,
                diff_image_path: None,
                actual_hash,
                baseline_hash,
            });
        }

        let (aw, ah) = actual_img.dimensions();
        let (bw, bh) = baseline_img.dimensions();
        if (aw, ah) != (bw, bh) {
            warn!("'{name}' dimensions differ: actual {aw}x{ah} vs baseline {bw}x{bh}");
        }

        let actual_rgba = actual_img.to_rgba8();
        let baseline_rgba = baseline_img.to_rgba8();

        let overlap_w = aw.min(bw);
        let overlap_h = ah.min(bh);
        let total_pixels = u64::from(aw.max(bw)) * u64::from(ah.max(bh));
        // Pixels outside the overlap exist in only one image and count as
        // differing.
        let mut diff_pixels = total_pixels - u64::from(overlap_w) * u64::from(overlap_h);

        let mut diff_img = RgbaImage::new(aw, ah);
        for y in 0..overlap_h {
            for x in 0..overlap_w {
                let actual_pixel = actual_rgba.get_pixel(x, y);
                let baseline_pixel = baseline_rgba.get_pixel(x, y);

                if pixels_differ(actual_pixel, baseline_pixel, tolerance.threshold) {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
                } else {
                    let channels = actual_pixel.channels();
                    diff_img.put_pixel(
                        x,
                        y,
                        image::Rgba([channels[0] / 2, channels[1] / 2, channels[2] / 2, 128]),
                    );
                }
            }
        }

        let diff_ratio = diff_pixels as f64 / total_pixels as f64;
        let matches = diff_pixels <= tolerance.max_diff_pixels;

        let diff_image_path = if diff_pixels > 0 {
            let path = self.diff_dir.join(format!("{name}-diff.png"));
            diff_img.save(&path)?;
            Some(path)
        } else {
            None
        };

        if !matches {
            warn!(
                "visual regression in '{name}': {diff_pixels} pixels differ (allowed: {})",
                tolerance.max_diff_pixels
            );
        }

        Ok(VisualDiff {
            matches,
            diff_pixels,
            total_pixels,
            diff_ratio,
            diff_image_path,
            actual_hash,
            baseline_hash,
        })
    }

    /// Adopt the actual screenshot as the new baseline.
    pub fn update_baseline(&self, name: &str) -> HarnessResult<()> {
        let actual_path = self.actual_dir.join(format!("{name}.png"));
        let baseline_path = self.baseline_dir.join(format!("{name}.png"));

        if !actual_path.exists() {
            return Err(HarnessError::Spec(format!(
                "cannot update baseline: actual screenshot not found: {}",
                actual_path.display()
            )));
        }

        std::fs::copy(&actual_path, &baseline_path)?;
        info!("updated baseline for '{name}'");
        Ok(())
    }

    /// Adopt every actual screenshot as a baseline.
    pub fn update_all_baselines(&self) -> HarnessResult<Vec<String>> {
        let mut updated = Vec::new();
        for name in png_stems(&self.actual_dir)? {
            self.update_baseline(&name)?;
            updated.push(name);
        }
        updated.sort();
        Ok(updated)
    }

    pub fn list_baselines(&self) -> HarnessResult<Vec<String>> {
        let mut baselines = png_stems(&self.baseline_dir)?;
        baselines.sort();
        Ok(baselines)
    }

    /// Remove stale diff images from previous runs.
    pub fn clean_diffs(&self) -> HarnessResult<()> {
        for entry in std::fs::read_dir(&self.diff_dir)? {
            let entry = entry?;
            if entry.path().extension().map(|e| e == "png").unwrap_or(false) {
                std::fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

/// Per-channel comparison: a pixel differs when any channel's normalized
/// distance exceeds the threshold.
fn pixels_differ(a: &image::Rgba<u8>, b: &image::Rgba<u8>, threshold: f64) -> bool {
    let a_channels = a.channels();
    let b_channels = b.channels();

    for i in 0..4 {
        let diff = (f64::from(a_channels[i]) - f64::from(b_channels[i])).abs() / 255.0;
        if diff > threshold {
            return true;
        }
    }

    false
}

fn hash_file(path: &Path) -> HarnessResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn png_stems(dir: &Path) -> HarnessResult<Vec<String>> {
    let mut stems = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().map(|e| e == "png").unwrap_or(false) {
            if let Some(name) = path.file_stem() {
                stems.push(name.to_string_lossy().to_string());
            }
        }
    }
    Ok(stems)
}
