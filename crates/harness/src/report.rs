//! Durable run results.
//!
//! `results.json` is the flat `{engineName: bool}` record consumed by CI
//! dashboards. The map is ordered and the serialization pretty-printed, so
//! two runs with the same outcomes produce byte-identical files.

use std::path::{Path, PathBuf};

use tracing::info;

use pagelens_common::report::{summarize, EngineReport};

use crate::error::HarnessResult;

pub const RESULTS_FILE: &str = "results.json";

/// Fold the engine reports and overwrite `results.json` in `dir`. The write
/// is a plain overwrite, not a temp-file-and-rename; a crash mid-write can
/// leave a truncated file.
pub fn write_results(reports: &[EngineReport], dir: &Path) -> HarnessResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = dir.join(RESULTS_FILE);
    let summary = summarize(reports);
    let json = serde_json::to_string_pretty(&summary)?;
    std::fs::write(&path, json)?;

    info!("results written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelens_common::report::LaunchOutcome;
    use pagelens_common::Engine;

    fn reports() -> Vec<EngineReport> {
        vec![
            EngineReport {
                engine: Engine::Chromium,
                launch: LaunchOutcome::Launched,
                viewports: vec![],
            },
            EngineReport {
                engine: Engine::Firefox,
                launch: LaunchOutcome::Launched,
                viewports: vec![],
            },
            EngineReport::launch_failed(Engine::Webkit, "no system webkit"),
        ]
    }

    #[test]
    fn results_file_has_one_boolean_per_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_results(&reports(), dir.path()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: std::collections::BTreeMap<String, bool> =
            serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed["chromium"], true);
        assert_eq!(parsed["webkit"], false);
    }

    #[test]
    fn unchanged_outcomes_produce_byte_identical_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_results(&reports(), dir.path()).unwrap();
        let first = std::fs::read(&path).unwrap();

        write_results(&reports(), dir.path()).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn rewrites_clobber_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(RESULTS_FILE), "{\"stale\": true}").unwrap();

        let path = write_results(&reports(), dir.path()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
    }
}
