//! Shape of a full capture run: event folding, file naming, and the
//! durable results.json record.

use std::path::Path;

use pagelens_common::report::{summarize, ViewportOutcome};
use pagelens_common::viewport::CAPTURE_MATRIX;
use pagelens_common::Engine;
use pagelens_harness::capture::{events_to_report, screenshot_file_name, ShotKind};
use pagelens_harness::driver::DriverEvent;
use pagelens_harness::report::{write_results, RESULTS_FILE};

/// A clean engine run: every capture-matrix viewport captured, hero visible
/// everywhere except mobile.
fn clean_run_events() -> Vec<DriverEvent> {
    let mut events = vec![DriverEvent::Launched];
    for vp in &CAPTURE_MATRIX {
        events.push(DriverEvent::ViewportCaptured {
            name: vp.name.to_string(),
            hero: vp.name != "mobile",
        });
    }
    events.push(DriverEvent::Done);
    events
}

#[test]
fn three_by_three_run_produces_three_booleans_and_nine_full_shots() {
    let dir = tempfile::tempdir().unwrap();
    let shots = dir.path().join("screenshots");

    let reports: Vec<_> = Engine::ALL
        .iter()
        .map(|&engine| events_to_report(engine, &clean_run_events(), &shots))
        .collect();

    let mut full_shots = Vec::new();
    for report in &reports {
        assert!(report.passed());
        assert_eq!(report.viewports.len(), 3);
        for vp in &report.viewports {
            match &vp.outcome {
                ViewportOutcome::Captured { full, .. } => full_shots.push(full.clone()),
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }
    assert_eq!(full_shots.len(), 9);

    let path = write_results(&reports, dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), RESULTS_FILE);

    let parsed: std::collections::BTreeMap<String, bool> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed.len(), 3);
    assert!(parsed.values().all(|&v| v));
}

#[test]
fn full_shot_paths_follow_the_naming_scheme() {
    let report = events_to_report(Engine::Chromium, &clean_run_events(), Path::new("shots"));

    for (vp, capture) in CAPTURE_MATRIX.iter().zip(&report.viewports) {
        let ViewportOutcome::Captured { full, hero } = &capture.outcome else {
            panic!("viewport not captured");
        };
        assert_eq!(
            full.file_name().unwrap().to_string_lossy(),
            screenshot_file_name(Engine::Chromium, vp.name, ShotKind::Full)
        );
        if let Some(hero) = hero {
            assert_eq!(
                hero.file_name().unwrap().to_string_lossy(),
                screenshot_file_name(Engine::Chromium, vp.name, ShotKind::Hero)
            );
        }
    }
}

#[test]
fn hero_shot_is_recorded_only_where_the_hero_was_visible() {
    let report = events_to_report(Engine::Firefox, &clean_run_events(), Path::new("shots"));

    let hero_shots: Vec<_> = report
        .viewports
        .iter()
        .filter_map(|vp| match &vp.outcome {
            ViewportOutcome::Captured { hero, .. } => hero.as_ref(),
            _ => None,
        })
        .collect();
    // Hero hidden at mobile in the fixture: two hero shots, not three.
    assert_eq!(hero_shots.len(), 2);
}

#[test]
fn engine_boolean_reflects_launch_not_viewport_failures() {
    let dir = tempfile::tempdir().unwrap();

    let mixed = vec![
        DriverEvent::Launched,
        DriverEvent::ViewportCaptured {
            name: "desktop".to_string(),
            hero: true,
        },
        DriverEvent::ViewportTimeout {
            name: "tablet".to_string(),
            error: "Timeout 30000ms exceeded".to_string(),
        },
        DriverEvent::ViewportError {
            name: "mobile".to_string(),
            error: "locator resolved to hidden element".to_string(),
        },
        DriverEvent::Done,
    ];

    let reports = vec![
        events_to_report(Engine::Chromium, &mixed, dir.path()),
        events_to_report(
            Engine::Firefox,
            &[DriverEvent::LaunchError {
                error: "browserType.launch failed".to_string(),
            }],
            dir.path(),
        ),
    ];

    let summary = summarize(&reports);
    // Two viewports failed, but chromium launched: still true.
    assert_eq!(summary["chromium"], true);
    assert_eq!(summary["firefox"], false);
}

#[test]
fn rerunning_an_unchanged_matrix_reproduces_results_json_byte_for_byte() {
    let dir = tempfile::tempdir().unwrap();

    let reports: Vec<_> = Engine::ALL
        .iter()
        .map(|&engine| events_to_report(engine, &clean_run_events(), dir.path()))
        .collect();

    let path = write_results(&reports, dir.path()).unwrap();
    let first = std::fs::read(&path).unwrap();

    let reports_again: Vec<_> = Engine::ALL
        .iter()
        .map(|&engine| events_to_report(engine, &clean_run_events(), dir.path()))
        .collect();
    write_results(&reports_again, dir.path()).unwrap();

    assert_eq!(first, std::fs::read(&path).unwrap());
}
