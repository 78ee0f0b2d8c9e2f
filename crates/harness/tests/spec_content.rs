//! The shipped spec files stay parseable and consistent with the page's
//! layout expectations.

use std::path::PathBuf;

use pagelens_harness::spec::{TestSpec, TestStep};
use pagelens_harness::style;

fn shipped_specs() -> Vec<TestSpec> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../specs");
    TestSpec::load_all(&dir).expect("shipped specs parse")
}

#[test]
fn all_shipped_specs_parse_and_resolve_their_viewports() {
    let specs = shipped_specs();
    assert!(!specs.is_empty());

    for spec in &specs {
        spec.viewport.resolve().unwrap();
        assert!(!spec.steps.is_empty(), "{} has no steps", spec.name);
        assert!(!spec.only, "{} must not ship focused", spec.name);
    }
}

#[test]
fn spec_names_are_unique() {
    let specs = shipped_specs();
    let mut names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), specs.len());
}

#[test]
fn every_spec_starts_with_a_navigation() {
    for spec in shipped_specs() {
        assert!(
            matches!(spec.steps[0], TestStep::Navigate { .. }),
            "{} does not navigate first",
            spec.name
        );
    }
}

/// Each layout spec's grid-column expectation agrees with the breakpoint
/// rule for its viewport width.
#[test]
fn grid_expectations_match_the_column_threshold() {
    let mut checked = 0;
    for spec in shipped_specs() {
        let (width, _) = spec.viewport.resolve().unwrap();
        for step in &spec.steps {
            if let TestStep::Assert {
                grid_columns: Some(expected),
                ..
            } = step
            {
                assert_eq!(
                    *expected,
                    style::expected_grid_columns(width),
                    "{}: grid expectation disagrees with width {width}",
                    spec.name
                );
                checked += 1;
            }
        }
    }
    assert!(checked >= 3, "expected grid assertions across the layout specs");
}

#[test]
fn stats_direction_expectations_match_the_stack_boundary() {
    let mut checked = 0;
    for spec in shipped_specs() {
        let (width, _) = spec.viewport.resolve().unwrap();
        for step in &spec.steps {
            if let TestStep::Assert {
                selector,
                flex_direction: Some(expected),
                ..
            } = step
            {
                if selector == ".hero-stats" {
                    assert_eq!(
                        *expected,
                        style::expected_stats_direction(width),
                        "{}: stats direction disagrees with width {width}",
                        spec.name
                    );
                    checked += 1;
                }
            }
        }
    }
    assert!(checked >= 3, "expected stats assertions across the layout specs");
}

#[test]
fn visual_specs_disable_animations_before_capturing() {
    for spec in shipped_specs() {
        if spec.visual_regression {
            assert!(
                spec.disable_animations,
                "{} captures screenshots with animations enabled",
                spec.name
            );
            assert!(!spec.screenshot_names().is_empty());
        }
    }
}

#[test]
fn screenshot_names_are_globally_unique() {
    let mut names: Vec<String> = Vec::new();
    for spec in shipped_specs() {
        for name in spec.screenshot_names() {
            names.push(name.to_string());
        }
    }
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total, "duplicate screenshot names collide on disk");
}
