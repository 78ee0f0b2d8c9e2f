//! Declarative YAML test specifications.
//!
//! A spec is a viewport plus an ordered list of steps: actions the browser
//! performs and assertions about what the rendered page exposes. Steps are
//! executed by the driver, which reports back the observed values; all
//! expected-vs-observed comparison happens here, on this side of the
//! process boundary.

use std::path::Path;

use serde::{Deserialize, Serialize};

use pagelens_common::viewport;
use pagelens_common::viewport::BREAKPOINT_MATRIX;

use crate::error::{HarnessError, HarnessResult};
use crate::style::{self, FlexDirection};

/// A complete test specification parsed from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Unique name for this test
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering tests
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport for the browsing context, by matrix name or explicit size
    #[serde(default = "default_viewport")]
    pub viewport: SpecViewport,

    /// Focus marker; forbidden on CI
    #[serde(default)]
    pub only: bool,

    /// Zero out animation and transition durations before screenshots
    #[serde(default)]
    pub disable_animations: bool,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,

    /// Compare this spec's screenshots against stored baselines
    #[serde(default)]
    pub visual_regression: bool,
}

fn default_viewport() -> SpecViewport {
    SpecViewport::Named("desktop".to_string())
}

/// Viewport reference: a name from the breakpoint matrices, or an explicit
/// size for one-off dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecViewport {
    Named(String),
    Size { width: u32, height: u32 },
}

impl SpecViewport {
    pub fn resolve(&self) -> HarnessResult<(u32, u32)> {
        match self {
            SpecViewport::Named(name) => viewport::by_name(name)
                .map(|v| (v.width, v.height))
                .ok_or_else(|| HarnessError::UnknownViewport(name.clone())),
            SpecViewport::Size { width, height } => Ok((*width, *height)),
        }
    }

    pub fn label(&self) -> String {
        match self {
            SpecViewport::Named(name) => name.clone(),
            SpecViewport::Size { width, height } => format!("{width}x{height}"),
        }
    }
}

/// A single step in a test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a URL (relative to base) and wait for network-idle
    Navigate {
        #[serde(default = "default_url")]
        url: String,
    },

    /// Click an element
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Press a key, on an element or on the page keyboard
    Press {
        #[serde(default)]
        selector: Option<String>,
        key: String,
    },

    /// Focus an element
    Focus { selector: String },

    /// Hover over an element
    Hover { selector: String },

    /// Wait for an element to reach a state
    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default)]
        state: WaitState,
    },

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },

    /// Take a screenshot, of the page or of one element
    Screenshot {
        name: String,
        #[serde(default)]
        selector: Option<String>,
        #[serde(default)]
        full_page: bool,
    },

    /// Assert observable properties of an element
    Assert {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        attribute: Option<AttributeExpectation>,
        #[serde(default)]
        count: Option<usize>,
        #[serde(default)]
        css: Option<CssExpectation>,
        #[serde(default)]
        grid_columns: Option<usize>,
        #[serde(default)]
        flex_direction: Option<FlexDirection>,
        #[serde(default)]
        focused: Option<bool>,
    },
}

fn default_url() -> String {
    "/".to_string()
}

fn default_wait_timeout() -> u64 {
    5000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

/// Expected attribute: value for exact match, contains for substring, or
/// neither to assert mere presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeExpectation {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub contains: Option<String>,
}

/// Expected computed-style value: exact string, or a minimum pixel length
/// for properties that resolve to lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CssExpectation {
    pub property: String,
    #[serde(default)]
    pub equals: Option<String>,
    #[serde(default)]
    pub min_px: Option<f64>,
}

/// Values the driver observed for one assert step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Observed {
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attribute: Option<ObservedAttribute>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub css: Option<String>,
    #[serde(default)]
    pub grid: Option<String>,
    #[serde(default)]
    pub flex: Option<String>,
    #[serde(default)]
    pub focused: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedAttribute {
    pub present: bool,
    #[serde(default)]
    pub value: Option<String>,
}

impl TestStep {
    /// Short label for logs and step results.
    pub fn describe(&self) -> String {
        match self {
            TestStep::Navigate { url } => format!("navigate:{url}"),
            TestStep::Click { selector, .. } => format!("click:{selector}"),
            TestStep::Press { key, .. } => format!("press:{key}"),
            TestStep::Focus { selector } => format!("focus:{selector}"),
            TestStep::Hover { selector } => format!("hover:{selector}"),
            TestStep::Wait { selector, .. } => format!("wait:{selector}"),
            TestStep::Sleep { ms } => format!("sleep:{ms}ms"),
            TestStep::Screenshot { name, .. } => format!("screenshot:{name}"),
            TestStep::Assert { selector, .. } => format!("assert:{selector}"),
        }
    }

    /// Compare an assert step's expectations against the observed values.
    /// Non-assert steps trivially pass.
    pub fn evaluate(&self, observed: &Observed) -> Result<(), String> {
        let TestStep::Assert {
            selector,
            visible,
            text_contains,
            attribute,
            count,
            css,
            grid_columns,
            flex_direction,
            focused,
        } = self
        else {
            return Ok(());
        };

        if let Some(expected) = visible {
            let got = observed
                .visible
                .ok_or_else(|| format!("{selector}: no visibility observed"))?;
            if got != *expected {
                let want = if *expected { "visible" } else { "hidden" };
                return Err(format!("{selector}: expected {want}, element is not"));
            }
        }

        if let Some(needle) = text_contains {
            let text = observed
                .text
                .as_deref()
                .ok_or_else(|| format!("{selector}: no text observed"))?;
            if !text.contains(needle.as_str()) {
                return Err(format!(
                    "{selector}: text {text:?} does not contain {needle:?}"
                ));
            }
        }

        if let Some(expectation) = attribute {
            let got = observed
                .attribute
                .as_ref()
                .ok_or_else(|| format!("{selector}: no attribute observed"))?;
            if !got.present {
                return Err(format!(
                    "{selector}: attribute {:?} is absent",
                    expectation.name
                ));
            }
            let value = got.value.as_deref().unwrap_or_default();
            if let Some(expected) = &expectation.value {
                if value != expected {
                    return Err(format!(
                        "{selector}: attribute {:?} is {value:?}, expected {expected:?}",
                        expectation.name
                    ));
                }
            }
            if let Some(needle) = &expectation.contains {
                if !value.contains(needle.as_str()) {
                    return Err(format!(
                        "{selector}: attribute {:?} is {value:?}, expected to contain {needle:?}",
                        expectation.name
                    ));
                }
            }
        }

        if let Some(expected) = count {
            let got = observed
                .count
                .ok_or_else(|| format!("{selector}: no count observed"))?;
            if got != *expected {
                return Err(format!("{selector}: count is {got}, expected {expected}"));
            }
        }

        if let Some(expectation) = css {
            let value = observed
                .css
                .as_deref()
                .ok_or_else(|| format!("{selector}: no computed style observed"))?;
            if let Some(expected) = &expectation.equals {
                if value.trim() != expected {
                    return Err(format!(
                        "{selector}: {} is {value:?}, expected {expected:?}",
                        expectation.property
                    ));
                }
            }
            if let Some(min) = expectation.min_px {
                let px = parse_px(value).ok_or_else(|| {
                    format!(
                        "{selector}: {} is {value:?}, not a pixel length",
                        expectation.property
                    )
                })?;
                if px < min {
                    return Err(format!(
                        "{selector}: {} is {px}px, expected at least {min}px",
                        expectation.property
                    ));
                }
            }
        }

        if let Some(expected) = grid_columns {
            let tracks = observed
                .grid
                .as_deref()
                .ok_or_else(|| format!("{selector}: no track list observed"))?;
            let got = style::parse_track_list(tracks).len();
            if got != *expected {
                return Err(format!(
                    "{selector}: grid has {got} column(s) ({tracks:?}), expected {expected}"
                ));
            }
        }

        if let Some(expected) = flex_direction {
            let raw = observed
                .flex
                .as_deref()
                .ok_or_else(|| format!("{selector}: no flex-direction observed"))?;
            let got: FlexDirection = raw.parse().map_err(|e| format!("{selector}: {e}"))?;
            if got != *expected {
                return Err(format!(
                    "{selector}: flex-direction is {got}, expected {expected}"
                ));
            }
        }

        if let Some(expected) = focused {
            let got = observed
                .focused
                .ok_or_else(|| format!("{selector}: no focus state observed"))?;
            if got != *expected {
                return Err(format!("{selector}: focused is {got}, expected {expected}"));
            }
        }

        Ok(())
    }
}

fn parse_px(value: &str) -> Option<f64> {
    value.trim().strip_suffix("px")?.trim().parse().ok()
}

impl TestSpec {
    /// Parse a test spec from a YAML string.
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        let spec: TestSpec = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a test spec from a YAML file.
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            HarnessError::Yaml(inner) => {
                HarnessError::Spec(format!("{}: {inner}", path.display()))
            }
            other => other,
        })
    }

    /// Load all test specs from a directory, in filename order so runs are
    /// deterministic.
    pub fn load_all(dir: &Path) -> HarnessResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            specs.push(Self::from_file(entry.path())?);
        }

        Ok(specs)
    }

    fn validate(&self) -> HarnessResult<()> {
        if self.steps.is_empty() {
            return Err(HarnessError::Spec(format!("{}: no steps", self.name)));
        }
        let (width, height) = self.viewport.resolve()?;
        if width == 0 || height == 0 {
            return Err(HarnessError::Spec(format!(
                "{}: viewport dimensions must be positive",
                self.name
            )));
        }
        Ok(())
    }

    /// Names of the screenshots this spec captures, in order.
    pub fn screenshot_names(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                TestStep::Screenshot { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// The generated fine-grained visual suite: one hero screenshot per
/// breakpoint in the matrix, 1920px down to 320px.
pub fn breakpoint_visual_specs(hero_selector: &str) -> Vec<TestSpec> {
    BREAKPOINT_MATRIX
        .iter()
        .map(|bp| TestSpec {
            name: format!("hero-at-{}", bp.name),
            description: format!("Hero rendering at {} ({}x{})", bp.name, bp.width, bp.height),
            tags: vec!["visual".to_string(), "breakpoints".to_string()],
            viewport: SpecViewport::Named(bp.name.to_string()),
            only: false,
            disable_animations: true,
            steps: vec![
                TestStep::Navigate {
                    url: "/".to_string(),
                },
                TestStep::Wait {
                    selector: hero_selector.to_string(),
                    timeout_ms: default_wait_timeout(),
                    state: WaitState::Visible,
                },
                TestStep::Screenshot {
                    name: format!("hero-{}", bp.name),
                    selector: Some(hero_selector.to_string()),
                    full_page: false,
                },
            ],
            visual_regression: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_layout_spec() {
        let yaml = r#"
name: hero-desktop-grid
description: Hero grid is two columns side by side at desktop widths
tags:
  - hero
  - layout
viewport: desktop
steps:
  - action: navigate
  - action: assert
    selector: '.hero-grid'
    visible: true
    css:
      property: display
      equals: grid
    grid_columns: 2
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "hero-desktop-grid");
        assert_eq!(spec.steps.len(), 2);
        assert_eq!(spec.viewport.resolve().unwrap(), (1440, 900));
        assert!(spec.has_tag("layout"));
    }

    #[test]
    fn parses_explicit_viewport_sizes() {
        let yaml = r#"
name: odd-size
viewport:
  width: 777
  height: 600
steps:
  - action: navigate
"#;
        let spec = TestSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.viewport.resolve().unwrap(), (777, 600));
        assert_eq!(spec.viewport.label(), "777x600");
    }

    #[test]
    fn unknown_viewport_names_are_rejected_at_parse_time() {
        let yaml = r#"
name: bad-viewport
viewport: ultrawide
steps:
  - action: navigate
"#;
        let err = TestSpec::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, HarnessError::UnknownViewport(name) if name == "ultrawide"));
    }

    #[test]
    fn specs_without_steps_are_rejected() {
        let yaml = "name: empty\nsteps: []\n";
        assert!(TestSpec::from_yaml(yaml).is_err());
    }

    #[test]
    fn evaluate_checks_grid_columns_through_the_track_parser() {
        let step = TestStep::Assert {
            selector: ".hero-grid".to_string(),
            visible: None,
            text_contains: None,
            attribute: None,
            count: None,
            css: None,
            grid_columns: Some(2),
            flex_direction: None,
            focused: None,
        };

        let two = Observed {
            grid: Some("714px 714px".to_string()),
            ..Default::default()
        };
        assert!(step.evaluate(&two).is_ok());

        let one = Observed {
            grid: Some("820px".to_string()),
            ..Default::default()
        };
        let err = step.evaluate(&one).unwrap_err();
        assert!(err.contains("1 column"));
    }

    #[test]
    fn evaluate_checks_attribute_value_and_substring() {
        let step = TestStep::Assert {
            selector: ".btn-secondary".to_string(),
            visible: None,
            text_contains: None,
            attribute: Some(AttributeExpectation {
                name: "href".to_string(),
                value: None,
                contains: Some("github.com".to_string()),
            }),
            count: None,
            css: None,
            grid_columns: None,
            flex_direction: None,
            focused: None,
        };

        let hit = Observed {
            attribute: Some(ObservedAttribute {
                present: true,
                value: Some("https://github.com/example/repo".to_string()),
            }),
            ..Default::default()
        };
        assert!(step.evaluate(&hit).is_ok());

        let absent = Observed {
            attribute: Some(ObservedAttribute {
                present: false,
                value: None,
            }),
            ..Default::default()
        };
        assert!(step.evaluate(&absent).is_err());
    }

    #[test]
    fn evaluate_checks_min_px_lengths() {
        let step = TestStep::Assert {
            selector: ".btn-primary".to_string(),
            visible: None,
            text_contains: None,
            attribute: None,
            count: None,
            css: Some(CssExpectation {
                property: "width".to_string(),
                equals: None,
                min_px: Some(200.0),
            }),
            grid_columns: None,
            flex_direction: None,
            focused: None,
        };

        let wide = Observed {
            css: Some("288.5px".to_string()),
            ..Default::default()
        };
        assert!(step.evaluate(&wide).is_ok());

        let narrow = Observed {
            css: Some("120px".to_string()),
            ..Default::default()
        };
        assert!(step.evaluate(&narrow).is_err());
    }

    #[test]
    fn breakpoint_suite_covers_the_whole_matrix() {
        let specs = breakpoint_visual_specs(".hero");
        assert_eq!(specs.len(), BREAKPOINT_MATRIX.len());
        assert_eq!(specs[0].name, "hero-at-large-desktop");
        assert_eq!(specs[8].name, "hero-at-mobile-small");
        for spec in &specs {
            assert!(spec.visual_regression);
            assert!(spec.disable_animations);
            assert_eq!(spec.screenshot_names().len(), 1);
            spec.viewport.resolve().unwrap();
        }
    }
}
