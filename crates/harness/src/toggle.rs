//! Model of the hero instructions toggle.
//!
//! The page's one piece of interactive state: two tabs (`agent` / `human`)
//! controlling two terminal panels. Selecting a mode activates its tab,
//! deactivates the other, and swaps the panel visibility in lockstep;
//! selecting the already-active mode changes nothing observable. The model
//! is the oracle for the interactive suite: given any activation sequence it
//! yields the expected ARIA and visibility observables, from which the
//! click/assert step sequences are generated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spec::{SpecViewport, TestSpec, TestStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Agent,
    Human,
}

impl Mode {
    pub const BOTH: [Mode; 2] = [Mode::Agent, Mode::Human];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Agent => "agent",
            Mode::Human => "human",
        }
    }

    pub fn other(&self) -> Mode {
        match self {
            Mode::Agent => Mode::Human,
            Mode::Human => Mode::Agent,
        }
    }

    /// Selector for the mode's tab button.
    pub fn tab_selector(&self) -> String {
        format!("[data-mode=\"{}\"]", self.as_str())
    }

    /// Selector for the terminal panel the tab controls.
    pub fn panel_selector(&self) -> String {
        format!("#terminal-{}", self.as_str())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tab gets activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Click,
    /// Focus the tab and press Enter.
    Keyboard,
}

/// The toggle's full state. Fresh per page load; nothing survives a
/// navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleModel {
    active: Mode,
}

impl Default for ToggleModel {
    fn default() -> Self {
        Self { active: Mode::Agent }
    }
}

impl ToggleModel {
    pub fn active(&self) -> Mode {
        self.active
    }

    /// Activate `mode`. Returns whether anything observable changed;
    /// selecting the active mode is a no-op.
    pub fn select(&mut self, mode: Mode) -> bool {
        let changed = self.active != mode;
        self.active = mode;
        changed
    }

    pub fn aria_selected(&self, mode: Mode) -> bool {
        self.active == mode
    }

    pub fn panel_visible(&self, mode: Mode) -> bool {
        self.active == mode
    }

    /// Assert steps pinning the complete observable state: both tabs'
    /// `aria-selected` and both panels' visibility.
    pub fn assertion_steps(&self) -> Vec<TestStep> {
        let mut steps = Vec::with_capacity(4);
        for mode in Mode::BOTH {
            steps.push(assert_attribute(
                &mode.tab_selector(),
                "aria-selected",
                if self.aria_selected(mode) { "true" } else { "false" },
            ));
            steps.push(assert_visible(&mode.panel_selector(), self.panel_visible(mode)));
        }
        steps
    }
}

fn assert_attribute(selector: &str, name: &str, value: &str) -> TestStep {
    TestStep::Assert {
        selector: selector.to_string(),
        visible: None,
        text_contains: None,
        attribute: Some(crate::spec::AttributeExpectation {
            name: name.to_string(),
            value: Some(value.to_string()),
            contains: None,
        }),
        count: None,
        css: None,
        grid_columns: None,
        flex_direction: None,
        focused: None,
    }
}

fn assert_visible(selector: &str, visible: bool) -> TestStep {
    TestStep::Assert {
        selector: selector.to_string(),
        visible: Some(visible),
        text_contains: None,
        attribute: None,
        count: None,
        css: None,
        grid_columns: None,
        flex_direction: None,
        focused: None,
    }
}

fn activation_steps(mode: Mode, how: Activation) -> Vec<TestStep> {
    match how {
        Activation::Click => vec![TestStep::Click {
            selector: mode.tab_selector(),
            timeout_ms: None,
        }],
        Activation::Keyboard => vec![
            TestStep::Focus {
                selector: mode.tab_selector(),
            },
            TestStep::Press {
                selector: None,
                key: "Enter".to_string(),
            },
        ],
    }
}

/// Build a spec that plays an activation sequence against the live page and
/// asserts the model-predicted observables after the initial load and after
/// every activation.
pub fn sequence_spec(name: &str, activations: &[(Mode, Activation)]) -> TestSpec {
    let mut model = ToggleModel::default();
    let mut steps = vec![TestStep::Navigate {
        url: "/".to_string(),
    }];
    steps.extend(model.assertion_steps());

    for &(mode, how) in activations {
        steps.extend(activation_steps(mode, how));
        model.select(mode);
        steps.extend(model.assertion_steps());
    }

    TestSpec {
        name: name.to_string(),
        description: "Hero toggle mutual exclusion".to_string(),
        tags: vec!["interactive".to_string(), "toggle".to_string()],
        viewport: SpecViewport::Named("desktop".to_string()),
        only: false,
        disable_animations: false,
        steps,
        visual_regression: false,
    }
}

/// The interactive suite: pointer switching both ways, idempotent
/// re-selection, and keyboard activation.
pub fn builtin_specs() -> Vec<TestSpec> {
    vec![
        sequence_spec("toggle-initial-state", &[]),
        sequence_spec(
            "toggle-switch-to-human",
            &[(Mode::Human, Activation::Click)],
        ),
        sequence_spec(
            "toggle-switch-back-to-agent",
            &[(Mode::Human, Activation::Click), (Mode::Agent, Activation::Click)],
        ),
        sequence_spec(
            "toggle-reselect-is-a-noop",
            &[(Mode::Agent, Activation::Click), (Mode::Agent, Activation::Click)],
        ),
        sequence_spec(
            "toggle-keyboard-activation",
            &[
                (Mode::Agent, Activation::Keyboard),
                (Mode::Human, Activation::Keyboard),
            ],
        ),
    ]
}
