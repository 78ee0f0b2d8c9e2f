//! Playwright driver.
//!
//! The harness controls browsers by generating a Node script per run and
//! executing it with `node`; the script reports progress as one JSON object
//! per stdout line, which is parsed back into [`DriverEvent`]s. Keeping the
//! protocol to newline-delimited JSON means a crashed script still yields
//! every event emitted before the crash.

use std::path::PathBuf;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use pagelens_common::profile::ScreenshotPolicy;
use pagelens_common::{Engine, Viewport};

use crate::error::{HarnessError, HarnessResult};
use crate::spec::{Observed, TestSpec, TestStep};

/// Configuration for the driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Base URL of the served page
    pub base_url: String,

    /// Directory screenshots are written into
    pub screenshot_dir: PathBuf,

    /// Browser channel override (e.g. an installed `chrome` binary);
    /// applies to the chromium engine only
    pub channel: Option<String>,

    /// Bound on every navigation's network-idle wait
    pub navigation_timeout_ms: u64,

    pub headless: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            screenshot_dir: PathBuf::from("screenshots"),
            channel: None,
            navigation_timeout_ms: 30_000,
            headless: true,
        }
    }
}

/// One JSON line of driver output.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DriverEvent {
    Launched,
    LaunchError {
        error: String,
    },
    ViewportCaptured {
        name: String,
        hero: bool,
    },
    ViewportTimeout {
        name: String,
        error: String,
    },
    ViewportError {
        name: String,
        error: String,
    },
    Step {
        index: usize,
        ok: bool,
        #[serde(default)]
        observed: Option<Observed>,
        #[serde(default)]
        error: Option<String>,
    },
    Done,
}

#[derive(Debug, Clone)]
pub struct Driver {
    config: DriverConfig,
}

impl Driver {
    pub fn new(config: DriverConfig) -> HarnessResult<Self> {
        Self::check_installed()?;
        std::fs::create_dir_all(&config.screenshot_dir)?;
        Ok(Self { config })
    }

    /// Check that node and playwright are available.
    fn check_installed() -> HarnessResult<()> {
        let status = std::process::Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(HarnessError::DriverNotFound),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn screenshot_path(&self, name: &str) -> PathBuf {
        self.config.screenshot_dir.join(format!("{name}.png"))
    }

    fn launch_options(&self, engine: Engine) -> String {
        match (&self.config.channel, engine) {
            (Some(channel), Engine::Chromium) => format!(
                "{{ headless: {}, channel: {} }}",
                self.config.headless,
                js_str(channel)
            ),
            _ => format!("{{ headless: {} }}", self.config.headless),
        }
    }

    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.config.base_url.trim_end_matches('/'), url)
        }
    }

    /// Script for one engine's capture run: launch once, then one isolated
    /// context per viewport, full-page screenshot plus a hero crop when the
    /// hero region is visible. Per-viewport failures are reported and the
    /// loop continues.
    pub fn capture_script(
        &self,
        engine: Engine,
        viewports: &[Viewport],
        hero_selector: &str,
    ) -> String {
        let dir = self.config.screenshot_dir.to_string_lossy();
        let viewports_json =
            serde_json::to_string(viewports).expect("viewport constants serialize");

        format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

const emit = (obj) => console.log(JSON.stringify(obj));

(async () => {{
  let browser;
  try {{
    browser = await {engine}.launch({launch_opts});
  }} catch (err) {{
    emit({{ event: 'launch_error', error: String((err && err.message) || err) }});
    process.exit(1);
  }}
  emit({{ event: 'launched' }});

  const dir = {dir_js};
  const viewports = {viewports_json};
  for (const vp of viewports) {{
    const context = await browser.newContext({{
      viewport: {{ width: vp.width, height: vp.height }},
    }});
    const page = await context.newPage();
    try {{
      await page.goto({url_js}, {{ waitUntil: 'networkidle', timeout: {nav_timeout} }});
      await page.screenshot({{
        path: `${{dir}}/{engine}-${{vp.name}}-full.png`,
        fullPage: true,
      }});
      let hero = false;
      const heroRegion = page.locator({hero_js});
      if (await heroRegion.isVisible()) {{
        await heroRegion.screenshot({{ path: `${{dir}}/{engine}-${{vp.name}}-hero.png` }});
        hero = true;
      }}
      emit({{ event: 'viewport_captured', name: vp.name, hero }});
    }} catch (err) {{
      const error = String((err && err.message) || err);
      const event = err && err.name === 'TimeoutError' ? 'viewport_timeout' : 'viewport_error';
      emit({{ event, name: vp.name, error }});
    }} finally {{
      await context.close();
    }}
  }}

  await browser.close();
  emit({{ event: 'done' }});
}})();
"#,
            engine = engine.as_str(),
            launch_opts = self.launch_options(engine),
            dir_js = js_str(&dir),
            viewports_json = viewports_json,
            url_js = js_str(&self.resolve_url("/")),
            nav_timeout = self.config.navigation_timeout_ms,
            hero_js = js_str(hero_selector),
        )
    }

    /// Script for one spec run: launch, one context at the spec's viewport,
    /// then the steps in order. Assert steps gather observed values and
    /// report them; comparison happens on the Rust side.
    pub fn spec_script(
        &self,
        engine: Engine,
        spec: &TestSpec,
        policy: ScreenshotPolicy,
    ) -> HarnessResult<String> {
        let (width, height) = spec.viewport.resolve()?;

        let mut body = String::new();
        for (i, step) in spec.steps.iter().enumerate() {
            body.push_str(&format!("    current = {i};\n"));
            body.push_str(&self.step_js(step, i, spec.disable_animations));
        }

        if policy == ScreenshotPolicy::Always {
            body.push_str(&format!(
                "    await page.screenshot({{ path: {} }});\n",
                js_str(&self.screenshot_path(&format!("{}-final", spec.name)).to_string_lossy()),
            ));
        }

        let failure_shot = format!(
            r#"    try {{
      await page.screenshot({{ path: {} }});
    }} catch (_ignored) {{}}
"#,
            js_str(&self.screenshot_path(&format!("{}-failure", spec.name)).to_string_lossy()),
        );

        Ok(format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

const emit = (obj) => console.log(JSON.stringify(obj));

(async () => {{
  let browser;
  try {{
    browser = await {engine}.launch({launch_opts});
  }} catch (err) {{
    emit({{ event: 'launch_error', error: String((err && err.message) || err) }});
    process.exit(1);
  }}
  emit({{ event: 'launched' }});

  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }},
  }});
  const page = await context.newPage();
  let current = 0;
  try {{
{body}  }} catch (err) {{
    emit({{ event: 'step', index: current, ok: false, error: String((err && err.message) || err) }});
{failure_shot}    process.exitCode = 1;
  }} finally {{
    await context.close();
    await browser.close();
    emit({{ event: 'done' }});
  }}
}})();
"#,
            engine = engine.as_str(),
            launch_opts = self.launch_options(engine),
            width = width,
            height = height,
            body = body,
            failure_shot = failure_shot,
        ))
    }

    fn step_js(&self, step: &TestStep, index: usize, disable_animations: bool) -> String {
        match step {
            TestStep::Navigate { url } => {
                let mut code = format!(
                    "    await page.goto({}, {{ waitUntil: 'networkidle', timeout: {} }});\n",
                    js_str(&self.resolve_url(url)),
                    self.config.navigation_timeout_ms,
                );
                if disable_animations {
                    code.push_str(
                        "    await page.addStyleTag({ content: '*, *::before, *::after { animation-duration: 0s !important; animation-delay: 0s !important; transition-duration: 0s !important; transition-delay: 0s !important; }' });\n",
                    );
                }
                code.push_str(&ok_event(index));
                code
            }
            TestStep::Click {
                selector,
                timeout_ms,
            } => {
                let timeout = timeout_ms.unwrap_or(5000);
                format!(
                    "    await page.click({}, {{ timeout: {timeout} }});\n{}",
                    js_str(selector),
                    ok_event(index),
                )
            }
            TestStep::Press { selector, key } => {
                let code = match selector {
                    Some(sel) => format!(
                        "    await page.locator({}).press({});\n",
                        js_str(sel),
                        js_str(key)
                    ),
                    None => format!("    await page.keyboard.press({});\n", js_str(key)),
                };
                format!("{code}{}", ok_event(index))
            }
            TestStep::Focus { selector } => {
                format!(
                    "    await page.focus({});\n{}",
                    js_str(selector),
                    ok_event(index)
                )
            }
            TestStep::Hover { selector } => {
                format!(
                    "    await page.hover({});\n{}",
                    js_str(selector),
                    ok_event(index)
                )
            }
            TestStep::Wait {
                selector,
                timeout_ms,
                state,
            } => {
                format!(
                    "    await page.waitForSelector({}, {{ state: '{}', timeout: {timeout_ms} }});\n{}",
                    js_str(selector),
                    state.as_str(),
                    ok_event(index),
                )
            }
            TestStep::Sleep { ms } => {
                format!("    await page.waitForTimeout({ms});\n{}", ok_event(index))
            }
            TestStep::Screenshot {
                name,
                selector,
                full_page,
            } => {
                let path = js_str(&self.screenshot_path(name).to_string_lossy());
                let code = match selector {
                    Some(sel) => format!(
                        "    await page.locator({}).screenshot({{ path: {path} }});\n",
                        js_str(sel)
                    ),
                    None => format!(
                        "    await page.screenshot({{ path: {path}, fullPage: {full_page} }});\n"
                    ),
                };
                format!("{code}{}", ok_event(index))
            }
            TestStep::Assert {
                selector,
                visible,
                text_contains,
                attribute,
                count,
                css,
                grid_columns,
                flex_direction,
                focused,
            } => {
                let mut code = format!(
                    "    {{\n      const loc = page.locator({});\n      const observed = {{}};\n",
                    js_str(selector)
                );
                if visible.is_some() {
                    code.push_str("      observed.visible = await loc.isVisible();\n");
                }
                if text_contains.is_some() {
                    code.push_str("      observed.text = await loc.textContent();\n");
                }
                if let Some(attr) = attribute {
                    code.push_str(&format!(
                        "      {{ const v = await loc.getAttribute({}); observed.attribute = v === null ? {{ present: false }} : {{ present: true, value: v }}; }}\n",
                        js_str(&attr.name)
                    ));
                }
                if count.is_some() {
                    code.push_str("      observed.count = await loc.count();\n");
                }
                if let Some(expectation) = css {
                    code.push_str(&format!(
                        "      observed.css = await loc.evaluate((el, p) => getComputedStyle(el).getPropertyValue(p), {});\n",
                        js_str(&expectation.property)
                    ));
                }
                if grid_columns.is_some() {
                    code.push_str(
                        "      observed.grid = await loc.evaluate((el) => getComputedStyle(el).gridTemplateColumns);\n",
                    );
                }
                if flex_direction.is_some() {
                    code.push_str(
                        "      observed.flex = await loc.evaluate((el) => getComputedStyle(el).flexDirection);\n",
                    );
                }
                if focused.is_some() {
                    code.push_str(
                        "      observed.focused = await loc.evaluate((el) => el === document.activeElement);\n",
                    );
                }
                code.push_str(&format!(
                    "      emit({{ event: 'step', index: {index}, ok: true, observed }});\n    }}\n"
                ));
                code
            }
        }
    }

    /// Run a generated script with `node`, parsing the event lines it
    /// printed. A non-zero exit is fine as long as the script produced
    /// events; they carry the failure detail.
    pub async fn run(&self, script: &str) -> HarnessResult<Vec<DriverEvent>> {
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("run.js");
        std::fs::write(&script_path, script)?;

        debug!("running driver script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    HarnessError::DriverNotFound
                } else {
                    HarnessError::Io(e)
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let events = parse_events(&stdout);

        if events.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::Protocol(format!(
                "driver produced no events (exit: {:?})\nstderr: {}",
                output.status.code(),
                stderr.trim(),
            )));
        }

        Ok(events)
    }
}

fn ok_event(index: usize) -> String {
    format!("    emit({{ event: 'step', index: {index}, ok: true }});\n")
}

fn parse_events(stdout: &str) -> Vec<DriverEvent> {
    let mut events = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if !line.starts_with('{') {
            continue;
        }
        match serde_json::from_str::<DriverEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => warn!("unparseable driver line: {line} ({e})"),
        }
    }
    events
}

/// Embed a string into generated JavaScript as a quoted literal.
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Build a driver without probing for a playwright install. Script
/// generation and event parsing are testable without node.
#[cfg(test)]
pub(crate) fn offline_driver(config: DriverConfig) -> Driver {
    Driver { config }
}
