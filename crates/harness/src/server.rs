//! Static server management.
//!
//! The page under test is served by an external static file server. The
//! harness spawns it (default: `npx http-server`), polls until it answers
//! HTTP, and tears it down on drop. An already-listening server can be
//! reused instead, which is the default outside CI.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Command and arguments for the static server
    pub command: Vec<String>,

    /// Directory served as the site root
    pub serve_dir: PathBuf,

    /// URL the server will answer on
    pub url: String,

    /// Reuse a server already listening on the URL instead of spawning
    pub reuse_existing: bool,

    /// Bound on the readiness wait
    pub startup_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "npx".to_string(),
                "http-server".to_string(),
                ".".to_string(),
                "-p".to_string(),
                "3000".to_string(),
                "-c-1".to_string(),
            ],
            serve_dir: PathBuf::from("."),
            url: "http://127.0.0.1:3000".to_string(),
            reuse_existing: true,
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle to the static server. Owns the child process unless an existing
/// server was reused.
pub struct ServerHandle {
    child: Option<Child>,
    url: String,
}

impl ServerHandle {
    /// Make sure a server is answering on the configured URL, spawning one
    /// if needed.
    pub async fn ensure(config: ServerConfig) -> HarnessResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        if probe(&client, &config.url).await {
            if config.reuse_existing {
                info!("reusing server already listening at {}", config.url);
                return Ok(Self {
                    child: None,
                    url: config.url,
                });
            }
            return Err(HarnessError::ServerStartup(format!(
                "{} is already in use and reuse is disabled",
                config.url
            )));
        }

        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| HarnessError::ServerStartup("empty server command".to_string()))?;

        info!("spawning static server: {}", config.command.join(" "));

        let child = Command::new(program)
            .args(args)
            .current_dir(&config.serve_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                HarnessError::ServerStartup(format!("failed to spawn {program}: {e}"))
            })?;

        let handle = Self {
            child: Some(child),
            url: config.url.clone(),
        };

        handle
            .wait_for_ready(&client, config.startup_timeout)
            .await?;
        info!("server ready at {}", config.url);
        Ok(handle)
    }

    async fn wait_for_ready(
        &self,
        client: &reqwest::Client,
        timeout: Duration,
    ) -> HarnessResult<()> {
        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;
            if probe(client, &self.url).await {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }

        Err(HarnessError::ServerReadiness(attempts))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether an already-running server was reused (and is not ours to
    /// stop).
    pub fn is_reused(&self) -> bool {
        self.child.is_none()
    }

    /// Stop an owned server, gracefully where the platform allows.
    pub fn stop(&mut self) -> HarnessResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        info!("stopping server (pid: {})", child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        if let Err(e) = child.kill() {
            warn!("failed to kill server: {e}");
        }
        let _ = child.wait();

        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Any HTTP response counts as ready; a static server answers everything.
async fn probe(client: &reqwest::Client, url: &str) -> bool {
    client.get(url).send().await.is_ok()
}
