//! Browser lifecycle management
//!
//! Spawns a Chromium process with a DevTools port on a free local port and
//! an ephemeral profile dir, polls the endpoint until it answers, and opens
//! tabs through the DevTools HTTP API.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tempfile::TempDir;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::error::{E2eError, E2eResult};
use crate::page::Page;

const CHROMIUM_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// Handle to a running Chromium process with DevTools enabled.
pub struct BrowserHandle {
    child: Child,
    debug_port: u16,
    http: reqwest::Client,
    // Held so the profile dir outlives the process and is removed with it
    _user_data_dir: TempDir,
}

/// One entry from the DevTools target list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    pub url: String,
    pub web_socket_debugger_url: String,
}

impl BrowserHandle {
    /// Spawn a browser and wait until its DevTools endpoint answers.
    pub async fn launch(config: &ConsoleConfig) -> E2eResult<Self> {
        let binary = match &config.browser_path {
            Some(path) => path.clone(),
            None => find_chromium().ok_or(E2eError::BrowserNotFound)?,
        };
        let debug_port = find_free_port();
        let user_data_dir = tempfile::tempdir()?;

        info!(
            "spawning {} with DevTools on port {}",
            binary.display(),
            debug_port
        );

        let mut cmd = Command::new(&binary);
        cmd.arg(format!("--remote-debugging-port={}", debug_port))
            .arg(format!("--user-data-dir={}", user_data_dir.path().display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-gpu");
        if config.headless {
            cmd.arg("--headless=new");
        }
        if !config.sandbox {
            cmd.arg("--no-sandbox");
        }
        cmd.arg("about:blank");
        cmd.stdout(Stdio::null()).stderr(Stdio::null());

        let child = cmd.spawn().map_err(|e| {
            E2eError::BrowserStartup(format!("failed to spawn {}: {}", binary.display(), e))
        })?;

        let handle = Self {
            child,
            debug_port,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()?,
            _user_data_dir: user_data_dir,
        };
        handle.wait_for_devtools(config.startup_timeout).await?;
        Ok(handle)
    }

    /// Open a new tab at `url` and connect a page session to it.
    pub async fn new_page(&self, url: &str) -> E2eResult<Page> {
        let endpoint = format!("http://127.0.0.1:{}/json/new?{}", self.debug_port, url);
        let target: TargetInfo = self.http.put(&endpoint).send().await?.json().await?;
        debug!("opened target {} at {}", target.id, target.url);
        Page::connect(&target.web_socket_debugger_url).await
    }

    /// List the open page targets.
    pub async fn pages(&self) -> E2eResult<Vec<TargetInfo>> {
        let endpoint = format!("http://127.0.0.1:{}/json/list", self.debug_port);
        let targets: Vec<TargetInfo> = self.http.get(&endpoint).send().await?.json().await?;
        Ok(targets
            .into_iter()
            .filter(|t| t.target_type == "page")
            .collect())
    }

    /// Stop the browser process.
    pub fn stop(&mut self) {
        debug!("stopping browser (pid {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                std::thread::sleep(Duration::from_millis(200));
            }
        }

        let _ = self.child.kill();
        let _ = self.child.wait();
    }

    async fn wait_for_devtools(&self, timeout: Duration) -> E2eResult<()> {
        let url = format!("http://127.0.0.1:{}/json/version", self.debug_port);
        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout {
            attempts += 1;
            match self.http.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!("DevTools ready after {} attempt(s)", attempts);
                    return Ok(());
                }
                Ok(resp) => warn!("DevTools endpoint returned {}", resp.status()),
                // Connection refused is expected while the browser starts
                Err(e) if e.is_connect() => {}
                Err(e) => warn!("DevTools probe error: {}", e),
            }
            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::DevToolsNotReady(attempts))
    }
}

impl Drop for BrowserHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Locate a Chromium binary on PATH.
fn find_chromium() -> Option<PathBuf> {
    CHROMIUM_CANDIDATES.iter().find_map(|candidate| {
        Command::new(candidate)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .ok()
            .filter(|status| status.success())
            .map(|_| PathBuf::from(candidate))
    })
}

/// Find a free port to use
fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to find free port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port();
        let port2 = find_free_port();

        // Ports should be in valid range
        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[test]
    fn target_info_deserializes_devtools_listing() {
        let json = r#"{
            "description": "",
            "devtoolsFrontendUrl": "/devtools/inspector.html?ws=127.0.0.1:9222/devtools/page/AB12",
            "id": "AB12",
            "title": "about:blank",
            "type": "page",
            "url": "about:blank",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/AB12"
        }"#;
        let target: TargetInfo = serde_json::from_str(json).unwrap();
        assert_eq!(target.id, "AB12");
        assert_eq!(target.target_type, "page");
        assert_eq!(
            target.web_socket_debugger_url,
            "ws://127.0.0.1:9222/devtools/page/AB12"
        );
    }
}
