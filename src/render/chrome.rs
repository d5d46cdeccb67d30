// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! On-demand headless Chromium renderer
//!
//! Each render launches one browser process with a throwaway profile
//! directory, lets page scripts run, and captures the serialized DOM from
//! stdout (`--dump-dom`). Chromium dumps after the load event plus the
//! virtual-time budget, which gives late async content time to settle.
//!
//! Resource model:
//! - The child is spawned with `kill_on_drop`, so any render that ends early
//!   kills the browser
//! - The DOM is read incrementally and abandoned once it passes the size cap
//! - The profile directory is a `TempDir`, removed on every exit path
//! - No cookies, storage, or cache are shared between renders

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

use super::{AnalysisMethod, Renderer};
use crate::config::RenderingConfig;
use crate::error::{Error, Result};

/// Profile directories are created under the system temp dir with this prefix
const PROFILE_PREFIX: &str = "wcagbot-profile-";

/// Stderr kept for classifying a failed run
const MAX_DIAGNOSTIC_BYTES: usize = 64 * 1024;

/// Chromium network error codes that mean the page could not be reached
const NETWORK_ERRORS: &[&str] = &[
    "ERR_NAME_NOT_RESOLVED",
    "ERR_NAME_RESOLUTION_FAILED",
    "ERR_CONNECTION_REFUSED",
    "ERR_CONNECTION_RESET",
    "ERR_CONNECTION_CLOSED",
    "ERR_CONNECTION_TIMED_OUT",
    "ERR_INTERNET_DISCONNECTED",
    "ERR_ADDRESS_UNREACHABLE",
    "ERR_CERT_",
];

/// Headless Chromium launched once per render
pub struct ChromeRenderer {
    /// Browser binary (name on PATH or absolute path)
    binary: String,
    /// Virtual-time budget after load
    settle: Duration,
    /// Hard cap on the browser's lifetime
    timeout: Duration,
    max_bytes: usize,
    user_agent: Option<String>,
}

impl ChromeRenderer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            settle: Duration::from_millis(2000),
            timeout: Duration::from_secs(30),
            max_bytes: 10 * 1024 * 1024,
            user_agent: None,
        }
    }

    pub fn from_config(config: &RenderingConfig) -> Self {
        Self::new(config.chrome_path.clone())
            .with_settle(config.settle())
            .with_timeout(config.timeout())
            .with_max_bytes(config.max_response_bytes)
            .with_user_agent(config.user_agent.clone())
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the browser invocation for one render
    fn command(&self, url: &Url, profile_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .arg(format!("--virtual-time-budget={}", self.settle.as_millis()))
            .arg(format!("--timeout={}", self.timeout.as_millis()));

        if let Some(ref agent) = self.user_agent {
            cmd.arg(format!("--user-agent={}", agent));
        }

        cmd.arg("--dump-dom").arg(url.as_str());

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn dump_dom(&self, url: &Url) -> Result<String> {
        let profile = tempfile::Builder::new()
            .prefix(PROFILE_PREFIX)
            .tempdir()
            .map_err(|e| Error::BrowserLaunchFailed(format!("cannot create profile dir: {}", e)))?;

        let mut child = self.command(url, profile.path()).spawn().map_err(|e| {
            Error::BrowserLaunchFailed(format!("could not start '{}': {}", self.binary, e))
        })?;

        info!(
            "Launched headless browser for {} (settle: {}ms, timeout: {}s)",
            url,
            self.settle.as_millis(),
            self.timeout.as_secs()
        );

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                return Err(Error::BrowserLaunchFailed(
                    "browser output pipes unavailable".to_string(),
                ))
            }
        };

        // Any early return drops the child, which kills it.
        let capture = async {
            let (dom, diagnostics) = tokio::try_join!(
                read_stream_capped(stdout, self.max_bytes),
                read_diagnostics(stderr)
            )?;
            let status = child.wait().await.map_err(|e| {
                Error::BrowserLaunchFailed(format!("browser process failed: {}", e))
            })?;
            Ok::<_, Error>((status, dom, diagnostics))
        };

        let (status, dom, diagnostics) = match tokio::time::timeout(self.timeout, capture).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("Headless browser timed out after {}s on {}", self.timeout.as_secs(), url);
                return Err(Error::NavigationTimeout(self.timeout));
            }
        };

        debug!(
            "Browser exited: status={:?}, stdout={}B, stderr={}B",
            status.code(),
            dom.len(),
            diagnostics.len()
        );

        let markup = String::from_utf8_lossy(&dom).into_owned();
        if status.success() && !markup.trim().is_empty() {
            // Failed subresources are logged to stderr too; the page itself loaded
            if let Some(code) = network_error(&diagnostics) {
                debug!("Ignoring {} in browser diagnostics for {}", code, url);
            }
            return Ok(markup);
        }

        if let Some(code) = network_error(&diagnostics) {
            return Err(Error::NetworkUnreachable(format!("{} ({})", url, code)));
        }

        if !status.success() {
            let detail = diagnostics.lines().last().unwrap_or("no diagnostic output");
            return Err(Error::BrowserLaunchFailed(format!(
                "browser exited with {:?}: {}",
                status.code(),
                detail
            )));
        }

        Err(Error::BrowserLaunchFailed(
            "browser produced an empty document".to_string(),
        ))
    }
}

/// Read the dumped DOM, giving up as soon as it grows past `limit`
async fn read_stream_capped(mut stream: impl AsyncRead + Unpin, limit: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await.map_err(|e| {
            Error::BrowserLaunchFailed(format!("reading browser output failed: {}", e))
        })?;
        if n == 0 {
            return Ok(body);
        }
        if body.len() + n > limit {
            return Err(Error::ResponseTooLarge { limit });
        }
        body.extend_from_slice(&chunk[..n]);
    }
}

/// Browser diagnostics, keeping only the tail once they get long
async fn read_diagnostics(mut stream: impl AsyncRead + Unpin) -> Result<String> {
    let mut kept = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = stream.read(&mut chunk).await.map_err(|e| {
            Error::BrowserLaunchFailed(format!("reading browser diagnostics failed: {}", e))
        })?;
        if n == 0 {
            break;
        }
        kept.extend_from_slice(&chunk[..n]);
        if kept.len() > MAX_DIAGNOSTIC_BYTES {
            kept.drain(..kept.len() - MAX_DIAGNOSTIC_BYTES);
        }
    }

    Ok(String::from_utf8_lossy(&kept).into_owned())
}

#[async_trait]
impl Renderer for ChromeRenderer {
    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::HeadlessBrowser
    }

    async fn render(&self, url: &Url) -> Result<String> {
        self.dump_dom(url).await
    }
}

/// First Chromium network error code mentioned in the browser's diagnostics
fn network_error(stderr: &str) -> Option<&'static str> {
    NETWORK_ERRORS
        .iter()
        .copied()
        .find(|code| stderr.contains(code))
}
