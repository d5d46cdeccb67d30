// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management for wcagbot

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::render::AnalysisMethod;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Report store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Rendering backends and limits
    #[serde(default)]
    pub rendering: RenderingConfig,

    /// Rule engine selection
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS origins; empty means permissive
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Persist reports at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_database_url() -> String {
    "sqlite://wcagbot.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RenderingConfig {
    /// Ordered backend chain; the first entry is the primary backend
    #[serde(default = "default_backends")]
    pub backends: Vec<AnalysisMethod>,

    /// Try the next backend when one fails to acquire the page
    #[serde(default = "default_true")]
    pub fallback: bool,

    /// Cap on each acquisition attempt (seconds)
    #[serde(default = "default_render_timeout")]
    pub timeout_secs: u64,

    /// Extra time granted to late async content after load (milliseconds)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,

    /// Concurrent browser processes in the pool
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    #[serde(default = "default_chrome_path")]
    pub chrome_path: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Browser-as-a-service endpoint
    #[serde(default)]
    pub remote: RemoteBrowserConfig,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            backends: default_backends(),
            fallback: true,
            timeout_secs: default_render_timeout(),
            settle_ms: default_settle_ms(),
            max_response_bytes: default_max_response_bytes(),
            pool_size: default_pool_size(),
            chrome_path: default_chrome_path(),
            user_agent: default_user_agent(),
            remote: RemoteBrowserConfig::default(),
        }
    }
}

impl RenderingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

fn default_backends() -> Vec<AnalysisMethod> {
    vec![AnalysisMethod::BrowserPool, AnalysisMethod::HttpFetch]
}

fn default_render_timeout() -> u64 {
    30
}

fn default_settle_ms() -> u64 {
    2000
}

fn default_max_response_bytes() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

fn default_pool_size() -> usize {
    2
}

fn default_chrome_path() -> String {
    "chromium".to_string()
}

fn default_user_agent() -> String {
    format!("wcagbot/{} (+accessibility analysis)", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteBrowserConfig {
    #[serde(default = "default_remote_endpoint")]
    pub endpoint: String,

    /// API token appended as `?token=`
    pub token: Option<String>,
}

impl Default for RemoteBrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_remote_endpoint(),
            token: None,
        }
    }
}

fn default_remote_endpoint() -> String {
    "http://localhost:3000".to_string()
}

/// Which rule engine evaluates the rendered document
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Built-in static rule catalogue
    Builtin,
    /// External axe-compatible service
    Service,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_engine_kind")]
    pub kind: EngineKind,

    /// Rule engine service endpoint (kind = "service")
    #[serde(default = "default_engine_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: default_engine_kind(),
            endpoint: default_engine_endpoint(),
            timeout_secs: default_engine_timeout(),
        }
    }
}

fn default_engine_kind() -> EngineKind {
    EngineKind::Builtin
}

fn default_engine_endpoint() -> String {
    "http://localhost:4000/analyze".to_string()
}

fn default_engine_timeout() -> u64 {
    60
}

impl Config {
    /// Load configuration from file, overlaid by `WCAGBOT__*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let path = Path::new(path);

        let mut builder = config::Config::builder();
        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else {
            tracing::warn!("Config file {} not found, using defaults", path.display());
        }
        builder = builder.add_source(config::Environment::with_prefix("WCAGBOT").separator("__"));

        let config = builder.build()?;
        let parsed: Config = config.try_deserialize()?;

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rendering.pool_size, 2);
        assert_eq!(config.rendering.max_response_bytes, 10 * 1024 * 1024);
        assert!(config.rendering.fallback);
        assert_eq!(
            config.rendering.backends,
            vec![AnalysisMethod::BrowserPool, AnalysisMethod::HttpFetch]
        );
        assert_eq!(config.engine.kind, EngineKind::Builtin);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090

[rendering]
backends = ["remote_browser", "http_fetch"]
fallback = false
timeout_secs = 90

[engine]
kind = "service"
endpoint = "http://axe.internal/run"
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.rendering.backends,
            vec![AnalysisMethod::RemoteBrowser, AnalysisMethod::HttpFetch]
        );
        assert!(!config.rendering.fallback);
        assert_eq!(config.rendering.timeout(), Duration::from_secs(90));
        assert_eq!(config.rendering.pool_size, 2);
        assert_eq!(config.engine.kind, EngineKind::Service);
        assert_eq!(config.engine.endpoint, "http://axe.internal/run");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/wcagbot.toml").unwrap();
        assert_eq!(config.server.port, 3001);
    }
}
