// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Page acquisition - turns an analysis request into markup ready for the rule engine
//!
//! Backends, highest fidelity first:
//! - `browser_pool`: bounded pool of headless Chromium processes
//! - `headless_browser`: one Chromium process per request
//! - `remote_browser`: browser-as-a-service HTTP endpoint
//! - `http_fetch`: raw served markup, scripts never run
//!
//! The coordinator walks the configured chain and, when fallback is enabled,
//! moves on after an acquisition failure. Everything a backend holds is
//! owned by its future, so a timeout or error drops (and releases) it.

pub mod chrome;
pub mod fetch;
pub mod pool;
pub mod remote;

pub use chrome::ChromeRenderer;
pub use fetch::HttpFetchRenderer;
pub use pool::{BrowserPool, PoolPermit, PoolStats};
pub use remote::RemoteBrowserRenderer;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::RenderingConfig;
use crate::error::{Error, Result};

/// What the caller asked us to analyze
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisRequest {
    Url { url: String },
    Html { markup: String },
}

impl AnalysisRequest {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    pub fn html(markup: impl Into<String>) -> Self {
        Self::Html {
            markup: markup.into(),
        }
    }
}

/// How the analyzed document was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    /// Markup supplied directly by the caller
    InlineMarkup,
    BrowserPool,
    HeadlessBrowser,
    RemoteBrowser,
    HttpFetch,
}

impl AnalysisMethod {
    /// Whether page scripts ran before the DOM was captured
    pub fn executes_scripts(&self) -> bool {
        matches!(
            self,
            Self::BrowserPool | Self::HeadlessBrowser | Self::RemoteBrowser
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InlineMarkup => "inline_markup",
            Self::BrowserPool => "browser_pool",
            Self::HeadlessBrowser => "headless_browser",
            Self::RemoteBrowser => "remote_browser",
            Self::HttpFetch => "http_fetch",
        }
    }
}

impl std::fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markup ready for rule evaluation
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub markup: String,
    pub source_url: Option<Url>,
    pub method: AnalysisMethod,
    /// Produced by a backend other than the primary one
    pub fallback_used: bool,
    /// Fell back from a script-running primary to a backend that runs no scripts
    pub reduced_fidelity: bool,
}

impl RenderedDocument {
    /// Wrap caller-supplied markup after checking it looks like HTML
    pub fn inline(markup: &str) -> Result<Self> {
        validate_markup(markup)?;
        Ok(Self {
            markup: markup.to_string(),
            source_url: None,
            method: AnalysisMethod::InlineMarkup,
            fallback_used: false,
            reduced_fidelity: false,
        })
    }
}

/// A strategy that turns a URL into rendered markup
#[async_trait]
pub trait Renderer: Send + Sync {
    fn method(&self) -> AnalysisMethod;

    /// Wait for capacity before rendering; the slot is held until dropped.
    /// Backends without a concurrency bound need no slot.
    async fn reserve(&self) -> Result<Option<PoolPermit>> {
        Ok(None)
    }

    async fn render(&self, url: &Url) -> Result<String>;
}

/// Something that opens a tag, closes one, or starts a doctype/comment
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(?:[A-Za-z][A-Za-z0-9-]*|/\s*[A-Za-z]|!)").expect("valid regex")
});

/// Parse a caller URL, accepting only absolute http(s) URLs with a host
pub fn validate_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("URL is required".to_string()));
    }

    let url = Url::parse(trimmed).map_err(|e| {
        Error::InvalidUrl(format!("'{}' is not an absolute URL ({})", trimmed, e))
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme '{}', only http and https are allowed",
                other
            )))
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::InvalidUrl(format!("'{}' has no host", trimmed)));
    }

    Ok(url)
}

/// Reject markup with no tag-like structure
pub fn validate_markup(markup: &str) -> Result<()> {
    if markup.trim().is_empty() {
        return Err(Error::InvalidMarkup("HTML content is required".to_string()));
    }

    if !TAG_RE.is_match(markup) {
        return Err(Error::InvalidMarkup(
            "content does not contain any HTML tags".to_string(),
        ));
    }

    Ok(())
}

/// Read a response body, aborting the transfer once it grows past `limit`
pub(crate) async fn read_capped(
    mut response: reqwest::Response,
    limit: usize,
    timeout: Duration,
) -> Result<String> {
    if let Some(declared) = response.content_length() {
        if declared > limit as u64 {
            return Err(Error::ResponseTooLarge { limit });
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::from_transport(e, timeout))?
    {
        if body.len() + chunk.len() > limit {
            return Err(Error::ResponseTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Selects backends per request and normalizes their failures
pub struct RenderingCoordinator {
    backends: Vec<Arc<dyn Renderer>>,
    fallback: bool,
    timeout: Duration,
    pool: Option<Arc<BrowserPool>>,
}

impl RenderingCoordinator {
    pub fn new(backends: Vec<Arc<dyn Renderer>>, fallback: bool, timeout: Duration) -> Self {
        Self {
            backends,
            fallback,
            timeout,
            pool: None,
        }
    }

    /// Build the backend chain named in the configuration
    pub fn from_config(config: &RenderingConfig) -> Result<Self> {
        if config.backends.is_empty() {
            return Err(Error::Config(
                "rendering.backends must name at least one backend".to_string(),
            ));
        }

        let mut backends: Vec<Arc<dyn Renderer>> = Vec::with_capacity(config.backends.len());
        let mut pool = None;

        for method in &config.backends {
            let backend: Arc<dyn Renderer> = match method {
                AnalysisMethod::BrowserPool => {
                    let shared = Arc::new(BrowserPool::new(
                        ChromeRenderer::from_config(config),
                        config.pool_size,
                    ));
                    pool = Some(shared.clone());
                    shared
                }
                AnalysisMethod::HeadlessBrowser => Arc::new(ChromeRenderer::from_config(config)),
                AnalysisMethod::RemoteBrowser => Arc::new(RemoteBrowserRenderer::from_config(config)?),
                AnalysisMethod::HttpFetch => Arc::new(HttpFetchRenderer::from_config(config)?),
                AnalysisMethod::InlineMarkup => {
                    return Err(Error::Config(
                        "inline_markup is not a URL rendering backend".to_string(),
                    ))
                }
            };
            backends.push(backend);
        }

        info!(
            "Rendering chain: {} (fallback {})",
            config
                .backends
                .iter()
                .map(AnalysisMethod::as_str)
                .collect::<Vec<_>>()
                .join(" -> "),
            if config.fallback { "enabled" } else { "disabled" }
        );

        Ok(Self {
            backends,
            fallback: config.fallback,
            timeout: config.timeout(),
            pool,
        })
    }

    /// Primary backend
    pub fn primary(&self) -> Option<AnalysisMethod> {
        self.backends.first().map(|b| b.method())
    }

    pub fn fallback_enabled(&self) -> bool {
        self.fallback
    }

    /// Pool occupancy, when the chain contains a browser pool
    pub fn pool_stats(&self) -> Option<PoolStats> {
        self.pool.as_ref().map(|p| p.stats())
    }

    /// Produce a document for the request or a classified error
    pub async fn acquire(&self, request: &AnalysisRequest) -> Result<RenderedDocument> {
        match request {
            AnalysisRequest::Html { markup } => RenderedDocument::inline(markup),
            AnalysisRequest::Url { url } => {
                let url = validate_url(url)?;
                self.render_url(url).await
            }
        }
    }

    async fn render_url(&self, url: Url) -> Result<RenderedDocument> {
        let attempts = if self.fallback {
            self.backends.len()
        } else {
            self.backends.len().min(1)
        };

        let primary_runs_scripts = self.primary().is_some_and(|m| m.executes_scripts());
        let mut last_error = None;

        for (index, backend) in self.backends.iter().take(attempts).enumerate() {
            let method = backend.method();
            debug!("Rendering {} with {}", url, method);

            let outcome = self.attempt(backend.as_ref(), &url).await;

            match outcome {
                Ok(markup) => {
                    let fallback_used = index > 0;
                    let reduced_fidelity =
                        fallback_used && primary_runs_scripts && !method.executes_scripts();
                    if fallback_used {
                        warn!(
                            "Rendered {} with fallback backend {}{}",
                            url,
                            method,
                            if reduced_fidelity { " (scripts not executed)" } else { "" }
                        );
                    }
                    return Ok(RenderedDocument {
                        markup,
                        source_url: Some(url),
                        method,
                        fallback_used,
                        reduced_fidelity,
                    });
                }
                Err(err) if err.allows_fallback() && index + 1 < attempts => {
                    warn!("Backend {} failed for {}: {}; trying next backend", method, url, err);
                    last_error = Some(err);
                }
                Err(err) => {
                    warn!("Backend {} failed for {}: {}", method, url, err);
                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::Config("no rendering backends configured".to_string())
        }))
    }

    /// Queue for a slot, then render under the navigation timeout
    async fn attempt(&self, backend: &dyn Renderer, url: &Url) -> Result<String> {
        let _slot = backend.reserve().await?;

        match tokio::time::timeout(self.timeout, backend.render(url)).await {
            Ok(result) => result,
            Err(_) => Err(Error::NavigationTimeout(self.timeout)),
        }
    }
}
