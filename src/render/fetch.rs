// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Plain document fetch
//!
//! Lowest-fidelity backend: downloads the served markup without running any
//! scripts. Cheap and dependable, used as the last link of the fallback chain.

use async_trait::async_trait;
use reqwest::{header, redirect, Client};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{read_capped, AnalysisMethod, Renderer};
use crate::config::RenderingConfig;
use crate::error::{Error, Result};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

/// HTTP GET of the raw document
pub struct HttpFetchRenderer {
    client: Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpFetchRenderer {
    pub fn from_config(config: &RenderingConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::limited(10))
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("fetch client: {}", e)))?;

        Ok(Self {
            client,
            timeout: config.timeout(),
            max_bytes: config.max_response_bytes,
        })
    }
}

#[async_trait]
impl Renderer for HttpFetchRenderer {
    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::HttpFetch
    }

    async fn render(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.as_str())
            .header(header::ACCEPT, ACCEPT_HTML)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout))?;

        let status = response.status();
        debug!("Fetched {} -> {}", url, status);
        if !status.is_success() {
            return Err(Error::UpstreamStatus(status.as_u16()));
        }

        read_capped(response, self.max_bytes, self.timeout).await
    }
}
