// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Browser-as-a-service renderer
//!
//! Delegates rendering to a remote headless browser service exposing a
//! browserless-style `POST /content` endpoint, which navigates, waits for
//! network idle and DOMContentLoaded, then returns the serialized DOM.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{read_capped, AnalysisMethod, Renderer};
use crate::config::RenderingConfig;
use crate::error::{Error, Result};

/// Client for a remote rendering service
pub struct RemoteBrowserRenderer {
    client: Client,
    endpoint: String,
    token: Option<String>,
    timeout: Duration,
    settle: Duration,
    max_bytes: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    url: &'a str,
    goto_options: GotoOptions,
    wait_for_timeout: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    wait_until: [&'static str; 2],
    timeout: u64,
}

impl RemoteBrowserRenderer {
    pub fn from_config(config: &RenderingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("remote browser client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.remote.endpoint.clone(),
            token: config.remote.token.clone(),
            timeout: config.timeout(),
            settle: config.settle(),
            max_bytes: config.max_response_bytes,
        })
    }

    fn content_url(&self) -> String {
        format!("{}/content", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl Renderer for RemoteBrowserRenderer {
    fn method(&self) -> AnalysisMethod {
        AnalysisMethod::RemoteBrowser
    }

    async fn render(&self, url: &Url) -> Result<String> {
        let body = ContentRequest {
            url: url.as_str(),
            goto_options: GotoOptions {
                wait_until: ["networkidle0", "domcontentloaded"],
                timeout: self.timeout.as_millis() as u64,
            },
            wait_for_timeout: self.settle.as_millis() as u64,
        };

        let mut request = self.client.post(self.content_url()).json(&body);
        if let Some(ref token) = self.token {
            request = request.query(&[("token", token)]);
        }

        debug!("Requesting remote render of {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| Error::from_transport(e, self.timeout))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                return Err(Error::NavigationTimeout(self.timeout));
            }
            status => {
                return Err(Error::BrowserLaunchFailed(format!(
                    "remote browser service returned {}",
                    status
                )));
            }
        }

        read_capped(response, self.max_bytes, self.timeout).await
    }
}
