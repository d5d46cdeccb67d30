// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Client for an external axe-compatible rule engine service

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{RawFindings, RuleEngine, RuleSelection};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::render::RenderedDocument;

/// Posts rendered markup to the engine service and decodes axe results
pub struct AxeServiceEngine {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    run_only: RunOnly,
}

#[derive(Debug, Serialize)]
struct RunOnly {
    #[serde(rename = "type")]
    kind: &'static str,
    values: &'static [&'static str],
}

impl AxeServiceEngine {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("rule engine client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.endpoint.clone(), Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl RuleEngine for AxeServiceEngine {
    fn name(&self) -> &str {
        "axe-service"
    }

    async fn evaluate(
        &self,
        document: &RenderedDocument,
        selection: RuleSelection,
    ) -> Result<RawFindings> {
        let body = AnalyzeRequest {
            html: &document.markup,
            url: document.source_url.as_ref().map(|u| u.as_str()),
            run_only: RunOnly {
                kind: "tag",
                values: selection.tags(),
            },
        };

        debug!("Sending {} bytes to rule engine at {}", document.markup.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Error::RuleEngineFailure(format!("engine unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::RuleEngineFailure(format!(
                "engine returned status {}",
                response.status()
            )));
        }

        response
            .json::<RawFindings>()
            .await
            .map_err(|e| Error::RuleEngineFailure(format!("undecodable engine response: {}", e)))
    }
}
