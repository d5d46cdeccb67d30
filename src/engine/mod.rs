// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Rule engine adapter
//!
//! The adapter is the single place that decides which rules are checked:
//! every request runs the same WCAG 2.0 A, 2.0 AA and 2.1 AA tag selection.
//! The rendered document is handed to the engine as an argument; no engine
//! ever reads a document from shared state.
//!
//! Raw findings keep the axe-core result shape so service responses
//! deserialize directly and the built-in engine can emit the same thing.

pub mod axe_service;
pub mod builtin;

pub use axe_service::AxeServiceEngine;
pub use builtin::StaticRuleEngine;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::{EngineConfig, EngineKind};
use crate::error::{Error, Result};
use crate::render::RenderedDocument;

/// Tags selecting WCAG 2.0 A, WCAG 2.0 AA and WCAG 2.1 AA rules
pub const WCAG21_AA_TAGS: &[&str] = &["wcag2a", "wcag2aa", "wcag21aa"];

/// Rule-set tag selection passed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSelection {
    tags: &'static [&'static str],
}

impl RuleSelection {
    pub fn wcag21_aa() -> Self {
        Self {
            tags: WCAG21_AA_TAGS,
        }
    }

    pub fn tags(&self) -> &'static [&'static str] {
        self.tags
    }

    /// Whether a rule carrying `rule_tags` belongs to this selection
    pub fn matches(&self, rule_tags: &[&str]) -> bool {
        rule_tags.iter().any(|t| self.tags.contains(t))
    }
}

/// Rule impact as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Impact {
    /// Parse an engine impact string; anything unrecognized is `None`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "serious" => Some(Self::Serious),
            "moderate" => Some(Self::Moderate),
            "minor" => Some(Self::Minor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Serious => "serious",
            Self::Moderate => "moderate",
            Self::Minor => "minor",
        }
    }
}

/// The three result lists returned by one engine run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFindings {
    #[serde(default)]
    pub violations: Vec<RawRuleResult>,
    #[serde(default)]
    pub passes: Vec<RawRuleResult>,
    #[serde(default)]
    pub incomplete: Vec<RawRuleResult>,
}

/// One rule's outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRuleResult {
    pub id: String,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub help_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
}

impl RawRuleResult {
    pub fn impact_level(&self) -> Option<Impact> {
        self.impact.as_deref().and_then(Impact::parse)
    }
}

/// A DOM node the rule looked at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    /// CSS selector; axe target arrays are flattened with spaces
    #[serde(default, deserialize_with = "flatten_target")]
    pub target: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub failure_summary: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
}

fn flatten_target<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    fn collect(value: &serde_json::Value, parts: &mut Vec<String>) {
        match value {
            serde_json::Value::String(s) => parts.push(s.clone()),
            serde_json::Value::Array(items) => items.iter().for_each(|v| collect(v, parts)),
            _ => {}
        }
    }

    let value = serde_json::Value::deserialize(deserializer)?;
    let mut parts = Vec::new();
    collect(&value, &mut parts);
    Ok(parts.join(" "))
}

/// An accessibility rule engine
#[async_trait]
pub trait RuleEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn evaluate(
        &self,
        document: &RenderedDocument,
        selection: RuleSelection,
    ) -> Result<RawFindings>;
}

/// Drives the configured engine with the fixed rule selection
pub struct RuleEngineAdapter {
    engine: Arc<dyn RuleEngine>,
    selection: RuleSelection,
}

impl RuleEngineAdapter {
    pub fn new(engine: Arc<dyn RuleEngine>) -> Self {
        Self {
            engine,
            selection: RuleSelection::wcag21_aa(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let engine: Arc<dyn RuleEngine> = match config.kind {
            EngineKind::Builtin => Arc::new(StaticRuleEngine::new()),
            EngineKind::Service => Arc::new(AxeServiceEngine::from_config(config)?),
        };
        info!("Rule engine: {}", engine.name());
        Ok(Self::new(engine))
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn selection(&self) -> RuleSelection {
        self.selection
    }

    /// Evaluate a document; any engine failure surfaces as `RuleEngineFailure`
    pub async fn run(&self, document: &RenderedDocument) -> Result<RawFindings> {
        let findings = self
            .engine
            .evaluate(document, self.selection)
            .await
            .map_err(|err| match err {
                Error::RuleEngineFailure(_) => err,
                other => Error::RuleEngineFailure(other.to_string()),
            })?;

        info!(
            "{} finished: {} violation(s), {} pass(es), {} incomplete",
            self.engine.name(),
            findings.violations.len(),
            findings.passes.len(),
            findings.incomplete.len()
        );

        Ok(findings)
    }
}
