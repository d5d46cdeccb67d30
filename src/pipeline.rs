// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Analysis pipeline: acquire, evaluate, report

use std::time::Instant;
use tracing::info;

use crate::config::Config;
use crate::engine::RuleEngineAdapter;
use crate::error::Result;
use crate::render::{AnalysisRequest, RenderingCoordinator};
use crate::report::{build_report, AnalysisContext, Report};

/// One request in, one report out
pub struct AnalysisPipeline {
    coordinator: RenderingCoordinator,
    engine: RuleEngineAdapter,
}

impl AnalysisPipeline {
    pub fn new(coordinator: RenderingCoordinator, engine: RuleEngineAdapter) -> Self {
        Self {
            coordinator,
            engine,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            RenderingCoordinator::from_config(&config.rendering)?,
            RuleEngineAdapter::from_config(&config.engine)?,
        ))
    }

    pub fn coordinator(&self) -> &RenderingCoordinator {
        &self.coordinator
    }

    pub fn engine(&self) -> &RuleEngineAdapter {
        &self.engine
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<Report> {
        let started = Instant::now();

        let document = self.coordinator.acquire(request).await?;
        let findings = self.engine.run(&document).await?;
        let report = build_report(AnalysisContext::new(request, &document), &findings);

        info!(
            "Report {} ({}): score {}, {} violation(s), {:?}",
            report.id,
            report.analysis_method,
            report.compliance_score,
            report.total_issues,
            started.elapsed()
        );

        Ok(report)
    }
}
