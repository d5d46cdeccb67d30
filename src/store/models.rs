// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::render::AnalysisMethod;
use crate::report::Report;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// List-view projection of a stored report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub input_kind: String,
    pub input_label: String,
    pub analysis_method: AnalysisMethod,
    pub reduced_fidelity: bool,
    pub compliance_score: u8,
    pub total_issues: usize,
    pub accessibility_impact_score: u8,
}

impl From<&Report> for ReportSummary {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id,
            timestamp: report.timestamp,
            input_kind: report.input.kind().to_string(),
            input_label: report.input.label(),
            analysis_method: report.analysis_method,
            reduced_fidelity: report.reduced_fidelity,
            compliance_score: report.compliance_score,
            total_issues: report.total_issues,
            accessibility_impact_score: report.accessibility_impact_score,
        }
    }
}

/// 1-based page of history, limit clamped to 1..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPage {
    pub page: u32,
    pub limit: u32,
}

impl HistoryPage {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for HistoryPage {
    fn default() -> Self {
        Self::new(None, None)
    }
}
