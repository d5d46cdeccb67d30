// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Scoring and report building
//!
//! Turns raw engine findings into the public report. Everything here is a
//! pure function of its inputs apart from the generated id and timestamp,
//! which `build_report_at` takes explicitly.

pub mod remediation;
pub mod scoring;
pub mod text;
pub mod wcag;

pub use text::render_text;
pub use wcag::Category;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{Impact, RawFindings, RawRuleResult};
use crate::render::{AnalysisMethod, AnalysisRequest, RenderedDocument};

/// Characters of submitted markup echoed back in the report
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Serious,
    Moderate,
    Minor,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Serious,
        Severity::Moderate,
        Severity::Minor,
    ];

    /// Unknown or missing impact counts as moderate
    pub fn from_impact(impact: Option<Impact>) -> Self {
        match impact {
            Some(Impact::Critical) => Severity::Critical,
            Some(Impact::Serious) => Severity::Serious,
            Some(Impact::Moderate) | None => Severity::Moderate,
            Some(Impact::Minor) => Severity::Minor,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "Critical"),
            Severity::Serious => write!(f, "Serious"),
            Severity::Moderate => write!(f, "Moderate"),
            Severity::Minor => write!(f, "Minor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "High"),
            Priority::Medium => write!(f, "Medium"),
            Priority::Low => write!(f, "Low"),
        }
    }
}

/// How to fix one violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixInstructions {
    pub summary: String,
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_example: Option<String>,
    pub priority: Priority,
    pub effort: String,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedViolation {
    /// 1-based, stable within one report only
    pub id: usize,
    pub rule_id: String,
    pub description: String,
    pub help: String,
    pub severity: Severity,
    pub wcag_reference: String,
    pub wcag_level: String,
    pub affected_users: Vec<String>,
    /// Selector of the first affected node
    pub element: String,
    /// Markup snippet of the first affected node
    pub html: String,
    pub node_count: usize,
    pub fix: FixInstructions,
}

/// Pass or incomplete entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub id: String,
    pub description: String,
    pub help: String,
    #[serde(default)]
    pub help_url: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    pub tags: Vec<String>,
    pub node_count: usize,
}

impl From<&RawRuleResult> for CheckSummary {
    fn from(rule: &RawRuleResult) -> Self {
        Self {
            id: rule.id.clone(),
            description: rule.description.clone(),
            help: rule.help.clone(),
            help_url: rule.help_url.clone(),
            impact: rule.impact.clone(),
            tags: rule.tags.clone(),
            node_count: rule.nodes.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: Category,
    pub count: usize,
    pub percentage: u8,
    pub color: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub critical: usize,
    pub serious: usize,
    pub moderate: usize,
    pub minor: usize,
}

impl SeverityBreakdown {
    pub fn total(&self) -> usize {
        self.critical + self.serious + self.moderate + self.minor
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Serious => self.serious,
            Severity::Moderate => self.moderate,
            Severity::Minor => self.minor,
        }
    }

    /// Non-zero counts in canonical order
    pub fn display_entries(&self) -> Vec<(Severity, usize)> {
        Severity::ALL
            .iter()
            .map(|s| (*s, self.count(*s)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}

/// Echo of what was analyzed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportInput {
    Url { url: String },
    Html { preview: String, length: usize },
}

impl ReportInput {
    pub fn from_request(request: &AnalysisRequest) -> Self {
        match request {
            AnalysisRequest::Url { url } => ReportInput::Url {
                url: url.trim().to_string(),
            },
            AnalysisRequest::Html { markup } => ReportInput::Html {
                preview: markup.chars().take(PREVIEW_CHARS).collect(),
                length: markup.chars().count(),
            },
        }
    }

    /// Short label for list views
    pub fn label(&self) -> String {
        match self {
            ReportInput::Url { url } => url.clone(),
            ReportInput::Html { length, .. } => format!("HTML snippet ({} chars)", length),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReportInput::Url { .. } => "url",
            ReportInput::Html { .. } => "html",
        }
    }
}

/// Request-level facts the report records alongside the findings
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub input: ReportInput,
    pub method: AnalysisMethod,
    pub fallback_used: bool,
    pub reduced_fidelity: bool,
}

impl AnalysisContext {
    pub fn new(request: &AnalysisRequest, document: &RenderedDocument) -> Self {
        Self {
            input: ReportInput::from_request(request),
            method: document.method,
            fallback_used: document.fallback_used,
            reduced_fidelity: document.reduced_fidelity,
        }
    }
}

/// The public analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub input: ReportInput,
    pub timestamp: DateTime<Utc>,
    pub analysis_method: AnalysisMethod,
    pub fallback_used: bool,
    pub reduced_fidelity: bool,
    pub compliance_score: u8,
    pub total_issues: usize,
    pub accessibility_impact_score: u8,
    pub violations: Vec<MappedViolation>,
    pub passes: Vec<CheckSummary>,
    pub incomplete: Vec<CheckSummary>,
    pub issue_distribution: Vec<CategoryShare>,
    pub severity_breakdown: SeverityBreakdown,
}

pub fn build_report(context: AnalysisContext, findings: &RawFindings) -> Report {
    build_report_at(context, findings, Uuid::new_v4(), Utc::now())
}

/// Deterministic form of [`build_report`]
pub fn build_report_at(
    context: AnalysisContext,
    findings: &RawFindings,
    id: Uuid,
    timestamp: DateTime<Utc>,
) -> Report {
    let violations: Vec<MappedViolation> = findings
        .violations
        .iter()
        .enumerate()
        .map(|(index, rule)| map_violation(index + 1, rule))
        .collect();

    let severity_breakdown = scoring::severity_breakdown(violations.iter().map(|v| &v.severity));
    let categories: Vec<Category> = findings
        .violations
        .iter()
        .map(|rule| Category::from_tags(&rule.tags))
        .collect();

    Report {
        id,
        input: context.input,
        timestamp,
        analysis_method: context.method,
        fallback_used: context.fallback_used,
        reduced_fidelity: context.reduced_fidelity,
        compliance_score: scoring::compliance_score(
            findings.violations.len(),
            findings.passes.len(),
            findings.incomplete.len(),
        ),
        total_issues: violations.len(),
        accessibility_impact_score: scoring::impact_score(&severity_breakdown),
        violations,
        passes: findings.passes.iter().map(CheckSummary::from).collect(),
        incomplete: findings.incomplete.iter().map(CheckSummary::from).collect(),
        issue_distribution: scoring::category_distribution(&categories),
        severity_breakdown,
    }
}

fn map_violation(ordinal: usize, rule: &RawRuleResult) -> MappedViolation {
    let first = rule.nodes.first();

    MappedViolation {
        id: ordinal,
        rule_id: rule.id.clone(),
        description: rule.description.clone(),
        help: rule.help.clone(),
        severity: Severity::from_impact(rule.impact_level()),
        wcag_reference: wcag::wcag_reference(&rule.tags),
        wcag_level: wcag::wcag_level(&rule.tags),
        affected_users: wcag::affected_users(&rule.tags),
        element: first.map(|n| n.target.clone()).unwrap_or_default(),
        html: first.map(|n| n.html.clone()).unwrap_or_default(),
        node_count: rule.nodes.len(),
        fix: remediation::fix_instructions(rule),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RawNode;
    use chrono::TimeZone;

    fn rule(id: &str, impact: Option<&str>, tags: &[&str]) -> RawRuleResult {
        RawRuleResult {
            id: id.to_string(),
            impact: impact.map(String::from),
            description: format!("{} description", id),
            help: format!("{} help", id),
            help_url: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            nodes: vec![RawNode {
                target: format!("#{}", id),
                html: format!("<div id=\"{}\">", id),
                failure_summary: None,
                impact: impact.map(String::from),
            }],
        }
    }

    fn url_context() -> AnalysisContext {
        AnalysisContext {
            input: ReportInput::Url {
                url: "https://example.org/".to_string(),
            },
            method: AnalysisMethod::HttpFetch,
            fallback_used: true,
            reduced_fidelity: true,
        }
    }

    fn two_violations_ten_passes() -> RawFindings {
        RawFindings {
            violations: vec![
                rule("image-alt", Some("critical"), &["cat.text-alternatives", "wcag2a", "wcag111"]),
                rule("region", Some("minor"), &["cat.keyboard", "best-practice"]),
            ],
            passes: (0..10)
                .map(|i| rule(&format!("pass-{}", i), None, &["wcag2a"]))
                .collect(),
            incomplete: Vec::new(),
        }
    }

    #[test]
    fn test_scores_for_two_violations_and_ten_passes() {
        let report = build_report(url_context(), &two_violations_ten_passes());

        assert_eq!(report.compliance_score, 83);
        assert_eq!(report.accessibility_impact_score, 19);
        assert_eq!(report.total_issues, 2);
        assert_eq!(
            report.severity_breakdown.display_entries(),
            vec![(Severity::Critical, 1), (Severity::Minor, 1)]
        );
    }

    #[test]
    fn test_violation_mapping() {
        let report = build_report(url_context(), &two_violations_ten_passes());
        let first = &report.violations[0];

        assert_eq!(first.id, 1);
        assert_eq!(first.rule_id, "image-alt");
        assert_eq!(first.severity, Severity::Critical);
        assert_eq!(first.wcag_reference, "2a");
        assert_eq!(first.wcag_level, "A");
        assert_eq!(first.affected_users, vec!["Screen reader users"]);
        assert_eq!(first.element, "#image-alt");
        assert_eq!(first.node_count, 1);
        assert_eq!(first.fix.priority, Priority::High);

        let second = &report.violations[1];
        assert_eq!(second.id, 2);
        assert_eq!(second.wcag_reference, "N/A");
        assert_eq!(second.fix.priority, Priority::Low);
    }

    #[test]
    fn test_unknown_impact_is_moderate() {
        let findings = RawFindings {
            violations: vec![rule("mystery", Some("catastrophic"), &[])],
            ..Default::default()
        };
        let report = build_report(url_context(), &findings);

        assert_eq!(report.violations[0].severity, Severity::Moderate);
        assert_eq!(report.severity_breakdown.moderate, 1);
        assert_eq!(report.violations[0].fix.effort, "1 hour");
    }

    #[test]
    fn test_breakdown_sums_to_total_issues() {
        let report = build_report(url_context(), &two_violations_ten_passes());
        assert_eq!(report.severity_breakdown.total(), report.total_issues);
        let shares: usize = report.issue_distribution.iter().map(|s| s.count).sum();
        assert_eq!(shares, report.total_issues);
    }

    #[test]
    fn test_empty_findings() {
        let report = build_report(url_context(), &RawFindings::default());
        assert_eq!(report.compliance_score, 100);
        assert_eq!(report.accessibility_impact_score, 0);
        assert!(report.severity_breakdown.display_entries().is_empty());
        assert!(report.issue_distribution.iter().all(|s| s.percentage == 0));
    }

    #[test]
    fn test_build_is_deterministic_given_id_and_time() {
        let id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let findings = two_violations_ten_passes();

        let a = build_report_at(url_context(), &findings, id, at);
        let b = build_report_at(url_context(), &findings, id, at);
        assert_eq!(a, b);
    }

    #[test]
    fn test_html_input_preview_is_truncated() {
        let markup = format!("<p>{}</p>", "x".repeat(500));
        let input = ReportInput::from_request(&AnalysisRequest::html(markup.clone()));

        match &input {
            ReportInput::Html { preview, length } => {
                assert_eq!(preview.chars().count(), PREVIEW_CHARS);
                assert_eq!(*length, markup.len());
            }
            other => panic!("expected html input, got {:?}", other),
        }
        assert_eq!(input.kind(), "html");
    }

    #[test]
    fn test_report_json_shape() {
        let report = build_report(url_context(), &two_violations_ten_passes());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["analysisMethod"], "http_fetch");
        assert_eq!(json["reducedFidelity"], true);
        assert_eq!(json["input"]["kind"], "url");
        assert_eq!(json["violations"][0]["ruleId"], "image-alt");
        assert_eq!(json["violations"][0]["wcagReference"], "2a");
        assert_eq!(json["violations"][0]["fix"]["priority"], "High");
        assert_eq!(json["severityBreakdown"]["serious"], 0);
        assert_eq!(json["issueDistribution"][0]["category"], "Visual");
        assert_eq!(json["passes"][0]["nodeCount"], 1);

        let back: Report = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
