// SPDX-License-Identifier: PMPL-1.0-or-later
//! Fix instructions for violations

use crate::engine::{Impact, RawRuleResult};

use super::{FixInstructions, Priority};

pub const WCAG_QUICK_REFERENCE: &str = "https://www.w3.org/WAI/WCAG21/quickref/";

const CONTRAST_EXAMPLE: &str = r#"/* Text needs a contrast ratio of at least 4.5:1 against its background */
.content {
  color: #1f2937;
  background-color: #ffffff;
}"#;

const ALT_TEXT_EXAMPLE: &str = r#"<!-- Describe what the image conveys; use alt="" only for decoration -->
<img src="sales-chart.png" alt="Quarterly sales rose 20% between Q1 and Q2">"#;

const HEADING_EXAMPLE: &str = r#"<!-- Keep heading levels in sequence without skipping -->
<h1>Page title</h1>
<h2>Section</h2>
<h3>Subsection</h3>"#;

pub fn priority_for(impact: Option<Impact>) -> Priority {
    match impact {
        Some(Impact::Critical) | Some(Impact::Serious) => Priority::High,
        Some(Impact::Moderate) | None => Priority::Medium,
        Some(Impact::Minor) => Priority::Low,
    }
}

pub fn effort_for(impact: Option<Impact>) -> &'static str {
    match impact {
        Some(Impact::Critical) => "2-4 hours",
        Some(Impact::Serious) => "1-2 hours",
        Some(Impact::Moderate) => "30-60 minutes",
        Some(Impact::Minor) => "15-30 minutes",
        None => "1 hour",
    }
}

/// Illustrative snippet for a few well-known rule families
pub fn code_example(rule_id: &str) -> Option<String> {
    let example = if rule_id.contains("color-contrast") {
        CONTRAST_EXAMPLE
    } else if rule_id.contains("alt-text") || rule_id.contains("image-alt") {
        ALT_TEXT_EXAMPLE
    } else if rule_id.contains("heading") {
        HEADING_EXAMPLE
    } else {
        return None;
    };
    Some(example.to_string())
}

pub fn fix_instructions(rule: &RawRuleResult) -> FixInstructions {
    let impact = rule.impact_level();
    let first = rule.nodes.first();

    let summary = if rule.help.is_empty() {
        rule.description.clone()
    } else {
        rule.help.clone()
    };

    let mut steps = Vec::new();
    match first.map(|n| n.target.as_str()).filter(|t| !t.is_empty()) {
        Some(selector) => steps.push(format!("Locate the element matching `{}`", selector)),
        None => steps.push("Locate the affected elements on the page".to_string()),
    }
    steps.push(format!("Apply the fix: {}", summary));
    if let Some(failure) = first.and_then(|n| n.failure_summary.as_deref()) {
        steps.push(format!("Address the reported problem: {}", failure.trim()));
    }
    steps.push("Re-run the analysis to confirm the issue is resolved".to_string());

    let mut resources = Vec::new();
    if let Some(url) = rule.help_url.as_ref().filter(|u| !u.is_empty()) {
        resources.push(url.clone());
    }
    resources.push(WCAG_QUICK_REFERENCE.to_string());

    FixInstructions {
        summary,
        steps,
        code_example: code_example(&rule.id),
        priority: priority_for(impact),
        effort: effort_for(impact).to_string(),
        resources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RawNode;

    fn rule(id: &str, impact: Option<&str>) -> RawRuleResult {
        RawRuleResult {
            id: id.to_string(),
            impact: impact.map(String::from),
            description: "Ensures images have alternate text".to_string(),
            help: "Images must have alternate text".to_string(),
            help_url: Some("https://example.org/image-alt".to_string()),
            tags: vec!["wcag2a".to_string()],
            nodes: vec![RawNode {
                target: "main > img".to_string(),
                html: "<img src=\"a.png\">".to_string(),
                failure_summary: Some("Element does not have an alt attribute".to_string()),
                impact: impact.map(String::from),
            }],
        }
    }

    #[test]
    fn test_priority_and_effort_table() {
        assert_eq!(priority_for(Some(Impact::Critical)), Priority::High);
        assert_eq!(priority_for(Some(Impact::Serious)), Priority::High);
        assert_eq!(priority_for(Some(Impact::Moderate)), Priority::Medium);
        assert_eq!(priority_for(Some(Impact::Minor)), Priority::Low);
        assert_eq!(priority_for(None), Priority::Medium);
        assert_eq!(effort_for(Some(Impact::Critical)), "2-4 hours");
        assert_eq!(effort_for(Some(Impact::Minor)), "15-30 minutes");
        assert_eq!(effort_for(None), "1 hour");
    }

    #[test]
    fn test_code_examples_by_rule_family() {
        assert!(code_example("color-contrast").unwrap().contains("4.5:1"));
        assert!(code_example("image-alt").unwrap().contains("alt="));
        assert!(code_example("alt-text-missing").is_some());
        assert!(code_example("heading-order").unwrap().contains("<h2>"));
        assert_eq!(code_example("label"), None);
    }

    #[test]
    fn test_fix_instructions_steps_and_resources() {
        let fix = fix_instructions(&rule("image-alt", Some("critical")));

        assert_eq!(fix.summary, "Images must have alternate text");
        assert_eq!(fix.steps.len(), 4);
        assert!(fix.steps[0].contains("main > img"));
        assert!(fix.steps[2].contains("alt attribute"));
        assert!(fix.steps[3].starts_with("Re-run"));
        assert_eq!(fix.resources, vec!["https://example.org/image-alt", WCAG_QUICK_REFERENCE]);
        assert_eq!(fix.priority, Priority::High);
        assert_eq!(fix.effort, "2-4 hours");
        assert!(fix.code_example.is_some());
    }

    #[test]
    fn test_fix_without_nodes_or_help_url() {
        let mut bare = rule("custom-rule", Some("bogus"));
        bare.nodes.clear();
        bare.help_url = None;

        let fix = fix_instructions(&bare);
        assert_eq!(fix.steps.len(), 3);
        assert_eq!(fix.resources, vec![WCAG_QUICK_REFERENCE]);
        assert_eq!(fix.priority, Priority::Medium);
        assert_eq!(fix.code_example, None);
    }
}
