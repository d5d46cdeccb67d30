// SPDX-License-Identifier: PMPL-1.0-or-later
//! Human-readable report rendering for the CLI

use super::Report;

pub fn render_text(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("=== wcagbot WCAG 2.1 AA Analysis Report ===\n\n");
    output.push_str(&format!("Input:      {}\n", report.input.label()));
    output.push_str(&format!("Analyzed:   {}\n", report.timestamp.to_rfc3339()));
    output.push_str(&format!("Method:     {}\n", report.analysis_method));
    if report.reduced_fidelity {
        output.push_str(
            "Note:       rendered without script execution; dynamic content may be missing\n",
        );
    }
    output.push('\n');

    output.push_str(&format!("Compliance score:   {}/100\n", report.compliance_score));
    output.push_str(&format!(
        "Impact score:       {}/100\n",
        report.accessibility_impact_score
    ));
    output.push_str(&format!(
        "Checks:             {} violation(s), {} passed, {} need review\n\n",
        report.total_issues,
        report.passes.len(),
        report.incomplete.len()
    ));

    if report.violations.is_empty() {
        output.push_str("No accessibility violations found.\n");
        if !report.incomplete.is_empty() {
            output.push_str("Some checks need manual review:\n");
            for check in &report.incomplete {
                output.push_str(&format!("  - [{}] {}\n", check.id, check.help));
            }
        }
        return output;
    }

    output.push_str("--- Severity ---\n");
    for (severity, count) in report.severity_breakdown.display_entries() {
        output.push_str(&format!("  {}: {}\n", severity, count));
    }
    output.push('\n');

    output.push_str("--- Categories ---\n");
    for share in report.issue_distribution.iter().filter(|s| s.count > 0) {
        output.push_str(&format!(
            "  {}: {} ({}%)\n",
            share.category, share.count, share.percentage
        ));
    }
    output.push('\n');

    output.push_str("--- Violations ---\n");
    for violation in &report.violations {
        output.push_str(&format!(
            "{}. [{}] {} ({})\n",
            violation.id, violation.rule_id, violation.help, violation.severity
        ));
        output.push_str(&format!(
            "  WCAG: {} (Level {})\n",
            violation.wcag_reference, violation.wcag_level
        ));
        if !violation.element.is_empty() {
            output.push_str(&format!(
                "  Element: {} ({} node(s))\n",
                violation.element, violation.node_count
            ));
        }
        output.push_str(&format!("  Affects: {}\n", violation.affected_users.join(", ")));
        output.push_str(&format!(
            "  Fix: {} [priority {}, effort {}]\n",
            violation.fix.summary, violation.fix.priority, violation.fix.effort
        ));
        output.push('\n');
    }

    output
}
