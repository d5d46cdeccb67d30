// SPDX-License-Identifier: PMPL-1.0-or-later
//! Score arithmetic

use super::wcag::Category;
use super::{CategoryShare, Severity, SeverityBreakdown};

/// Share of checks passed, with incomplete checks worth half
///
/// 100 when nothing was checked.
pub fn compliance_score(violations: usize, passes: usize, incomplete: usize) -> u8 {
    let total = violations + passes + incomplete;
    if total == 0 {
        return 100;
    }

    let earned = passes as f64 + 0.5 * incomplete as f64;
    (100.0 * earned / total as f64).round().clamp(0.0, 100.0) as u8
}

/// Weighted blast radius of the violations, capped at 100
pub fn impact_score(breakdown: &SeverityBreakdown) -> u8 {
    let raw = 15 * breakdown.critical + 8 * breakdown.serious + 2 * breakdown.total();
    raw.min(100) as u8
}

pub fn severity_breakdown<'a>(severities: impl IntoIterator<Item = &'a Severity>) -> SeverityBreakdown {
    let mut breakdown = SeverityBreakdown::default();
    for severity in severities {
        match severity {
            Severity::Critical => breakdown.critical += 1,
            Severity::Serious => breakdown.serious += 1,
            Severity::Moderate => breakdown.moderate += 1,
            Severity::Minor => breakdown.minor += 1,
        }
    }
    breakdown
}

/// Per-category counts in canonical order, every category present
pub fn category_distribution(categories: &[Category]) -> Vec<CategoryShare> {
    let total = categories.len();

    Category::ALL
        .iter()
        .map(|category| {
            let count = categories.iter().filter(|c| *c == category).count();
            let percentage = if total == 0 {
                0
            } else {
                (100.0 * count as f64 / total as f64).round() as u8
            };

            CategoryShare {
                category: *category,
                count,
                percentage,
                color: category.color().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliance_score() {
        assert_eq!(compliance_score(2, 10, 0), 83);
        assert_eq!(compliance_score(0, 0, 0), 100);
        assert_eq!(compliance_score(0, 5, 0), 100);
        assert_eq!(compliance_score(3, 0, 0), 0);
        assert_eq!(compliance_score(1, 1, 2), 50);
    }

    #[test]
    fn test_impact_score() {
        let breakdown = severity_breakdown(&[Severity::Critical, Severity::Minor]);
        assert_eq!(impact_score(&breakdown), 19);

        let heavy = severity_breakdown(&vec![Severity::Critical; 6]);
        assert_eq!(impact_score(&heavy), 100);

        assert_eq!(impact_score(&SeverityBreakdown::default()), 0);
    }

    #[test]
    fn test_distribution_percentages() {
        let shares = category_distribution(&[Category::Visual, Category::Visual, Category::Forms]);
        assert_eq!(shares.len(), 4);
        assert_eq!(shares[0].category, Category::Visual);
        assert_eq!(shares[0].count, 2);
        assert_eq!(shares[0].percentage, 67);
        assert_eq!(shares[2].percentage, 33);
        assert_eq!(shares[3].color, "#8b5cf6");
    }

    #[test]
    fn test_empty_distribution_is_all_zero() {
        let shares = category_distribution(&[]);
        assert!(shares.iter().all(|s| s.count == 0 && s.percentage == 0));
    }
}
