//! Finding aggregation and statistics.
//!
//! This module provides utilities for summarizing, ordering and filtering
//! the findings of an analysis before they are rendered.

use crate::models::{RiskFinding, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Count of findings per risk level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

impl RiskSummary {
    /// Creates a summary from a list of findings.
    pub fn from_findings(findings: &[RiskFinding]) -> Self {
        let mut summary = Self {
            total: findings.len(),
            ..Self::default()
        };

        for finding in findings {
            match finding.risk_level {
                RiskLevel::High => summary.high += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::Low => summary.low += 1,
                RiskLevel::Unknown => summary.unknown += 1,
            }
        }

        summary
    }
}

/// Sort findings by risk (high first), keeping server order within a level.
pub fn sort_by_severity(findings: &mut [RiskFinding]) {
    findings.sort_by(|a, b| b.risk_level.cmp(&a.risk_level));
}

/// Drop findings below `min`. Unknown levels are always below any threshold.
pub fn retain_min_level(findings: &mut Vec<RiskFinding>, min: RiskLevel) {
    findings.retain(|f| f.risk_level != RiskLevel::Unknown && f.risk_level >= min);
}

/// Group findings by level, highest level first.
pub fn group_by_level(findings: &[RiskFinding]) -> Vec<(RiskLevel, Vec<&RiskFinding>)> {
    let mut grouped: BTreeMap<RiskLevel, Vec<&RiskFinding>> = BTreeMap::new();

    for finding in findings {
        grouped.entry(finding.risk_level).or_default().push(finding);
    }

    grouped.into_iter().rev().collect()
}

/// Generate a one-line text summary of finding counts.
pub fn generate_summary_text(summary: &RiskSummary) -> String {
    if summary.total == 0 {
        return "No risks found.".to_string();
    }

    let mut parts = vec![format!("{} finding(s)", summary.total)];
    for (level, count) in [
        (RiskLevel::High, summary.high),
        (RiskLevel::Medium, summary.medium),
        (RiskLevel::Low, summary.low),
        (RiskLevel::Unknown, summary.unknown),
    ] {
        if count > 0 {
            parts.push(format!("{} {}: {}", level.emoji(), level, count));
        }
    }

    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(clause: &str, level: RiskLevel) -> RiskFinding {
        RiskFinding {
            clause: clause.to_string(),
            reason: "Test reason".to_string(),
            risk_level: level,
        }
    }

    #[test]
    fn test_summary_counts() {
        let findings = vec![
            finding("a", RiskLevel::High),
            finding("b", RiskLevel::High),
            finding("c", RiskLevel::Low),
            finding("d", RiskLevel::Unknown),
        ];

        let summary = RiskSummary::from_findings(&findings);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.unknown, 1);
    }

    #[test]
    fn test_sort_is_stable_within_level() {
        let mut findings = vec![
            finding("low", RiskLevel::Low),
            finding("first high", RiskLevel::High),
            finding("unknown", RiskLevel::Unknown),
            finding("second high", RiskLevel::High),
        ];

        sort_by_severity(&mut findings);

        let clauses: Vec<_> = findings.iter().map(|f| f.clause.as_str()).collect();
        assert_eq!(clauses, ["first high", "second high", "low", "unknown"]);
    }

    #[test]
    fn test_retain_min_level() {
        let mut findings = vec![
            finding("a", RiskLevel::Low),
            finding("b", RiskLevel::Medium),
            finding("c", RiskLevel::High),
            finding("d", RiskLevel::Unknown),
        ];

        retain_min_level(&mut findings, RiskLevel::Medium);

        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.risk_level >= RiskLevel::Medium));
    }

    #[test]
    fn test_group_by_level_orders_high_first() {
        let findings = vec![
            finding("a", RiskLevel::Low),
            finding("b", RiskLevel::High),
            finding("c", RiskLevel::Low),
        ];

        let grouped = group_by_level(&findings);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, RiskLevel::High);
        assert_eq!(grouped[1].1.len(), 2);
    }

    #[test]
    fn test_summary_text() {
        assert_eq!(generate_summary_text(&RiskSummary::default()), "No risks found.");

        let summary = RiskSummary::from_findings(&[finding("a", RiskLevel::High)]);
        let text = generate_summary_text(&summary);
        assert!(text.contains("1 finding(s)"));
        assert!(text.contains("HIGH: 1"));
        assert!(!text.contains("LOW"));
    }
}
