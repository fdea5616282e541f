//! Report generation.
//!
//! This module renders canonical analysis results, explanations and the
//! contract history as Markdown or JSON. Every UI surface goes through here,
//! so field handling never drifts between them.

use crate::analysis::{generate_summary_text, group_by_level, sort_by_severity, RiskSummary};
use crate::models::{
    AnalysisResult, ContractRecord, DefinitionSource, Explanation, RequestId, RiskFinding,
    RiskLevel,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters of content shown per history entry.
const HISTORY_PREVIEW_CHARS: usize = 100;

/// Metadata about an analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Title the contract was submitted under.
    pub title: String,
    /// Client-side request id.
    pub request_id: RequestId,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Endpoint that performed the analysis.
    pub endpoint: String,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// A rendered-ready analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub summary: RiskSummary,
    /// Findings ordered by risk, high first.
    pub findings: Vec<RiskFinding>,
    /// The untouched server payload.
    pub raw: Value,
}

impl AnalysisReport {
    pub fn new(title: &str, endpoint: &str, result: AnalysisResult, duration_seconds: f64) -> Self {
        let mut findings = result.findings;
        sort_by_severity(&mut findings);

        Self {
            metadata: ReportMetadata {
                title: title.to_string(),
                request_id: result.request_id,
                analysis_date: Utc::now(),
                endpoint: endpoint.to_string(),
                duration_seconds,
            },
            summary: RiskSummary::from_findings(&findings),
            findings,
            raw: result.raw,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalysisReport, risk_tags: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Contract Analysis: {}\n\n", report.metadata.title));
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_findings_section(&report.findings, risk_tags));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Title:** {}\n", metadata.title));
    section.push_str(&format!("- **Request ID:** `{}`\n", metadata.request_id));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Endpoint:** `{}`\n", metadata.endpoint));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(summary: &RiskSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "| {} High | {} Medium | {} Low | {} Unknown | **Total** |\n",
        RiskLevel::High.emoji(),
        RiskLevel::Medium.emoji(),
        RiskLevel::Low.emoji(),
        RiskLevel::Unknown.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | **{}** |\n\n",
        summary.high, summary.medium, summary.low, summary.unknown, summary.total
    ));

    section
}

/// Generate the findings section, grouped by level.
fn generate_findings_section(findings: &[RiskFinding], risk_tags: bool) -> String {
    let mut section = String::new();

    section.push_str("## Findings\n\n");

    if findings.is_empty() {
        section.push_str("No analysis results found.\n\n");
        return section;
    }

    for (level, group) in group_by_level(findings) {
        section.push_str(&format!("### {} ({})\n\n", risk_badge(level, risk_tags), group.len()));
        for finding in group {
            section.push_str(&generate_finding_block(finding, risk_tags));
        }
    }

    section
}

fn risk_badge(level: RiskLevel, risk_tags: bool) -> String {
    if risk_tags {
        format!("{} **{}**", level.emoji(), level)
    } else {
        format!("**{}**", level)
    }
}

/// Generate a single finding block.
fn generate_finding_block(finding: &RiskFinding, risk_tags: bool) -> String {
    let mut block = String::new();

    block.push_str(&format!("**Clause:** {}\n\n", finding.clause));
    block.push_str(&format!("**Reason:** {}\n\n", finding.reason));
    block.push_str(&format!(
        "**Risk Level:** {}\n\n",
        risk_badge(finding.risk_level, risk_tags)
    ));
    block.push_str("---\n\n");

    block
}

/// Generate the report footer.
fn generate_footer() -> String {
    "*Report generated by Clausewise*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// One-line summary for the terminal.
pub fn generate_summary_line(report: &AnalysisReport) -> String {
    generate_summary_text(&report.summary)
}

/// Notice printed when findings meet the `--fail-on` threshold.
pub fn generate_threshold_notice(level: RiskLevel) -> String {
    format!(
        "⛔ Findings at or above {} risk. Failing (exit code 2).",
        level
    )
}

/// Render an explanation the way every surface should show it.
pub fn generate_explanation(explanation: &Explanation) -> String {
    match explanation {
        Explanation::Found {
            term,
            source: DefinitionSource::Glossary,
            definition,
        } => format!("📘 {}: {}", term, definition),
        Explanation::Found {
            term,
            source: DefinitionSource::Remote,
            definition,
        } => format!("🤖 {}: {}", term, definition),
        Explanation::Miss { term, .. } => format!("⚠️ No definition found for \"{}\".", term),
    }
}

/// Generate a JSON rendering of explanations.
pub fn generate_json_explanations(explanations: &[Explanation]) -> Result<String> {
    serde_json::to_string_pretty(explanations).map_err(Into::into)
}

/// Render the contract history listing.
pub fn generate_history_listing(records: &[ContractRecord]) -> String {
    if records.is_empty() {
        return "No contract history found.\n".to_string();
    }

    let mut listing = String::new();

    for record in records {
        let title = record
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Untitled");
        let preview: String = record
            .content
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(HISTORY_PREVIEW_CHARS)
            .collect();
        let created = record.created_at.as_deref().unwrap_or("Unknown");

        listing.push_str(&format!("**{}**\n", title));
        listing.push_str(&format!("{}...\n", preview));
        listing.push_str(&format!("Created: {}\n\n", created));
    }

    listing
}

/// Generate a JSON rendering of the contract history.
pub fn generate_json_history(records: &[ContractRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).map_err(Into::into)
}
