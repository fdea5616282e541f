//! Data models for contract analysis and term explanation.
//!
//! This module contains the canonical shapes every server payload is
//! normalized into, plus the small records passed between the core
//! components and the CLI.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Risk level of a flagged clause.
///
/// `Unknown` sorts lowest so threshold checks only ever trip on levels
/// the server actually reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Unknown,
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Unknown => write!(f, "UNKNOWN"),
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

impl RiskLevel {
    /// Parse a server-supplied level. Never fails; unrecognized input is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "HIGH" => RiskLevel::High,
            "MEDIUM" => RiskLevel::Medium,
            "LOW" => RiskLevel::Low,
            _ => RiskLevel::Unknown,
        }
    }

    /// Returns an emoji representation of the level.
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::High => "🔴",
            RiskLevel::Medium => "🟡",
            RiskLevel::Low => "🟢",
            RiskLevel::Unknown => "⚪",
        }
    }
}

/// A single flagged clause with its rationale and severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub clause: String,
    pub reason: String,
    #[serde(rename = "riskLevel")]
    pub risk_level: RiskLevel,
}

/// A request to analyze a piece of contract text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub title: String,
    pub content: String,
}

impl AnalysisRequest {
    /// Build a request, falling back to `default_title` when `title` is absent or blank.
    pub fn new(title: Option<&str>, content: impl Into<String>, default_title: &str) -> Self {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(default_title);

        Self {
            title: title.to_string(),
            content: content.into(),
        }
    }

    /// True when the content is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Client-side identifier correlating an async completion with the
/// action that triggered it. Not the server's contract id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The canonical analysis outcome handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    pub findings: Vec<RiskFinding>,
    /// The untouched server payload.
    pub raw: Value,
}

impl AnalysisResult {
    /// True if any finding is at or above `threshold` (ignoring `Unknown`).
    pub fn has_findings_at_or_above(&self, threshold: RiskLevel) -> bool {
        self.findings
            .iter()
            .any(|f| f.risk_level != RiskLevel::Unknown && f.risk_level >= threshold)
    }
}

/// One dictionary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
}

/// A saved contract from the history listing. Passed through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

/// Where an explanation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionSource {
    Glossary,
    Remote,
}

impl fmt::Display for DefinitionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionSource::Glossary => write!(f, "glossary"),
            DefinitionSource::Remote => write!(f, "remote"),
        }
    }
}

/// Outcome of explaining a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Explanation {
    Found {
        term: String,
        source: DefinitionSource,
        definition: String,
    },
    Miss {
        term: String,
        /// Why the remote fallback produced nothing, if it was attempted.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

#[allow(dead_code)] // Accessors for callers that only need the definition
impl Explanation {
    pub fn is_found(&self) -> bool {
        matches!(self, Explanation::Found { .. })
    }

    pub fn definition(&self) -> Option<&str> {
        match self {
            Explanation::Found { definition, .. } => Some(definition),
            Explanation::Miss { .. } => None,
        }
    }

    pub fn source(&self) -> Option<DefinitionSource> {
        match self {
            Explanation::Found { source, .. } => Some(*source),
            Explanation::Miss { .. } => None,
        }
    }
}

/// Result of a liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy(reason) => write!(f, "unhealthy ({})", reason),
        }
    }
}
