//! Response normalization.
//!
//! The analysis endpoints disagree on shape: findings may arrive wrapped in
//! `analysisResult`, as a bare array, as a JSON string produced by the LLM
//! service, or not at all. Risk levels come under several key spellings and
//! casings. Everything here collapses those variants into [`RiskFinding`]s
//! without ever failing.

use crate::models::{AnalysisResult, RequestId, RiskFinding, RiskLevel};
use serde_json::Value;

/// Placeholder for missing clause/reason text.
pub const PLACEHOLDER: &str = "N/A";

/// Keys a risk level may be reported under, in lookup order.
const RISK_LEVEL_KEYS: [&str; 3] = ["risk level", "risk_level", "riskLevel"];

/// Keys that wrap the findings array.
const FINDINGS_KEYS: [&str; 2] = ["analysisResult", "findings"];

/// Normalize a raw server payload into an [`AnalysisResult`].
pub fn normalize(request_id: RequestId, raw: &Value) -> AnalysisResult {
    AnalysisResult {
        request_id,
        findings: normalize_findings(raw),
        raw: raw.clone(),
    }
}

/// Extract canonical findings from any supported payload shape.
///
/// Input and output counts match 1:1 for every traversable record.
pub fn normalize_findings(raw: &Value) -> Vec<RiskFinding> {
    match locate_findings(raw) {
        Some(records) => records.iter().map(normalize_finding).collect(),
        None => Vec::new(),
    }
}

/// Find the findings array, unwrapping object and string envelopes.
fn locate_findings(raw: &Value) -> Option<Vec<Value>> {
    match raw {
        Value::Array(items) => Some(items.clone()),
        Value::Object(map) => FINDINGS_KEYS
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(locate_findings),
        // The LLM endpoint returns its findings as JSON text
        Value::String(text) => {
            let trimmed = text.trim();
            if !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
                return None;
            }
            serde_json::from_str::<Value>(trimmed)
                .ok()
                .as_ref()
                .and_then(locate_findings)
        }
        _ => None,
    }
}

fn normalize_finding(record: &Value) -> RiskFinding {
    RiskFinding {
        clause: text_field(record, "clause"),
        reason: text_field(record, "reason"),
        risk_level: risk_level_field(record),
    }
}

fn text_field(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_string()
}

fn risk_level_field(record: &Value) -> RiskLevel {
    RISK_LEVEL_KEYS
        .iter()
        .find_map(|key| record.get(*key).and_then(Value::as_str))
        .map(RiskLevel::parse)
        .unwrap_or(RiskLevel::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn level_of(value: Value) -> RiskLevel {
        let raw = json!([{ "clause": "c", "reason": "r", "risk_level": value }]);
        normalize_findings(&raw)[0].risk_level
    }

    #[test]
    fn test_risk_level_mapping() {
        let cases = [
            (json!("High"), RiskLevel::High),
            (json!("HIGH"), RiskLevel::High),
            (json!("Medium"), RiskLevel::Medium),
            (json!("MEDIUM"), RiskLevel::Medium),
            (json!("Low"), RiskLevel::Low),
            (json!("LOW"), RiskLevel::Low),
            (json!("weird"), RiskLevel::Unknown),
            (json!(""), RiskLevel::Unknown),
            (Value::Null, RiskLevel::Unknown),
        ];

        for (input, expected) in cases {
            assert_eq!(level_of(input.clone()), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_non_string_level_is_unknown() {
        assert_eq!(level_of(json!(3)), RiskLevel::Unknown);
    }

    #[test]
    fn test_key_spellings_are_equivalent() {
        let spaced = json!([{ "clause": "Termination", "reason": "One-sided", "risk level": "High" }]);
        let snake = json!([{ "clause": "Termination", "reason": "One-sided", "risk_level": "High" }]);

        assert_eq!(normalize_findings(&spaced), normalize_findings(&snake));
        assert_eq!(normalize_findings(&spaced)[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn test_wrapped_and_bare_shapes() {
        let finding = json!({ "clause": "Penalty", "reason": "Uncapped", "risk_level": "MEDIUM" });
        let wrapped = json!({ "analysisResult": [finding.clone()] });
        let bare = json!([finding]);

        assert_eq!(normalize_findings(&wrapped), normalize_findings(&bare));
        assert_eq!(normalize_findings(&wrapped).len(), 1);
    }

    #[test]
    fn test_llm_string_payload() {
        let raw = json!({
            "analysisResult": r#"[{"clause": "Indemnity", "reason": "Broad", "risk level": "low"}]"#
        });
        let findings = normalize_findings(&raw);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].clause, "Indemnity");
        assert_eq!(findings[0].risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_prose_string_payload_has_no_findings() {
        let raw = json!({ "analysisResult": "This contract looks fine." });
        assert!(normalize_findings(&raw).is_empty());
    }

    #[test]
    fn test_missing_fields_use_placeholder() {
        let raw = json!([{ "risk_level": "High" }, { "clause": "", "reason": 7 }, "garbage"]);
        let findings = normalize_findings(&raw);

        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].clause, PLACEHOLDER);
        assert_eq!(findings[0].reason, PLACEHOLDER);
        assert_eq!(findings[1].clause, PLACEHOLDER);
        assert_eq!(findings[1].reason, PLACEHOLDER);
        assert_eq!(findings[2].risk_level, RiskLevel::Unknown);
    }

    #[test]
    fn test_untraversable_payloads_are_empty() {
        for raw in [Value::Null, json!(42), json!({}), json!({ "analysisResult": null }), json!([])] {
            assert!(normalize_findings(&raw).is_empty(), "raw: {}", raw);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = json!({
            "analysisResult": [
                { "clause": "Auto-renewal", "reason": "Silent renewal", "risk level": "High" },
                { "clause": "Governing law", "reason": "Foreign venue", "risk_level": "low" },
                { "reason": "Vague" }
            ]
        });
        let first = normalize(RequestId::new(), &raw);
        let canonical = serde_json::to_value(&first).unwrap();
        let second = normalize(first.request_id, &canonical);

        assert_eq!(first.findings, second.findings);
        assert_eq!(first.request_id, second.request_id);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let raw = json!({ "analysisResult": [{ "clause": " padded ", "risk_level": "high" }] });
        let before = raw.clone();
        let result = normalize(RequestId::new(), &raw);

        assert_eq!(raw, before);
        assert_eq!(result.raw, before);
        assert_eq!(result.findings[0].clause, "padded");
    }
}
