//! Transport to the contract and LLM services.
//!
//! [`ContractApi`] is the seam between the orchestration core and the
//! network; [`HttpContractApi`] is the reqwest-backed implementation.

pub mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpContractApi;

use crate::error::AssistError;
use crate::models::{AnalysisRequest, ContractRecord};
use async_trait::async_trait;
use serde_json::Value;

pub const ANALYZE_PATH: &str = "/api/contracts/analyze";
pub const UPLOAD_PATH: &str = "/api/contracts/upload";
pub const CONTRACTS_PATH: &str = "/api/contracts";
pub const LLM_ANALYZE_PATH: &str = "/api/llm/analyze";
pub const HEALTH_PATH: &str = "/actuator/health";

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The endpoints consumed by the core.
#[async_trait]
pub trait ContractApi: Send + Sync {
    /// `POST /api/contracts/analyze` with `{ title, content }`.
    async fn analyze_contract(&self, request: &AnalysisRequest) -> Result<Value, AssistError>;

    /// `POST /api/contracts/upload`; returns the extracted text.
    async fn upload_contract(&self, file: &UploadFile) -> Result<String, AssistError>;

    /// `POST /api/llm/analyze` with `{ content }`.
    async fn llm_analyze(&self, content: &str) -> Result<Value, AssistError>;

    /// `GET /api/contracts`.
    async fn list_contracts(&self) -> Result<Vec<ContractRecord>, AssistError>;

    /// `GET /actuator/health`; `Ok` on any 2xx.
    async fn health(&self) -> Result<(), AssistError>;
}

/// Pull extracted text out of an upload response body.
///
/// The upload endpoint answers either with `{ "content": "..." }` or with the
/// extracted text itself; the JSON form is tried first.
pub fn extract_upload_text(body: &str) -> Option<String> {
    let text = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map.get("content").and_then(Value::as_str)?.to_string(),
        Ok(Value::String(s)) => s,
        _ => body.to_string(),
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_upload_text_object() {
        let body = r#"{"content": "This Agreement is made..."}"#;
        assert_eq!(
            extract_upload_text(body).as_deref(),
            Some("This Agreement is made...")
        );
    }

    #[test]
    fn test_extract_upload_text_plain() {
        let body = "This Agreement is made...";
        assert_eq!(extract_upload_text(body).as_deref(), Some(body));
    }

    #[test]
    fn test_extract_upload_text_json_string() {
        assert_eq!(extract_upload_text(r#""quoted text""#).as_deref(), Some("quoted text"));
    }

    #[test]
    fn test_extract_upload_text_empty() {
        assert!(extract_upload_text("").is_none());
        assert!(extract_upload_text("   ").is_none());
        assert!(extract_upload_text(r#"{"content": ""}"#).is_none());
        assert!(extract_upload_text(r#"{"other": "x"}"#).is_none());
    }
}
