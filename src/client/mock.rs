//! Scriptable in-memory [`ContractApi`] for tests.

use super::{ContractApi, UploadFile};
use crate::error::AssistError;
use crate::models::{AnalysisRequest, ContractRecord};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Records call counts per endpoint and answers with canned responses.
pub struct MockContractApi {
    pub analyze_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub llm_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub health_calls: AtomicUsize,
    pub analyze_response: Mutex<Result<Value, AssistError>>,
    pub upload_response: Mutex<Result<String, AssistError>>,
    pub llm_response: Mutex<Result<Value, AssistError>>,
    pub health_response: Mutex<Result<(), AssistError>>,
    pub last_llm_content: Mutex<Option<String>>,
    pub last_analyze_request: Mutex<Option<AnalysisRequest>>,
    /// Applied before every answer.
    pub delay: Duration,
}

impl Default for MockContractApi {
    fn default() -> Self {
        Self {
            analyze_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            llm_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            analyze_response: Mutex::new(Ok(json!({
                "analysisResult": [
                    { "clause": "Termination", "reason": "One-sided", "risk level": "High" }
                ]
            }))),
            upload_response: Mutex::new(Ok("Extracted contract text".to_string())),
            llm_response: Mutex::new(Ok(json!({ "analysisResult": "A remote definition." }))),
            health_response: Mutex::new(Ok(())),
            last_llm_content: Mutex::new(None),
            last_analyze_request: Mutex::new(None),
            delay: Duration::ZERO,
        }
    }
}

impl MockContractApi {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn fail_upload(self, err: AssistError) -> Self {
        *self.upload_response.lock().unwrap() = Err(err);
        self
    }

    pub fn fail_llm(self, err: AssistError) -> Self {
        *self.llm_response.lock().unwrap() = Err(err);
        self
    }

    pub fn fail_health(self, err: AssistError) -> Self {
        *self.health_response.lock().unwrap() = Err(err);
        self
    }

    pub fn with_llm_response(self, value: Value) -> Self {
        *self.llm_response.lock().unwrap() = Ok(value);
        self
    }

    pub fn with_upload_response(self, text: &str) -> Self {
        *self.upload_response.lock().unwrap() = Ok(text.to_string());
        self
    }

    pub fn network_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
            + self.upload_calls.load(Ordering::SeqCst)
            + self.llm_calls.load(Ordering::SeqCst)
            + self.list_calls.load(Ordering::SeqCst)
            + self.health_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl ContractApi for MockContractApi {
    async fn analyze_contract(&self, request: &AnalysisRequest) -> Result<Value, AssistError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_analyze_request.lock().unwrap() = Some(request.clone());
        self.pause().await;
        self.analyze_response.lock().unwrap().clone()
    }

    async fn upload_contract(&self, _file: &UploadFile) -> Result<String, AssistError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.upload_response.lock().unwrap().clone()
    }

    async fn llm_analyze(&self, content: &str) -> Result<Value, AssistError> {
        self.llm_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_llm_content.lock().unwrap() = Some(content.to_string());
        self.pause().await;
        self.llm_response.lock().unwrap().clone()
    }

    async fn list_contracts(&self) -> Result<Vec<ContractRecord>, AssistError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(vec![ContractRecord {
            title: Some("Lease".to_string()),
            content: Some("The tenant shall...".to_string()),
            created_at: Some("2026-01-05T10:00:00Z".to_string()),
        }])
    }

    async fn health(&self) -> Result<(), AssistError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.health_response.lock().unwrap().clone()
    }
}
