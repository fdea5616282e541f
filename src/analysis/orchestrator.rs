//! Contract analysis pipeline.
//!
//! Text analysis is a single coalesced call followed by normalization.
//! File analysis is two phases: upload for text extraction, then the same
//! text pipeline. The second phase never starts if the first fails.

use super::normalizer::normalize;
use crate::client::{ContractApi, UploadFile, ANALYZE_PATH, LLM_ANALYZE_PATH, UPLOAD_PATH};
use crate::coordinator::{InFlightKey, RequestCoordinator};
use crate::error::AssistError;
use crate::models::{AnalysisRequest, AnalysisResult, ContractRecord, RequestId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Title used for uploads with neither a hint nor a file name.
pub const UPLOAD_FALLBACK_TITLE: &str = "Uploaded Contract";

/// Which endpoint performs risk analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisRoute {
    /// `POST /api/contracts/analyze` with title and content
    #[default]
    Contracts,
    /// `POST /api/llm/analyze` with content only
    Llm,
}

impl AnalysisRoute {
    pub fn endpoint(&self) -> &'static str {
        match self {
            AnalysisRoute::Contracts => ANALYZE_PATH,
            AnalysisRoute::Llm => LLM_ANALYZE_PATH,
        }
    }
}

/// Answers "analyze this text/file" with a canonical [`AnalysisResult`].
pub struct ContractAnalysisOrchestrator {
    api: Arc<dyn ContractApi>,
    route: AnalysisRoute,
    analyses: RequestCoordinator<Value>,
    uploads: RequestCoordinator<String>,
}

impl ContractAnalysisOrchestrator {
    pub fn new(api: Arc<dyn ContractApi>, route: AnalysisRoute) -> Self {
        Self {
            api,
            route,
            analyses: RequestCoordinator::new(),
            uploads: RequestCoordinator::new(),
        }
    }

    /// Analyze a piece of contract text.
    ///
    /// Blank content is rejected with [`AssistError::InvalidInput`] before any
    /// network call. A 2xx response of unexpected shape yields empty findings.
    pub async fn analyze_text(
        &self,
        request: AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AssistError> {
        if request.is_blank() {
            return Err(AssistError::InvalidInput(
                "contract content is empty".to_string(),
            ));
        }

        let request_id = RequestId::new();
        let endpoint = self.route.endpoint();
        let key = InFlightKey::new("POST", endpoint, &request.content);

        info!(
            request_id = %request_id,
            title = %request.title,
            chars = request.content.len(),
            endpoint,
            "analyzing contract text"
        );

        let api = Arc::clone(&self.api);
        let route = self.route;
        let raw = self
            .analyses
            .submit(key, cancel, move || async move {
                match route {
                    AnalysisRoute::Contracts => api.analyze_contract(&request).await,
                    AnalysisRoute::Llm => api.llm_analyze(&request.content).await,
                }
            })
            .await?;

        let result = normalize(request_id, &raw);
        if result.findings.is_empty() {
            debug!(request_id = %request_id, "response contained no findings");
        }
        info!(
            request_id = %request_id,
            findings = result.findings.len(),
            "analysis complete"
        );

        Ok(result)
    }

    /// Upload a file for text extraction, then analyze the extracted text.
    ///
    /// Any phase-one failure is reported as [`AssistError::UploadFailed`] and
    /// the analysis endpoint is never called.
    pub async fn analyze_upload(
        &self,
        file: UploadFile,
        title_hint: &str,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AssistError> {
        if file.bytes.is_empty() {
            return Err(AssistError::InvalidInput(format!(
                "file {} is empty",
                file.file_name
            )));
        }

        let title = upload_title(title_hint, &file.file_name);
        let content = self.extract_text(file, cancel).await?;

        let request = AnalysisRequest { title, content };
        self.analyze_text(request, cancel).await
    }

    async fn extract_text(
        &self,
        file: UploadFile,
        cancel: &CancellationToken,
    ) -> Result<String, AssistError> {
        let key = InFlightKey::for_bytes("POST", UPLOAD_PATH, &file.bytes);
        info!(file = %file.file_name, bytes = file.bytes.len(), "uploading contract for extraction");

        let api = Arc::clone(&self.api);
        let extracted = self
            .uploads
            .submit(key, cancel, move || async move { api.upload_contract(&file).await })
            .await;

        match extracted {
            Ok(text) if text.trim().is_empty() => {
                warn!("upload returned no extracted text");
                Err(AssistError::UploadFailed(
                    "no text could be extracted from the file".to_string(),
                ))
            }
            Ok(text) => Ok(text),
            Err(AssistError::Canceled) => Err(AssistError::Canceled),
            Err(e) => {
                warn!("upload failed: {}", e);
                Err(AssistError::UploadFailed(e.to_string()))
            }
        }
    }

    /// Saved contracts, passed through for the history listing.
    pub async fn history(&self) -> Result<Vec<ContractRecord>, AssistError> {
        let records = self.api.list_contracts().await?;
        info!(count = records.len(), "loaded contract history");
        Ok(records)
    }
}

fn upload_title(title_hint: &str, file_name: &str) -> String {
    [title_hint, file_name]
        .into_iter()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or(UPLOAD_FALLBACK_TITLE)
        .to_string()
}
