//! HTTP client for the contract service behind the API gateway.

use super::{
    extract_upload_text, ContractApi, UploadFile, ANALYZE_PATH, CONTRACTS_PATH, HEALTH_PATH,
    LLM_ANALYZE_PATH, UPLOAD_PATH,
};
use crate::error::AssistError;
use crate::models::{AnalysisRequest, ContractRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for [`HttpContractApi`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 60,
            api_key: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct LlmAnalyzeBody<'a> {
    content: &'a str,
}

/// reqwest-backed [`ContractApi`].
pub struct HttpContractApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpContractApi {
    /// Create a client for the given gateway.
    ///
    /// `base_url` should be like `http://localhost:8080` (a trailing slash is stripped).
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        info!("Using contract service at {}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, AssistError> {
        let response = self.authorize(builder).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistError::status(status.as_u16(), body));
        }

        Ok(response)
    }
}

/// Decode a 2xx analysis body. A body that is not JSON is kept as a string
/// so the normalizer can still see it and yield empty findings.
async fn read_payload(response: Response) -> Result<Value, AssistError> {
    let body = response.text().await?;
    Ok(parse_payload(body))
}

fn parse_payload(body: String) -> Value {
    match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            debug!("response body is not JSON ({}), keeping it as text", e);
            Value::String(body)
        }
    }
}

#[async_trait]
impl ContractApi for HttpContractApi {
    async fn analyze_contract(&self, request: &AnalysisRequest) -> Result<Value, AssistError> {
        let url = self.url(ANALYZE_PATH);
        debug!(url = %url, title = %request.title, "posting contract for analysis");

        let response = self.send(self.client.post(&url).json(request)).await?;
        read_payload(response).await
    }

    async fn upload_contract(&self, file: &UploadFile) -> Result<String, AssistError> {
        let url = self.url(UPLOAD_PATH);
        debug!(url = %url, file = %file.file_name, bytes = file.bytes.len(), "uploading contract");

        let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        let form = Form::new().part("file", part);

        let response = self.send(self.client.post(&url).multipart(form)).await?;
        let body = response.text().await?;

        extract_upload_text(&body).ok_or_else(|| {
            AssistError::MalformedResponse("upload response contained no text".to_string())
        })
    }

    async fn llm_analyze(&self, content: &str) -> Result<Value, AssistError> {
        let url = self.url(LLM_ANALYZE_PATH);
        debug!(url = %url, chars = content.len(), "posting to LLM service");

        let body = LlmAnalyzeBody { content };
        let response = self.send(self.client.post(&url).json(&body)).await?;
        read_payload(response).await
    }

    async fn list_contracts(&self) -> Result<Vec<ContractRecord>, AssistError> {
        let url = self.url(CONTRACTS_PATH);
        debug!(url = %url, "listing contract history");

        let response = self.send(self.client.get(&url)).await?;
        Ok(response.json().await?)
    }

    async fn health(&self) -> Result<(), AssistError> {
        let url = self.url(HEALTH_PATH);
        self.send(self.client.get(&url)).await?;
        Ok(())
    }
}
