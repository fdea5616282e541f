//! Legal term explanation.
//!
//! A term is looked up in the local glossary first. Only on a miss is the
//! LLM service asked to explain it, through a coordinator of its own so an
//! explanation never coalesces with or waits behind an analysis. A failed
//! remote call is a miss with a reason, not an error.

use crate::client::{ContractApi, LLM_ANALYZE_PATH};
use crate::coordinator::{InFlightKey, RequestCoordinator};
use crate::error::AssistError;
use crate::glossary::GlossaryResolver;
use crate::models::{DefinitionSource, Explanation};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Instruction prepended to the term for the remote fallback.
pub const EXPLAIN_PROMPT_PREFIX: &str = "Explain the legal term: ";

/// Which resolution paths are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplainPolicy {
    pub use_glossary: bool,
    pub remote_fallback: bool,
}

impl Default for ExplainPolicy {
    fn default() -> Self {
        Self {
            use_glossary: true,
            remote_fallback: true,
        }
    }
}

pub struct TermExplainer {
    glossary: Arc<GlossaryResolver>,
    api: Arc<dyn ContractApi>,
    remote: RequestCoordinator<Value>,
    policy: ExplainPolicy,
}

impl TermExplainer {
    pub fn new(
        glossary: Arc<GlossaryResolver>,
        api: Arc<dyn ContractApi>,
        policy: ExplainPolicy,
    ) -> Self {
        Self {
            glossary,
            api,
            remote: RequestCoordinator::new(),
            policy,
        }
    }

    /// Explain `term`: glossary first, then the remote service.
    ///
    /// Errors only on a blank term ([`AssistError::InvalidInput`]) or when
    /// `cancel` fires ([`AssistError::Canceled`]).
    pub async fn explain(
        &self,
        term: &str,
        cancel: &CancellationToken,
    ) -> Result<Explanation, AssistError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(AssistError::InvalidInput("term is empty".to_string()));
        }

        if self.policy.use_glossary {
            if let Some(entry) = self.glossary.lookup(term) {
                debug!(term, "glossary hit");
                return Ok(Explanation::Found {
                    term: entry.term,
                    source: DefinitionSource::Glossary,
                    definition: entry.definition,
                });
            }
            debug!(term, "glossary miss");
        }

        if !self.policy.remote_fallback {
            return Ok(Explanation::Miss {
                term: term.to_string(),
                reason: None,
            });
        }

        self.explain_remotely(term, cancel).await
    }

    async fn explain_remotely(
        &self,
        term: &str,
        cancel: &CancellationToken,
    ) -> Result<Explanation, AssistError> {
        let prompt = format!("{}{}", EXPLAIN_PROMPT_PREFIX, term);
        let key = InFlightKey::new("POST", LLM_ANALYZE_PATH, &prompt.to_lowercase());
        info!(term, "asking remote service to explain term");

        let api = Arc::clone(&self.api);
        let outcome = self
            .remote
            .submit(key, cancel, move || async move { api.llm_analyze(&prompt).await })
            .await;

        let miss = |reason: String| Explanation::Miss {
            term: term.to_string(),
            reason: Some(reason),
        };

        match outcome {
            Ok(response) => match remote_definition(&response) {
                Some(definition) => Ok(Explanation::Found {
                    term: term.to_string(),
                    source: DefinitionSource::Remote,
                    definition,
                }),
                None => {
                    debug!(term, "remote response carried no explanation");
                    Ok(miss("no explanation available".to_string()))
                }
            },
            Err(AssistError::Canceled) => Err(AssistError::Canceled),
            Err(e) => {
                warn!(term, "remote explanation failed: {}", e);
                Ok(miss(e.to_string()))
            }
        }
    }
}

/// The explanation text in an LLM response, if there is any.
fn remote_definition(response: &Value) -> Option<String> {
    let text = match response {
        Value::String(s) => s.as_str(),
        other => other.get("analysisResult")?.as_str()?,
    };

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
