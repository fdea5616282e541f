//! Error taxonomy for the analysis and explanation core.

use thiserror::Error;

/// Failures surfaced by the core operations.
///
/// `Clone` because a coalesced call hands the same outcome to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssistError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{}", transport_message(.status, .message))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("request canceled")]
    Canceled,
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("server returned {}: {}", code, message),
        None => format!("transport error: {}", message),
    }
}

impl AssistError {
    pub fn transport(message: impl Into<String>) -> Self {
        AssistError::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        AssistError::Transport {
            status: Some(status),
            message: body.into(),
        }
    }
}

impl From<reqwest::Error> for AssistError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AssistError::transport(format!("request timed out: {}", e))
        } else if e.is_connect() {
            AssistError::transport(format!("cannot connect to server: {}", e))
        } else if e.is_decode() {
            AssistError::MalformedResponse(e.to_string())
        } else {
            AssistError::transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AssistError {
    fn from(e: serde_json::Error) -> Self {
        AssistError::MalformedResponse(e.to_string())
    }
}
