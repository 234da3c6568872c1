use obrolan_types::ErrorBody;
use thiserror::Error;

use crate::config::Labels;

/// Everything that can go wrong between pressing send and the last chunk
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("network request failed: {0}")]
    Network(String),

    #[error("server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    #[error("rate limited: {detail}")]
    RateLimited { detail: String },

    #[error("request failed (HTTP {status}): {body}")]
    Http { status: u16, body: String },

    #[error("response stream interrupted: {0}")]
    Stream(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

impl ChatError {
    /// Classify a non-2xx response by status code
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            STATUS_INTERNAL_SERVER_ERROR => ChatError::Server {
                status,
                body: body.to_string(),
            },
            STATUS_TOO_MANY_REQUESTS => ChatError::RateLimited {
                detail: error_detail(body),
            },
            _ => ChatError::Http {
                status,
                body: body.to_string(),
            },
        }
    }

    /// Text shown in the transcript, styled as an assistant message
    pub fn user_message(&self, labels: &Labels) -> String {
        match self {
            ChatError::Network(_) => labels.connection_error.clone(),
            ChatError::Server { .. } => labels.server_error.clone(),
            ChatError::RateLimited { detail } if detail.is_empty() => labels.rate_limited.clone(),
            ChatError::RateLimited { detail } => format!("{} {}", labels.rate_limited, detail),
            ChatError::Http { status, body } => {
                let body = body.trim();
                if body.is_empty() {
                    format!("{} HTTP {}", labels.request_failed, status)
                } else {
                    body.to_string()
                }
            }
            ChatError::Stream(reason) => format!("{} {}", labels.stream_interrupted, reason),
            ChatError::Decode(reason) => format!("{} {}", labels.request_failed, reason),
        }
    }
}

/// Human-readable detail of an error body: a JSON `detail`/`error`/`message`
/// string when present, the trimmed text otherwise
pub fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_text)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Errors while loading [`crate::ClientConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid client configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
