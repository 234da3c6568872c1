//! Client configuration
//!
//! The page may embed a JSON document overriding any of these fields; every
//! field has a default so a partial (or absent) document is fine.

use obrolan_types::{ChatSettings, DEFAULT_TEMPERATURE};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CURSOR_GLYPH: &str = "▐";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_COPY_FEEDBACK_MS: u32 = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix for every endpoint; empty means same origin
    pub base_url: String,
    /// Appended to the buffer while a reply is still streaming
    pub cursor_glyph: String,
    pub default_temperature: f32,
    pub default_model: String,
    /// Models offered in the model picker
    pub models: Vec<String>,
    /// How long a copy button shows its "copied" label
    pub copy_feedback_ms: u32,
    pub labels: Labels,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            cursor_glyph: DEFAULT_CURSOR_GLYPH.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            default_model: DEFAULT_MODEL.to_string(),
            models: vec![
                DEFAULT_MODEL.to_string(),
                "gemini-1.5-pro-latest".to_string(),
            ],
            copy_feedback_ms: DEFAULT_COPY_FEEDBACK_MS,
            labels: Labels::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Join an endpoint path onto `base_url`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn default_settings(&self) -> ChatSettings {
        ChatSettings::new(self.default_temperature, self.default_model.clone())
    }
}

/// User-visible strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub copy: String,
    pub copied: String,
    pub feedback_positive: String,
    pub feedback_negative: String,
    pub feedback_thanks: String,
    pub connection_error: String,
    pub server_error: String,
    pub rate_limited: String,
    pub request_failed: String,
    pub stream_interrupted: String,
    pub history_failed: String,
    pub tokens_remaining: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            copy: "Copy".to_string(),
            copied: "Copied!".to_string(),
            feedback_positive: "👍".to_string(),
            feedback_negative: "👎".to_string(),
            feedback_thanks: "Thanks for the feedback!".to_string(),
            connection_error: "Could not reach the server. Check your connection and try again."
                .to_string(),
            server_error: "The server ran into trouble answering. Please try again in a moment."
                .to_string(),
            rate_limited: "You have reached your usage limit.".to_string(),
            request_failed: "Request failed:".to_string(),
            stream_interrupted: "The response was interrupted:".to_string(),
            history_failed: "Could not load this conversation.".to_string(),
            tokens_remaining: "Tokens remaining:".to_string(),
        }
    }
}
