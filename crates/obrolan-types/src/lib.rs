//! Wire types shared by the obrolan crates
//!
//! Shapes follow what the chat backend sends and accepts on its six
//! endpoints. Nothing here performs I/O.

use serde::{Deserialize, Serialize};

pub mod settings;

pub use settings::{ChatSettings, DEFAULT_TEMPERATURE, MAX_TEMPERATURE, MIN_TEMPERATURE};

// ============================================================================
// Endpoints
// ============================================================================

pub const CONVERSATIONS_PATH: &str = "/get_conversations";
pub const HISTORY_PATH: &str = "/get_history";
pub const NEW_CHAT_PATH: &str = "/new_chat";
pub const CHAT_PATH: &str = "/chat";
pub const FEEDBACK_PATH: &str = "/feedback";
pub const TOKENS_REMAINING_PATH: &str = "/get_tokens_remaining";

/// Multipart field names of `POST /chat`
pub mod chat_form {
    pub const CONVERSATION_ID: &str = "conversation_id";
    pub const MESSAGE: &str = "message";
    pub const IMAGE: &str = "image";
    pub const TEMPERATURE: &str = "temperature";
    pub const MODEL_CHOICE: &str = "model_choice";
}

// ============================================================================
// Conversations
// ============================================================================

/// Conversation ID, opaque to the client
pub type ConversationId = String;

/// Sidebar entry returned by `GET /get_conversations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    #[serde(default)]
    pub title: String,
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One entry of `GET /get_history/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<String>,
}

impl HistoryEntry {
    /// The displayable text of the entry (its first part)
    pub fn text(&self) -> &str {
        self.parts.first().map(String::as_str).unwrap_or("")
    }
}

/// Response of `POST /new_chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChatResponse {
    pub conversation_id: ConversationId,
}

// ============================================================================
// Chat, feedback and tokens
// ============================================================================

/// Body of `POST /chat`, generic over the platform's image handle
#[derive(Debug, Clone)]
pub struct ChatRequest<I> {
    pub conversation_id: ConversationId,
    pub message: Option<String>,
    pub image: Option<I>,
    pub settings: ChatSettings,
}

impl<I> ChatRequest<I> {
    /// Text fields of the multipart form, in the order they are appended
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            (chat_form::CONVERSATION_ID, self.conversation_id.clone()),
            (chat_form::TEMPERATURE, self.settings.temperature_label()),
            (chat_form::MODEL_CHOICE, self.settings.model_choice.clone()),
        ];
        if let Some(message) = &self.message {
            fields.push((chat_form::MESSAGE, message.clone()));
        }
        fields
    }
}

/// Body of `POST /feedback`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub conversation_id: ConversationId,
    pub is_positive: bool,
}

/// Remaining token allowance; upgraded plans report a label instead of a count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenAllowance {
    Limited(u64),
    Unlimited(String),
}

impl std::fmt::Display for TokenAllowance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenAllowance::Limited(count) => write!(f, "{}", count),
            TokenAllowance::Unlimited(label) => f.write_str(label),
        }
    }
}

/// Response of `GET /get_tokens_remaining`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensRemainingResponse {
    pub tokens_remaining: TokenAllowance,
}

/// JSON error body some endpoints send with a non-2xx status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_text(self) -> Option<String> {
        self.detail.or(self.error).or(self.message)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Escape HTML to prevent XSS
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_history_entry_parsing() {
        let json = r#"[
            {"role": "user", "parts": ["Halo"]},
            {"role": "model", "parts": ["Halo juga!"]},
            {"role": "assistant", "parts": []}
        ]"#;
        let history: Vec<HistoryEntry> = serde_json::from_str(json).unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text(), "Halo");
        assert_eq!(history[1].role, Role::Model);
        assert_eq!(history[2].role, Role::Model);
        assert_eq!(history[2].text(), "");
    }

    #[test]
    fn test_conversation_summary_without_title() {
        let summary: ConversationSummary = serde_json::from_str(r#"{"id": "1718000000"}"#).unwrap();
        assert_eq!(summary.id, "1718000000");
        assert_eq!(summary.title, "");
    }

    #[test]
    fn test_token_allowance_variants() {
        let limited: TokensRemainingResponse =
            serde_json::from_str(r#"{"tokens_remaining": 4200}"#).unwrap();
        assert_eq!(limited.tokens_remaining, TokenAllowance::Limited(4200));
        assert_eq!(limited.tokens_remaining.to_string(), "4200");

        let unlimited: TokensRemainingResponse =
            serde_json::from_str(r#"{"tokens_remaining": "Unlimited"}"#).unwrap();
        assert_eq!(
            unlimited.tokens_remaining,
            TokenAllowance::Unlimited("Unlimited".to_string())
        );
    }

    #[test]
    fn test_feedback_request_shape() {
        let body = FeedbackRequest {
            conversation_id: "abc".to_string(),
            is_positive: false,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"conversation_id":"abc","is_positive":false}"#
        );
    }

    #[test]
    fn test_chat_request_form_fields() {
        let request: ChatRequest<()> = ChatRequest {
            conversation_id: "42".to_string(),
            message: Some("hi".to_string()),
            image: None,
            settings: ChatSettings::new(0.3, "gemini-1.5-pro"),
        };
        assert_eq!(
            request.form_fields(),
            vec![
                ("conversation_id", "42".to_string()),
                ("temperature", "0.3".to_string()),
                ("model_choice", "gemini-1.5-pro".to_string()),
                ("message", "hi".to_string()),
            ]
        );

        let image_only: ChatRequest<()> = ChatRequest {
            message: None,
            image: Some(()),
            ..request
        };
        assert!(image_only.form_fields().iter().all(|(name, _)| *name != "message"));
    }

    #[test]
    fn test_error_body_prefers_detail() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "rate_limited", "detail": "Try again in 60s"}"#).unwrap();
        assert_eq!(body.into_text().as_deref(), Some("Try again in 60s"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<img src=x onerror="alert('1')"> & co"#),
            "&lt;img src=x onerror=&quot;alert(&#39;1&#39;)&quot;&gt; &amp; co"
        );
    }
}
