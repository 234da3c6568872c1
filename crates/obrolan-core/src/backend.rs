use async_trait::async_trait;
use futures::stream::LocalBoxStream;
use obrolan_types::{
    ChatRequest, ConversationId, ConversationSummary, FeedbackRequest, HistoryEntry, TokenAllowance,
};

use crate::error::ChatError;

/// Raw reply body, chunk by chunk
pub type ByteStream = LocalBoxStream<'static, Result<Vec<u8>, ChatError>>;

/// The chat backend as seen from the page: one method per endpoint
///
/// Futures are not `Send`; everything runs on the browser's event loop.
#[async_trait(?Send)]
pub trait ChatBackend {
    /// Platform handle for an attached image (a `File` in the browser)
    type Image: Clone;

    /// `GET /get_conversations`
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ChatError>;

    /// `GET /get_history/{id}`
    async fn history(&self, conversation_id: &str) -> Result<Vec<HistoryEntry>, ChatError>;

    /// `POST /new_chat`
    async fn new_chat(&self) -> Result<ConversationId, ChatError>;

    /// `POST /chat`; resolves once the response headers arrived with a 2xx status
    async fn send_chat(&self, request: ChatRequest<Self::Image>) -> Result<ByteStream, ChatError>;

    /// `POST /feedback`
    async fn send_feedback(&self, feedback: &FeedbackRequest) -> Result<(), ChatError>;

    /// `GET /get_tokens_remaining`
    async fn tokens_remaining(&self) -> Result<TokenAllowance, ChatError>;
}
