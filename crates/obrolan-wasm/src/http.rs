//! [`ChatBackend`] over `fetch`

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use gloo_net::http::{Request, Response};
use js_sys::{Reflect, Uint8Array};
use obrolan_core::types::{
    chat_form, ChatRequest, ConversationId, ConversationSummary, FeedbackRequest, HistoryEntry,
    NewChatResponse, TokenAllowance, TokensRemainingResponse, CHAT_PATH, CONVERSATIONS_PATH,
    FEEDBACK_PATH, HISTORY_PATH, NEW_CHAT_PATH, TOKENS_REMAINING_PATH,
};
use obrolan_core::{ByteStream, ChatBackend, ChatError, ClientConfig};
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FormData, ReadableStream, ReadableStreamDefaultReader};

pub struct FetchBackend {
    config: ClientConfig,
}

impl FetchBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChatError> {
        let response = Request::get(&self.config.endpoint(path))
            .send()
            .await
            .map_err(network_error)?;

        decode_json(check_status(response).await?).await
    }
}

#[async_trait(?Send)]
impl ChatBackend for FetchBackend {
    type Image = File;

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        self.get_json(CONVERSATIONS_PATH).await
    }

    async fn history(&self, conversation_id: &str) -> Result<Vec<HistoryEntry>, ChatError> {
        let id: String = js_sys::encode_uri_component(conversation_id).into();
        self.get_json(&format!("{}/{}", HISTORY_PATH, id)).await
    }

    async fn new_chat(&self) -> Result<ConversationId, ChatError> {
        let response = Request::post(&self.config.endpoint(NEW_CHAT_PATH))
            .send()
            .await
            .map_err(network_error)?;

        let created: NewChatResponse = decode_json(check_status(response).await?).await?;
        Ok(created.conversation_id)
    }

    async fn send_chat(&self, request: ChatRequest<File>) -> Result<ByteStream, ChatError> {
        let form = FormData::new().map_err(js_error)?;
        for (name, value) in request.form_fields() {
            form.append_with_str(name, &value).map_err(js_error)?;
        }
        if let Some(file) = &request.image {
            form.append_with_blob_and_filename(chat_form::IMAGE, file, &file.name())
                .map_err(js_error)?;
        }

        let response = Request::post(&self.config.endpoint(CHAT_PATH))
            .body(form)
            .map_err(network_error)?
            .send()
            .await
            .map_err(network_error)?;

        let response = check_status(response).await?;
        match response.body() {
            Some(body) => Ok(read_body(body)),
            None => Ok(stream::empty().boxed_local()),
        }
    }

    async fn send_feedback(&self, feedback: &FeedbackRequest) -> Result<(), ChatError> {
        let response = Request::post(&self.config.endpoint(FEEDBACK_PATH))
            .json(feedback)
            .map_err(|e| ChatError::Decode(e.to_string()))?
            .send()
            .await
            .map_err(network_error)?;

        check_status(response).await?;
        Ok(())
    }

    async fn tokens_remaining(&self) -> Result<TokenAllowance, ChatError> {
        let response: TokensRemainingResponse = self.get_json(TOKENS_REMAINING_PATH).await?;
        Ok(response.tokens_remaining)
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Turn a non-2xx response into the matching [`ChatError`]
async fn check_status(response: Response) -> Result<Response, ChatError> {
    if response.ok() {
        return Ok(response);
    }

    let status = response.status();
    log::warn!("{} answered HTTP {}", response.url(), status);
    let body = response.text().await.unwrap_or_default();
    Err(ChatError::from_status(status, &body))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ChatError> {
    response
        .json()
        .await
        .map_err(|e| ChatError::Decode(e.to_string()))
}

/// Chunks of a `ReadableStream` as they arrive
fn read_body(body: ReadableStream) -> ByteStream {
    let reader: ReadableStreamDefaultReader = body.get_reader().unchecked_into();

    stream::unfold(Some(reader), |reader| async move {
        let reader = reader?;
        match next_chunk(&reader).await {
            Ok(Some(bytes)) => Some((Ok(bytes), Some(reader))),
            Ok(None) => None,
            // Yield the error once, then end
            Err(err) => Some((Err(err), None)),
        }
    })
    .boxed_local()
}

async fn next_chunk(reader: &ReadableStreamDefaultReader) -> Result<Option<Vec<u8>>, ChatError> {
    let result = JsFuture::from(reader.read()).await.map_err(stream_error)?;

    let done = Reflect::get(&result, &JsValue::from_str("done"))
        .map_err(stream_error)?
        .as_bool()
        .unwrap_or(true);
    if done {
        return Ok(None);
    }

    let value = Reflect::get(&result, &JsValue::from_str("value")).map_err(stream_error)?;
    Ok(Some(Uint8Array::new(&value).to_vec()))
}

// ============================================================================
// Errors
// ============================================================================

fn network_error(err: gloo_net::Error) -> ChatError {
    ChatError::Network(err.to_string())
}

fn js_error(value: JsValue) -> ChatError {
    ChatError::Network(js_message(&value))
}

fn stream_error(value: JsValue) -> ChatError {
    ChatError::Stream(js_message(&value))
}

fn js_message(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}
