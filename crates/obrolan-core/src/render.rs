//! Incremental rendering of a streamed reply
//!
//! Every chunk re-renders the whole buffer with a cursor glyph appended; the
//! final render drops the glyph and decorates code blocks.

use futures::{Stream, StreamExt};
use obrolan_types::{escape_html, Role};

use crate::config::{ClientConfig, Labels};
use crate::decoder::Utf8Decoder;
use crate::error::ChatError;
use crate::markdown::{render_markdown, render_markdown_final};
use crate::view::{RenderedMessage, ViewEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub cursor_glyph: String,
    pub copy_label: String,
}

impl RenderOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            cursor_glyph: config.cursor_glyph.clone(),
            copy_label: config.labels.copy.clone(),
        }
    }
}

/// A completed reply: the decoded text and its final render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReply {
    pub text: String,
    pub html: String,
}

pub struct StreamRenderer {
    options: RenderOptions,
    decoder: Utf8Decoder,
    buffer: String,
    chunks: usize,
}

impl StreamRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            decoder: Utf8Decoder::new(),
            buffer: String::new(),
            chunks: 0,
        }
    }

    /// Feed one chunk of the body and return the in-progress render
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.chunks += 1;
        let text = self.decoder.decode(bytes);
        self.buffer.push_str(&text);

        let mut with_cursor = String::with_capacity(self.buffer.len() + self.options.cursor_glyph.len());
        with_cursor.push_str(&self.buffer);
        with_cursor.push_str(&self.options.cursor_glyph);
        render_markdown(&with_cursor)
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn finish(mut self) -> RenderedReply {
        let tail = self.decoder.finish();
        self.buffer.push_str(&tail);
        let html = render_markdown_final(&self.buffer, &self.options.copy_label);
        RenderedReply {
            text: self.buffer,
            html,
        }
    }
}

/// Drive a response body through a [`StreamRenderer`], reporting every
/// render to `emit`
///
/// A body error ends the loop: the partial reply is rendered once more
/// without the cursor and the error is returned for the caller to show.
pub async fn render_stream<S, F>(
    mut body: S,
    options: &RenderOptions,
    conversation_id: &str,
    mut emit: F,
) -> Result<RenderedReply, ChatError>
where
    S: Stream<Item = Result<Vec<u8>, ChatError>> + Unpin,
    F: FnMut(ViewEvent),
{
    let mut renderer = StreamRenderer::new(options.clone());
    emit(ViewEvent::StreamStarted);

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                let html = renderer.push(&bytes);
                emit(ViewEvent::StreamChunk { html });
            }
            Err(err) => {
                log::warn!(
                    "Reply stream failed after {} chunks: {}",
                    renderer.chunks(),
                    err
                );
                let partial = renderer.finish();
                emit(ViewEvent::StreamAborted { html: partial.html });
                return Err(err);
            }
        }
    }

    log::debug!("Reply stream finished after {} chunks", renderer.chunks());
    let reply = renderer.finish();
    emit(ViewEvent::StreamDone {
        html: reply.html.clone(),
        conversation_id: conversation_id.to_string(),
    });
    Ok(reply)
}

/// User text is shown verbatim: escaped, never interpreted as markdown
pub fn render_user_message(text: &str, image_url: Option<String>) -> RenderedMessage {
    RenderedMessage {
        role: Role::User,
        html: escape_html(text),
        image_url,
    }
}

pub fn render_model_message(text: &str, copy_label: &str) -> RenderedMessage {
    RenderedMessage {
        role: Role::Model,
        html: render_markdown_final(text, copy_label),
        image_url: None,
    }
}

/// Positive/negative buttons attached under a finished reply
pub fn feedback_controls(conversation_id: &str, labels: &Labels) -> String {
    let id = escape_html(conversation_id);
    format!(
        concat!(
            r#"<div class="feedback-controls" data-conversation-id="{id}">"#,
            r#"<button type="button" class="feedback-btn" data-conversation-id="{id}" data-positive="true">{up}</button>"#,
            r#"<button type="button" class="feedback-btn" data-conversation-id="{id}" data-positive="false">{down}</button>"#,
            "</div>"
        ),
        id = id,
        up = escape_html(&labels.feedback_positive),
        down = escape_html(&labels.feedback_negative),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use pretty_assertions::assert_eq;

    fn options() -> RenderOptions {
        RenderOptions::from_config(&ClientConfig::default())
    }

    fn chunks(parts: &[&[u8]]) -> impl Stream<Item = Result<Vec<u8>, ChatError>> + Unpin {
        stream::iter(parts.iter().map(|p| Ok::<_, ChatError>(p.to_vec())).collect::<Vec<_>>())
    }

    #[test]
    fn test_cursor_only_while_streaming() {
        let mut renderer = StreamRenderer::new(options());
        for part in ["Hel", "lo **wo", "rld**"] {
            let html = renderer.push(part.as_bytes());
            assert!(html.contains("▐"), "missing cursor in {:?}", html);
        }
        let reply = renderer.finish();
        assert!(!reply.html.contains("▐"));
        assert_eq!(reply.text, "Hello **world**");
    }

    #[test]
    fn test_example_chunks_render_like_whole_text() {
        let mut renderer = StreamRenderer::new(options());
        renderer.push(b"Hel");
        renderer.push(b"lo **wo");
        renderer.push(b"rld**");
        let reply = renderer.finish();

        assert_eq!(reply.html, render_markdown_final("Hello **world**", "Copy"));
        assert!(reply.html.contains("<strong>world</strong>"));
    }

    #[tokio::test]
    async fn test_render_stream_events() {
        let mut events = Vec::new();
        let reply = render_stream(
            chunks(&[b"Hel", b"lo **wo", b"rld**"]),
            &options(),
            "c1",
            |event| events.push(event),
        )
        .await
        .unwrap();

        assert_eq!(events.len(), 5);
        assert_eq!(events[0], ViewEvent::StreamStarted);
        for event in &events[1..4] {
            match event {
                ViewEvent::StreamChunk { html } => assert!(html.contains("▐")),
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(
            events[4],
            ViewEvent::StreamDone {
                html: reply.html.clone(),
                conversation_id: "c1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_empty_stream_renders_empty_body() {
        let mut events = Vec::new();
        let reply = render_stream(chunks(&[]), &options(), "c1", |event| events.push(event))
            .await
            .unwrap();

        assert_eq!(reply.text, "");
        assert_eq!(reply.html, "");
        assert_eq!(
            events,
            vec![
                ViewEvent::StreamStarted,
                ViewEvent::StreamDone {
                    html: String::new(),
                    conversation_id: "c1".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_error_renders_partial_without_cursor() {
        let body = stream::iter(vec![
            Ok(b"Sebagian ".to_vec()),
            Err(ChatError::Stream("connection reset".to_string())),
            Ok(b"never".to_vec()),
        ]);
        let mut events = Vec::new();
        let err = render_stream(body, &options(), "c1", |event| events.push(event))
            .await
            .unwrap_err();

        assert_eq!(err, ChatError::Stream("connection reset".to_string()));
        match events.last() {
            Some(ViewEvent::StreamAborted { html }) => {
                assert!(html.contains("Sebagian"));
                assert!(!html.contains("▐"));
                assert!(!html.contains("never"));
            }
            other => panic!("unexpected last event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multibyte_split_across_chunks() {
        let text = "Halo 🙂 dunia";
        let bytes = text.as_bytes();
        let (a, b) = bytes.split_at(7);
        let reply = render_stream(chunks(&[a, b]), &options(), "c1", |_| {})
            .await
            .unwrap();
        assert_eq!(reply.text, text);
        assert!(!reply.html.contains('\u{FFFD}'));
    }

    #[test]
    fn test_user_message_is_escaped() {
        let message = render_user_message("<b>hi</b> **not bold**", None);
        assert_eq!(message.role, Role::User);
        assert_eq!(message.html, "&lt;b&gt;hi&lt;/b&gt; **not bold**");
    }

    #[test]
    fn test_feedback_controls_carry_conversation_id() {
        let html = feedback_controls("17\"18", &Labels::default());
        assert_eq!(html.matches(r#"data-conversation-id="17&quot;18""#).count(), 3);
        assert!(html.contains(r#"data-positive="true""#));
        assert!(html.contains(r#"data-positive="false""#));
    }
}
