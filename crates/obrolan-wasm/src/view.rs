//! [`View`] that draws into the page
//!
//! The session hands over HTML that is already safe to insert; this module
//! only places it, highlights code and keeps the controls in sync.

use js_sys::{Function, Reflect};
use obrolan_core::types::{escape_html, ConversationSummary, Role};
use obrolan_core::{feedback_controls, ClientConfig, Labels, RenderedMessage, View, ViewEvent};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlImageElement, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement,
};

use crate::dom;

pub struct DomView {
    document: Document,
    labels: Labels,
    chat_box: Element,
    conversation_list: Element,
    welcome: Option<Element>,
    input: HtmlTextAreaElement,
    submit_button: Option<HtmlButtonElement>,
    image_input: HtmlInputElement,
    preview_container: Element,
    preview_image: HtmlImageElement,
    temperature_slider: Option<HtmlInputElement>,
    temperature_value: Option<Element>,
    model_select: Option<HtmlSelectElement>,
    tokens: Option<Element>,
    /// Content element of the reply currently streaming
    streaming: Option<Element>,
}

impl DomView {
    pub fn new(document: &Document, config: &ClientConfig) -> Result<Self, JsValue> {
        let optional = |id: &str| document.get_element_by_id(id);

        let view = Self {
            document: document.clone(),
            labels: config.labels.clone(),
            chat_box: dom::get_element_by_id(document, dom::CHAT_BOX)?,
            conversation_list: dom::get_element_by_id(document, dom::CONVERSATION_LIST)?,
            welcome: optional(dom::WELCOME_MESSAGE),
            input: dom::get_textarea_by_id(document, dom::USER_INPUT)?,
            submit_button: optional(dom::SUBMIT_BUTTON).and_then(|e| e.dyn_into().ok()),
            image_input: dom::get_input_by_id(document, dom::IMAGE_INPUT)?,
            preview_container: dom::get_element_by_id(document, dom::IMAGE_PREVIEW_CONTAINER)?,
            preview_image: dom::get_typed_by_id(document, dom::IMAGE_PREVIEW)?,
            temperature_slider: optional(dom::TEMPERATURE_SLIDER).and_then(|e| e.dyn_into().ok()),
            temperature_value: optional(dom::TEMPERATURE_VALUE),
            model_select: optional(dom::MODEL_SELECT).and_then(|e| e.dyn_into().ok()),
            tokens: optional(dom::TOKENS_REMAINING),
            streaming: None,
        };
        view.fill_model_options(&config.models)?;
        Ok(view)
    }

    /// Offer the configured models unless the page already lists its own
    fn fill_model_options(&self, models: &[String]) -> Result<(), JsValue> {
        let Some(select) = &self.model_select else {
            return Ok(());
        };
        if select.length() > 0 {
            return Ok(());
        }
        for model in models {
            let option = self.document.create_element("option")?;
            option.set_attribute("value", model)?;
            option.set_text_content(Some(model));
            select.append_child(&option)?;
        }
        Ok(())
    }

    fn try_apply(&mut self, event: ViewEvent) -> Result<(), JsValue> {
        match event {
            ViewEvent::TranscriptCleared { show_welcome } => {
                self.streaming = None;
                dom::clear_element(&self.chat_box);
                self.show_welcome(show_welcome);
            }
            ViewEvent::MessageAppended(message) => self.append_message(message)?,
            ViewEvent::StreamStarted => self.start_reply()?,
            ViewEvent::StreamChunk { html } => {
                if let Some(content) = &self.streaming {
                    content.set_inner_html(&html);
                    dom::scroll_to_bottom(&self.chat_box);
                }
            }
            ViewEvent::StreamDone {
                html,
                conversation_id,
            } => {
                if let Some(content) = self.finish_reply(&html)? {
                    content.insert_adjacent_html(
                        "afterend",
                        &feedback_controls(&conversation_id, &self.labels),
                    )?;
                }
                dom::scroll_to_bottom(&self.chat_box);
            }
            ViewEvent::StreamAborted { html } => {
                self.finish_reply(&html)?;
            }
            ViewEvent::Error { message } => self.append_error(&message)?,
            ViewEvent::ConversationsLoaded(conversations) => {
                self.render_conversations(&conversations)?
            }
            ViewEvent::ActiveConversationChanged(id) => self.highlight_conversation(id.as_deref())?,
            ViewEvent::SubmitAvailability { enabled, sending } => {
                if let Some(button) = &self.submit_button {
                    button.set_disabled(!enabled);
                }
                self.chat_box
                    .set_attribute("aria-busy", if sending { "true" } else { "false" })?;
            }
            ViewEvent::ComposerCleared => {
                self.input.set_value("");
                dom::reset_textarea_height(&self.input);
            }
            ViewEvent::AttachmentChanged { preview_url } => match preview_url {
                Some(url) => {
                    self.preview_image.set_src(&url);
                    dom::set_hidden(&self.preview_container, false);
                }
                None => {
                    self.preview_image.set_src("");
                    self.image_input.set_value("");
                    dom::set_hidden(&self.preview_container, true);
                }
            },
            ViewEvent::TemperatureChanged { label } => {
                if let Some(slider) = &self.temperature_slider {
                    slider.set_value(&label);
                }
                if let Some(value) = &self.temperature_value {
                    value.set_text_content(Some(&label));
                }
            }
            ViewEvent::ModelChanged { model } => {
                if let Some(select) = &self.model_select {
                    select.set_value(&model);
                }
            }
            ViewEvent::TokensRemaining(allowance) => {
                if let Some(tokens) = &self.tokens {
                    let text = format!("{} {}", self.labels.tokens_remaining, allowance);
                    tokens.set_text_content(Some(&text));
                }
            }
            ViewEvent::FeedbackRecorded {
                conversation_id, ..
            } => self.thank_for_feedback(&conversation_id)?,
        }
        Ok(())
    }

    fn show_welcome(&self, visible: bool) {
        if let Some(welcome) = &self.welcome {
            dom::set_hidden(welcome, !visible);
        }
    }

    fn message_element(&self, role: Role) -> Result<(Element, Element), JsValue> {
        let message = dom::create_element_with_class(
            &self.document,
            "div",
            &format!("message {}", role.as_str()),
        )?;
        let content = dom::create_element_with_class(&self.document, "div", "message-content")?;
        message.append_child(&content)?;
        Ok((message, content))
    }

    fn append_message(&mut self, message: RenderedMessage) -> Result<(), JsValue> {
        self.show_welcome(false);

        let (element, content) = self.message_element(message.role)?;
        match message.role {
            Role::User => {
                if !message.html.is_empty() {
                    let text = dom::create_element_with_class(&self.document, "p", "message-text")?;
                    text.set_inner_html(&message.html);
                    content.append_child(&text)?;
                }
                if let Some(url) = &message.image_url {
                    let image: HtmlImageElement = dom::create_element_with_class(
                        &self.document,
                        "img",
                        "message-image",
                    )?
                    .dyn_into()?;
                    image.set_src(url);
                    content.append_child(&image)?;
                }
            }
            Role::Model => {
                content.class_list().add_1("markdown")?;
                content.set_inner_html(&message.html);
                highlight_code_blocks(&content)?;
            }
        }

        self.chat_box.append_child(&element)?;
        dom::scroll_to_bottom(&self.chat_box);
        Ok(())
    }

    fn start_reply(&mut self) -> Result<(), JsValue> {
        self.show_welcome(false);

        let (element, content) = self.message_element(Role::Model)?;
        element.class_list().add_1("streaming")?;
        content.class_list().add_1("markdown")?;
        self.chat_box.append_child(&element)?;
        dom::scroll_to_bottom(&self.chat_box);

        self.streaming = Some(content);
        Ok(())
    }

    /// Put the final render in place; returns the content element it filled
    fn finish_reply(&mut self, html: &str) -> Result<Option<Element>, JsValue> {
        let Some(content) = self.streaming.take() else {
            return Ok(None);
        };

        content.set_inner_html(html);
        highlight_code_blocks(&content)?;
        if let Some(message) = content.parent_element() {
            message.class_list().remove_1("streaming")?;
        }
        Ok(Some(content))
    }

    fn append_error(&mut self, message: &str) -> Result<(), JsValue> {
        self.show_welcome(false);

        let (element, content) = self.message_element(Role::Model)?;
        element.class_list().add_1("error")?;
        content.set_text_content(Some(message));
        self.chat_box.append_child(&element)?;
        dom::scroll_to_bottom(&self.chat_box);
        Ok(())
    }

    fn render_conversations(&self, conversations: &[ConversationSummary]) -> Result<(), JsValue> {
        dom::clear_element(&self.conversation_list);

        for conversation in conversations {
            let item = self.document.create_element("li")?;
            item.set_inner_html(&conversation_item(conversation));
            self.conversation_list.append_child(&item)?;
        }
        Ok(())
    }

    fn highlight_conversation(&self, active: Option<&str>) -> Result<(), JsValue> {
        let items = self.conversation_list.query_selector_all("[data-id]")?;
        for i in 0..items.length() {
            let Some(item) = items.item(i).and_then(|node| node.dyn_into::<Element>().ok()) else {
                continue;
            };
            let is_active = active.is_some() && item.get_attribute("data-id").as_deref() == active;
            item.class_list()
                .toggle_with_force(dom::ACTIVE_CLASS, is_active)?;
        }
        Ok(())
    }

    /// Replace the controls the user clicked with a thank-you note
    fn thank_for_feedback(&self, conversation_id: &str) -> Result<(), JsValue> {
        let groups = self
            .chat_box
            .query_selector_all(".feedback-controls[data-pending]")?;
        for i in 0..groups.length() {
            let Some(group) = groups.item(i).and_then(|node| node.dyn_into::<Element>().ok()) else {
                continue;
            };
            if group.get_attribute("data-conversation-id").as_deref() != Some(conversation_id) {
                continue;
            }
            group.remove_attribute("data-pending")?;
            group.set_text_content(Some(&self.labels.feedback_thanks));
        }
        Ok(())
    }
}

impl View for DomView {
    fn apply(&mut self, event: ViewEvent) {
        if let Err(e) = self.try_apply(event) {
            log::error!("Failed to update page: {:?}", e);
        }
    }
}

fn conversation_item(conversation: &ConversationSummary) -> String {
    let title = if conversation.title.trim().is_empty() {
        &conversation.id
    } else {
        &conversation.title
    };
    format!(
        r#"<button type="button" class="conversation-item" data-id="{}">{}</button>"#,
        escape_html(&conversation.id),
        escape_html(title)
    )
}

/// Run highlight.js over every code block under `root`, if the page loaded it
fn highlight_code_blocks(root: &Element) -> Result<(), JsValue> {
    let window = crate::window()?;
    let hljs = Reflect::get(&window, &JsValue::from_str("hljs"))?;
    if hljs.is_undefined() || hljs.is_null() {
        return Ok(());
    }
    let highlight: Function = Reflect::get(&hljs, &JsValue::from_str("highlightElement"))?
        .dyn_into()?;

    let blocks = root.query_selector_all("pre code")?;
    for i in 0..blocks.length() {
        if let Some(block) = blocks.item(i) {
            highlight.call1(&hljs, &block)?;
        }
    }
    Ok(())
}
