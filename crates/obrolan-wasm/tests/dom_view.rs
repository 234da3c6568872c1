#![cfg(target_arch = "wasm32")]

use obrolan_core::types::{ConversationSummary, Role};
use obrolan_core::{ClientConfig, RenderedMessage, View, ViewEvent};
use obrolan_wasm::DomView;
use wasm_bindgen_test::*;
use web_sys::Document;

wasm_bindgen_test_configure!(run_in_browser);

const FIXTURE: &str = r#"
<aside><ul id="conversation-list"></ul></aside>
<div id="welcome-message"></div>
<div id="chat-box"></div>
<form id="chat-form">
  <div id="image-preview-container" class="hidden"><img id="image-preview"></div>
  <input id="image-input" type="file">
  <textarea id="user-input"></textarea>
  <button id="submit-button" type="submit"></button>
</form>
"#;

fn fixture() -> Document {
    let document = web_sys::window().unwrap().document().unwrap();
    document.body().unwrap().set_inner_html(FIXTURE);
    document
}

fn view(document: &Document) -> DomView {
    DomView::new(document, &ClientConfig::default()).unwrap()
}

#[wasm_bindgen_test]
fn test_streamed_reply_gets_feedback_controls() {
    let document = fixture();
    let mut view = view(&document);

    view.apply(ViewEvent::StreamStarted);
    view.apply(ViewEvent::StreamChunk {
        html: "<p>Hel▐</p>".to_string(),
    });
    view.apply(ViewEvent::StreamDone {
        html: "<p>Hello</p>".to_string(),
        conversation_id: "1718000000".to_string(),
    });

    let chat_box = document.get_element_by_id("chat-box").unwrap();
    let reply = chat_box.query_selector(".message.model").unwrap().unwrap();
    assert!(!reply.class_list().contains("streaming"));
    assert_eq!(reply.query_selector(".message-content").unwrap().unwrap().inner_html(), "<p>Hello</p>");
    assert!(reply
        .query_selector(r#".feedback-controls[data-conversation-id="1718000000"]"#)
        .unwrap()
        .is_some());
}

#[wasm_bindgen_test]
fn test_sidebar_highlight_follows_active_conversation() {
    let document = fixture();
    let mut view = view(&document);

    view.apply(ViewEvent::ConversationsLoaded(vec![
        ConversationSummary {
            id: "a".to_string(),
            title: "Rendang".to_string(),
        },
        ConversationSummary {
            id: "b".to_string(),
            title: "Soto".to_string(),
        },
    ]));
    view.apply(ViewEvent::ActiveConversationChanged(Some("b".to_string())));

    let active = document.query_selector_all("#conversation-list .active").unwrap();
    assert_eq!(active.length(), 1);

    view.apply(ViewEvent::ActiveConversationChanged(None));
    let active = document.query_selector_all("#conversation-list .active").unwrap();
    assert_eq!(active.length(), 0);
}

#[wasm_bindgen_test]
fn test_new_chat_shows_welcome() {
    let document = fixture();
    let mut view = view(&document);

    view.apply(ViewEvent::MessageAppended(RenderedMessage {
        role: Role::User,
        html: "halo".to_string(),
        image_url: None,
    }));
    let welcome = document.get_element_by_id("welcome-message").unwrap();
    assert!(welcome.class_list().contains("hidden"));

    view.apply(ViewEvent::TranscriptCleared { show_welcome: true });
    assert!(!welcome.class_list().contains("hidden"));
    assert_eq!(document.get_element_by_id("chat-box").unwrap().child_element_count(), 0);
}
