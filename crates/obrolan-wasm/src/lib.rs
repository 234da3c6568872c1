use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

mod chat_ui;
mod dom;
mod http;
mod storage;
mod view;

pub use http::FetchBackend;
pub use view::DomView;

/// Initialize the WASM application
/// This sets up panic hooks and logging
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    wasm_logger::init(wasm_logger::Config::default());

    log::info!("Obrolan WASM initialized");
}

/// Wire the chat page and load the sidebar
#[wasm_bindgen]
pub async fn init_chat() -> Result<(), JsValue> {
    log::info!("Initializing chat page");
    chat_ui::ChatApp::new()?.start().await
}

/// Get the window object
fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))
}

/// Get the document object
fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("No document object"))
}
