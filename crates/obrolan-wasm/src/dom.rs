use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement, HtmlTextAreaElement,
};

// Element IDs the page markup provides
pub const CHAT_FORM: &str = "chat-form";
pub const USER_INPUT: &str = "user-input";
pub const SUBMIT_BUTTON: &str = "submit-button";
pub const IMAGE_INPUT: &str = "image-input";
pub const IMAGE_PREVIEW_CONTAINER: &str = "image-preview-container";
pub const IMAGE_PREVIEW: &str = "image-preview";
pub const REMOVE_IMAGE_BUTTON: &str = "remove-image-button";
pub const CHAT_BOX: &str = "chat-box";
pub const CONVERSATION_LIST: &str = "conversation-list";
pub const NEW_CHAT_BUTTON: &str = "new-chat-button";
pub const WELCOME_MESSAGE: &str = "welcome-message";
pub const TEMPERATURE_SLIDER: &str = "temperature-slider";
pub const TEMPERATURE_VALUE: &str = "temperature-value";
pub const MODEL_SELECT: &str = "model-select";
pub const TOKENS_REMAINING: &str = "tokens-remaining";
pub const MENU_TOGGLE: &str = "menu-toggle";

pub const SIDEBAR_SELECTOR: &str = "aside";

pub const HIDDEN_CLASS: &str = "hidden";
pub const ACTIVE_CLASS: &str = "active";

/// Get element by ID
pub fn get_element_by_id(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Element not found: {}", id)))
}

/// Get element by ID and cast it
pub fn get_typed_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    get_element_by_id(document, id)?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Element has unexpected type: {}", id)))
}

/// Get input element by ID
pub fn get_input_by_id(document: &Document, id: &str) -> Result<HtmlInputElement, JsValue> {
    get_typed_by_id(document, id)
}

/// Get textarea element by ID
pub fn get_textarea_by_id(document: &Document, id: &str) -> Result<HtmlTextAreaElement, JsValue> {
    get_typed_by_id(document, id)
}

/// Create element with class
pub fn create_element_with_class(
    document: &Document,
    tag: &str,
    class: &str,
) -> Result<Element, JsValue> {
    let element = document.create_element(tag)?;
    element.set_class_name(class);
    Ok(element)
}

/// Attach a listener for the element's whole lifetime
pub fn add_listener<F>(target: &EventTarget, event: &str, callback: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget(); // Keep the closure alive
    Ok(())
}

/// The nearest ancestor (or self) of the event target matching `selector`
pub fn closest_target(event: &Event, selector: &str) -> Option<Element> {
    event
        .target()?
        .dyn_into::<Element>()
        .ok()?
        .closest(selector)
        .ok()
        .flatten()
}

pub fn set_hidden(element: &Element, hidden: bool) {
    let _ = element.class_list().toggle_with_force(HIDDEN_CLASS, hidden);
}

/// Clear element content
pub fn clear_element(element: &Element) {
    element.set_inner_html("");
}

/// Scroll element to bottom
pub fn scroll_to_bottom(element: &Element) {
    if let Ok(html_element) = element.clone().dyn_into::<HtmlElement>() {
        html_element.set_scroll_top(html_element.scroll_height());
    }
}

/// Grow a textarea with its content
pub fn fit_textarea(textarea: &HtmlTextAreaElement) {
    let style = textarea.style();
    let _ = style.set_property("height", "auto");
    let _ = style.set_property("height", &format!("{}px", textarea.scroll_height()));
}

pub fn reset_textarea_height(textarea: &HtmlTextAreaElement) {
    let _ = textarea.style().set_property("height", "auto");
}
