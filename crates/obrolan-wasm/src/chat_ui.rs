use std::rc::Rc;

use js_sys::{Function, Promise, Reflect};
use obrolan_core::{ChatSession, PendingImage, SubmitOutcome};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, HtmlSelectElement, KeyboardEvent, Url};

use crate::dom;
use crate::http::FetchBackend;
use crate::storage;
use crate::view::DomView;

type Session = ChatSession<FetchBackend, DomView>;

pub struct ChatApp {
    document: Document,
    session: Rc<Session>,
}

impl ChatApp {
    pub fn new() -> Result<Self, JsValue> {
        let document = crate::document()?;
        let config = storage::load_config(&document);

        let view = DomView::new(&document, &config)?;
        let backend = FetchBackend::new(&config);
        let session = ChatSession::new(backend, view, config);

        if let Some(settings) = storage::load_settings() {
            log::debug!("Restoring settings {:?}", settings);
            session.set_temperature(settings.temperature);
            session.set_model_choice(&settings.model_choice);
        }

        Ok(Self {
            document,
            session: Rc::new(session),
        })
    }

    pub async fn start(self) -> Result<(), JsValue> {
        // Set up UI event listeners
        self.setup_submit()?;
        self.setup_message_input()?;
        self.setup_image_input()?;
        self.setup_new_chat()?;
        self.setup_conversation_list()?;
        self.setup_settings()?;
        self.setup_transcript_actions()?;
        self.setup_menu_toggle()?;

        self.session.start().await;
        Ok(())
    }

    // ========================================================================
    // Composer
    // ========================================================================

    fn setup_submit(&self) -> Result<(), JsValue> {
        let form = dom::get_element_by_id(&self.document, dom::CHAT_FORM)?;
        let session = self.session.clone();
        let document = self.document.clone();

        dom::add_listener(&form, "submit", move |event| {
            event.prevent_default();
            submit_handler(session.clone(), document.clone());
        })?;

        // Enter sends, Shift+Enter inserts a newline
        let input = dom::get_textarea_by_id(&self.document, dom::USER_INPUT)?;
        let session = self.session.clone();
        let document = self.document.clone();

        let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            if event.key() == "Enter" && !event.shift_key() && !event.is_composing() {
                event.prevent_default();
                submit_handler(session.clone(), document.clone());
            }
        }) as Box<dyn FnMut(_)>);

        input.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();

        Ok(())
    }

    fn setup_message_input(&self) -> Result<(), JsValue> {
        let input = dom::get_textarea_by_id(&self.document, dom::USER_INPUT)?;
        let session = self.session.clone();
        let textarea = input.clone();

        // Auto-resize and track whether there is something to send
        dom::add_listener(&input, "input", move |_| {
            dom::fit_textarea(&textarea);
            session.composer_changed(&textarea.value());
        })
    }

    fn setup_image_input(&self) -> Result<(), JsValue> {
        let image_input = dom::get_input_by_id(&self.document, dom::IMAGE_INPUT)?;
        let session = self.session.clone();
        let input = image_input.clone();

        dom::add_listener(&image_input, "change", move |_| {
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                session.remove_image();
                return;
            };

            let preview_url = match Url::create_object_url_with_blob(&file) {
                Ok(url) => Some(url),
                Err(e) => {
                    log::warn!("No preview for {}: {:?}", file.name(), e);
                    None
                }
            };
            session.attach_image(PendingImage {
                name: file.name(),
                preview_url,
                handle: file,
            });
        })?;

        let remove = dom::get_element_by_id(&self.document, dom::REMOVE_IMAGE_BUTTON)?;
        let session = self.session.clone();
        dom::add_listener(&remove, "click", move |event| {
            event.prevent_default();
            session.remove_image();
        })
    }

    // ========================================================================
    // Sidebar
    // ========================================================================

    fn setup_new_chat(&self) -> Result<(), JsValue> {
        let button = dom::get_element_by_id(&self.document, dom::NEW_CHAT_BUTTON)?;
        let session = self.session.clone();

        dom::add_listener(&button, "click", move |_| {
            let session = session.clone();
            spawn_local(async move {
                session.start_new_chat().await;
            });
        })
    }

    fn setup_conversation_list(&self) -> Result<(), JsValue> {
        let list = dom::get_element_by_id(&self.document, dom::CONVERSATION_LIST)?;
        let session = self.session.clone();

        dom::add_listener(&list, "click", move |event| {
            let Some(id) = dom::closest_target(&event, "[data-id]")
                .and_then(|item| item.get_attribute("data-id"))
            else {
                return;
            };

            let session = session.clone();
            spawn_local(async move {
                if let Err(e) = session.open_conversation(&id).await {
                    log::error!("Failed to open conversation {}: {}", id, e);
                }
            });
        })
    }

    fn setup_menu_toggle(&self) -> Result<(), JsValue> {
        let (Some(toggle), Some(sidebar)) = (
            self.document.get_element_by_id(dom::MENU_TOGGLE),
            self.document.query_selector(dom::SIDEBAR_SELECTOR).ok().flatten(),
        ) else {
            return Ok(());
        };

        dom::add_listener(&toggle, "click", move |_| {
            let _ = sidebar.class_list().toggle(dom::HIDDEN_CLASS);
            let _ = sidebar.class_list().toggle("md:flex");
        })
    }

    // ========================================================================
    // Settings
    // ========================================================================

    fn setup_settings(&self) -> Result<(), JsValue> {
        if let Ok(slider) = dom::get_input_by_id(&self.document, dom::TEMPERATURE_SLIDER) {
            let session = self.session.clone();
            let input = slider.clone();

            dom::add_listener(&slider, "input", move |_| {
                match input.value().parse::<f32>() {
                    Ok(temperature) => storage::save_settings(&session.set_temperature(temperature)),
                    Err(e) => log::warn!("Bad temperature {:?}: {}", input.value(), e),
                }
            })?;
        }

        if let Ok(select) = dom::get_typed_by_id::<HtmlSelectElement>(&self.document, dom::MODEL_SELECT)
        {
            let session = self.session.clone();
            let input = select.clone();

            dom::add_listener(&select, "change", move |_| {
                storage::save_settings(&session.set_model_choice(&input.value()));
            })?;
        }

        Ok(())
    }

    // ========================================================================
    // Copy buttons and feedback, delegated from the transcript
    // ========================================================================

    fn setup_transcript_actions(&self) -> Result<(), JsValue> {
        let chat_box = dom::get_element_by_id(&self.document, dom::CHAT_BOX)?;
        let session = self.session.clone();

        dom::add_listener(&chat_box, "click", move |event| {
            if let Some(button) = dom::closest_target(&event, ".copy-code-btn") {
                let labels = session.config().labels.clone();
                let delay_ms = session.config().copy_feedback_ms;
                spawn_local(async move {
                    if let Err(e) = copy_code_block(&button, &labels.copied).await {
                        log::error!("Failed to copy code: {:?}", e);
                        return;
                    }
                    gloo_timers::future::TimeoutFuture::new(delay_ms).await;
                    button.set_text_content(Some(&labels.copy));
                });
                return;
            }

            if let Some(button) = dom::closest_target(&event, ".feedback-btn") {
                feedback_handler(session.clone(), button);
            }
        })
    }
}

fn submit_handler(session: Rc<Session>, document: Document) {
    let text = match dom::get_textarea_by_id(&document, dom::USER_INPUT) {
        Ok(input) => input.value(),
        Err(e) => {
            log::error!("Failed to read message: {:?}", e);
            return;
        }
    };

    spawn_local(async move {
        match session.submit(&text).await {
            SubmitOutcome::Completed { conversation_id } => {
                log::debug!("Exchange in {} finished", conversation_id)
            }
            SubmitOutcome::Ignored(reason) => log::debug!("Submit ignored: {}", reason),
            SubmitOutcome::Failed(err) => log::warn!("Submit failed: {}", err),
        }
    });
}

fn feedback_handler(session: Rc<Session>, button: Element) {
    let (Some(conversation_id), Some(group)) = (
        button.get_attribute("data-conversation-id"),
        button.closest(".feedback-controls").ok().flatten(),
    ) else {
        return;
    };
    if group.has_attribute("data-pending") {
        return;
    }
    let is_positive = button.get_attribute("data-positive").as_deref() == Some("true");

    // Marks which group the thank-you replaces
    let _ = group.set_attribute("data-pending", "");

    spawn_local(async move {
        if let Err(e) = session.send_feedback(&conversation_id, is_positive).await {
            log::error!("Failed to send feedback for {}: {}", conversation_id, e);
            let _ = group.remove_attribute("data-pending");
        }
    });
}

/// Copy the code next to `button` and flip the button to `copied_label`
async fn copy_code_block(button: &Element, copied_label: &str) -> Result<(), JsValue> {
    let code = button
        .closest("pre")?
        .and_then(|pre| pre.query_selector("code").ok().flatten())
        .and_then(|code| code.text_content())
        .unwrap_or_default();

    let navigator = crate::window()?.navigator();
    let clipboard = Reflect::get(&navigator, &JsValue::from_str("clipboard"))?;
    let write_text: Function = Reflect::get(&clipboard, &JsValue::from_str("writeText"))?
        .dyn_into()?;
    let promise: Promise = write_text
        .call1(&clipboard, &JsValue::from_str(&code))?
        .dyn_into()?;
    JsFuture::from(promise).await?;

    button.set_text_content(Some(copied_label));
    Ok(())
}
