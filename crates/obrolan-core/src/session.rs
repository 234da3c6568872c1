//! The page's session object
//!
//! Holds what used to be page-level globals (current conversation, the
//! generating flag, the pending attachment) and turns user actions into
//! backend calls and [`ViewEvent`]s. State lives in a `RefCell` that is never
//! held across an `.await`, so handlers can fire while a reply streams.

use std::cell::{Ref, RefCell};

use obrolan_types::{
    ChatRequest, ChatSettings, ConversationId, ConversationSummary, FeedbackRequest, Role,
    TokenAllowance,
};

use crate::backend::ChatBackend;
use crate::config::ClientConfig;
use crate::error::ChatError;
use crate::guard::{SubmitGuard, SubmitRejection};
use crate::render::{render_model_message, render_stream, render_user_message, RenderOptions};
use crate::view::{View, ViewEvent};

/// An image chosen in the composer but not sent yet
#[derive(Debug, Clone)]
pub struct PendingImage<I> {
    pub name: String,
    pub preview_url: Option<String>,
    pub handle: I,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored(SubmitRejection),
    Completed { conversation_id: ConversationId },
    Failed(ChatError),
}

struct ClientState<I> {
    conversation_id: Option<ConversationId>,
    guard: SubmitGuard,
    pending_image: Option<PendingImage<I>>,
    draft_has_text: bool,
    settings: ChatSettings,
    conversations: Vec<ConversationSummary>,
    /// The current conversation was created here and the sidebar has not
    /// shown it yet
    unlisted: bool,
    /// Bumped whenever the transcript changes hands; a history load only
    /// renders if it is still current when it resolves
    transcript_generation: u64,
}

pub struct ChatSession<B: ChatBackend, V: View> {
    backend: B,
    view: RefCell<V>,
    state: RefCell<ClientState<B::Image>>,
    config: ClientConfig,
    render_options: RenderOptions,
}

impl<B: ChatBackend, V: View> ChatSession<B, V> {
    pub fn new(backend: B, view: V, config: ClientConfig) -> Self {
        let state = ClientState {
            conversation_id: None,
            guard: SubmitGuard::new(),
            pending_image: None,
            draft_has_text: false,
            settings: config.default_settings(),
            conversations: Vec::new(),
            unlisted: false,
            transcript_generation: 0,
        };

        Self {
            backend,
            view: RefCell::new(view),
            state: RefCell::new(state),
            render_options: RenderOptions::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn view(&self) -> Ref<'_, V> {
        self.view.borrow()
    }

    pub fn current_conversation_id(&self) -> Option<ConversationId> {
        self.state.borrow().conversation_id.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.state.borrow().guard.is_sending()
    }

    pub fn settings(&self) -> ChatSettings {
        self.state.borrow().settings.clone()
    }

    pub fn has_pending_image(&self) -> bool {
        self.state.borrow().pending_image.is_some()
    }

    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.state.borrow().conversations.clone()
    }

    fn emit(&self, event: ViewEvent) {
        self.view.borrow_mut().apply(event);
    }

    fn emit_submit_availability(&self) {
        let (enabled, sending) = {
            let state = self.state.borrow();
            (
                state
                    .guard
                    .can_submit(state.draft_has_text, state.pending_image.is_some()),
                state.guard.is_sending(),
            )
        };
        self.emit(ViewEvent::SubmitAvailability { enabled, sending });
    }

    // ========================================================================
    // Startup
    // ========================================================================

    /// Push the initial settings to the view, then load the sidebar and the
    /// token allowance
    pub async fn start(&self) {
        let settings = self.settings();
        self.emit(ViewEvent::TemperatureChanged {
            label: settings.temperature_label(),
        });
        self.emit(ViewEvent::ModelChanged {
            model: settings.model_choice,
        });
        self.emit_submit_availability();

        if let Err(err) = self.load_conversations().await {
            log::error!("Failed to load conversations: {}", err);
        }
        if let Err(err) = self.refresh_tokens().await {
            log::warn!("Failed to load token allowance: {}", err);
        }
    }

    // ========================================================================
    // Composer
    // ========================================================================

    pub fn composer_changed(&self, text: &str) {
        self.state.borrow_mut().draft_has_text = !text.trim().is_empty();
        self.emit_submit_availability();
    }

    pub fn attach_image(&self, image: PendingImage<B::Image>) {
        log::debug!("Attached image {}", image.name);
        let preview_url = image.preview_url.clone();
        self.state.borrow_mut().pending_image = Some(image);
        self.emit(ViewEvent::AttachmentChanged { preview_url });
        self.emit_submit_availability();
    }

    pub fn remove_image(&self) {
        self.state.borrow_mut().pending_image = None;
        self.emit(ViewEvent::AttachmentChanged { preview_url: None });
        self.emit_submit_availability();
    }

    pub fn set_temperature(&self, temperature: f32) -> ChatSettings {
        let settings = {
            let mut state = self.state.borrow_mut();
            state.settings.set_temperature(temperature);
            state.settings.clone()
        };
        self.emit(ViewEvent::TemperatureChanged {
            label: settings.temperature_label(),
        });
        settings
    }

    pub fn set_model_choice(&self, model: &str) -> ChatSettings {
        let settings = {
            let mut state = self.state.borrow_mut();
            state.settings.model_choice = model.to_string();
            state.settings.clone()
        };
        self.emit(ViewEvent::ModelChanged {
            model: settings.model_choice.clone(),
        });
        settings
    }

    // ========================================================================
    // Sidebar and history
    // ========================================================================

    pub async fn load_conversations(&self) -> Result<(), ChatError> {
        let conversations = self.backend.list_conversations().await?;
        log::debug!("Loaded {} conversations", conversations.len());

        self.state.borrow_mut().conversations = conversations.clone();
        self.emit(ViewEvent::ConversationsLoaded(conversations));
        self.emit(ViewEvent::ActiveConversationChanged(
            self.current_conversation_id(),
        ));
        Ok(())
    }

    /// Show the stored history of a conversation; ignored while a reply streams
    pub async fn open_conversation(&self, conversation_id: &str) -> Result<(), ChatError> {
        if self.is_sending() {
            log::debug!("Ignoring switch to {} while sending", conversation_id);
            return Ok(());
        }

        let generation = {
            let mut state = self.state.borrow_mut();
            state.conversation_id = Some(conversation_id.to_string());
            state.unlisted = false;
            state.transcript_generation += 1;
            state.transcript_generation
        };
        self.emit(ViewEvent::TranscriptCleared { show_welcome: false });
        self.emit(ViewEvent::ActiveConversationChanged(Some(
            conversation_id.to_string(),
        )));

        let history = self.backend.history(conversation_id).await;

        // Another open, a new chat or a send took over the transcript meanwhile
        if self.state.borrow().transcript_generation != generation {
            log::debug!("Dropping stale history of {}", conversation_id);
            return Ok(());
        }

        let history = match history {
            Ok(history) => history,
            Err(err) => {
                log::error!("Failed to load history of {}: {}", conversation_id, err);
                self.emit(ViewEvent::Error {
                    message: self.config.labels.history_failed.clone(),
                });
                return Err(err);
            }
        };

        let copy_label = &self.config.labels.copy;
        for entry in &history {
            let message = match entry.role {
                Role::User => render_user_message(entry.text(), None),
                Role::Model => render_model_message(entry.text(), copy_label),
            };
            self.emit(ViewEvent::MessageAppended(message));
        }
        Ok(())
    }

    /// Forget the current conversation; ignored while a reply streams
    pub async fn start_new_chat(&self) {
        if self.is_sending() {
            log::debug!("Ignoring new chat while sending");
            return;
        }

        {
            let mut state = self.state.borrow_mut();
            state.conversation_id = None;
            state.unlisted = false;
            state.draft_has_text = false;
            state.pending_image = None;
            state.transcript_generation += 1;
        }
        self.emit(ViewEvent::TranscriptCleared { show_welcome: true });
        self.emit(ViewEvent::ComposerCleared);
        self.emit(ViewEvent::AttachmentChanged { preview_url: None });
        self.emit(ViewEvent::ActiveConversationChanged(None));
        self.emit_submit_availability();

        if let Err(err) = self.load_conversations().await {
            log::error!("Failed to load conversations: {}", err);
        }
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Send the composer contents and stream the reply into the transcript
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let message = text.trim().to_string();
        let begin = {
            let mut state = self.state.borrow_mut();
            let has_image = state.pending_image.is_some();
            let begin = state.guard.try_begin(!message.is_empty(), has_image);
            if begin.is_ok() {
                state.transcript_generation += 1;
            }
            begin
        };
        if let Err(reason) = begin {
            log::debug!("Submission ignored: {}", reason);
            return SubmitOutcome::Ignored(reason);
        }
        self.emit_submit_availability();

        let outcome = self.exchange(message).await;

        self.state.borrow_mut().guard.finish();
        self.emit_submit_availability();
        outcome
    }

    async fn exchange(&self, message: String) -> SubmitOutcome {
        let conversation_id = match self.ensure_conversation().await {
            Ok(id) => id,
            Err(err) => return self.fail(err),
        };

        let (image, settings) = {
            let mut state = self.state.borrow_mut();
            state.draft_has_text = false;
            (state.pending_image.take(), state.settings.clone())
        };

        let preview_url = image.as_ref().and_then(|image| image.preview_url.clone());
        self.emit(ViewEvent::MessageAppended(render_user_message(
            &message,
            preview_url,
        )));
        self.emit(ViewEvent::ComposerCleared);
        self.emit(ViewEvent::AttachmentChanged { preview_url: None });

        let request = ChatRequest {
            conversation_id: conversation_id.clone(),
            message: if message.is_empty() { None } else { Some(message) },
            image: image.map(|image| image.handle),
            settings,
        };

        let body = match self.backend.send_chat(request).await {
            Ok(body) => body,
            Err(err) => return self.fail(err),
        };

        let reply = match render_stream(body, &self.render_options, &conversation_id, |event| {
            self.emit(event)
        })
        .await
        {
            Ok(reply) => reply,
            Err(err) => return self.fail(err),
        };
        log::info!(
            "Reply for {} complete ({} bytes)",
            conversation_id,
            reply.text.len()
        );

        // A new conversation gets its title from the first message
        let unlisted = std::mem::take(&mut self.state.borrow_mut().unlisted);
        if unlisted {
            if let Err(err) = self.load_conversations().await {
                log::error!("Failed to reload conversations: {}", err);
            }
        }
        if let Err(err) = self.refresh_tokens().await {
            log::warn!("Failed to refresh token allowance: {}", err);
        }

        SubmitOutcome::Completed { conversation_id }
    }

    async fn ensure_conversation(&self) -> Result<ConversationId, ChatError> {
        if let Some(id) = self.current_conversation_id() {
            return Ok(id);
        }
        let id = self.backend.new_chat().await?;
        log::info!("Started conversation {}", id);
        let mut state = self.state.borrow_mut();
        state.conversation_id = Some(id.clone());
        state.unlisted = true;
        Ok(id)
    }

    fn fail(&self, err: ChatError) -> SubmitOutcome {
        log::error!("Send failed: {}", err);
        self.emit(ViewEvent::Error {
            message: err.user_message(&self.config.labels),
        });
        SubmitOutcome::Failed(err)
    }

    // ========================================================================
    // Feedback and tokens
    // ========================================================================

    pub async fn send_feedback(
        &self,
        conversation_id: &str,
        is_positive: bool,
    ) -> Result<(), ChatError> {
        let feedback = FeedbackRequest {
            conversation_id: conversation_id.to_string(),
            is_positive,
        };
        self.backend.send_feedback(&feedback).await?;
        self.emit(ViewEvent::FeedbackRecorded {
            conversation_id: feedback.conversation_id,
            is_positive,
        });
        Ok(())
    }

    pub async fn refresh_tokens(&self) -> Result<TokenAllowance, ChatError> {
        let allowance = self.backend.tokens_remaining().await?;
        self.emit(ViewEvent::TokensRemaining(allowance.clone()));
        Ok(allowance)
    }
}
