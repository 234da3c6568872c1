use obrolan_types::{ConversationId, ConversationSummary, Role, TokenAllowance};

/// A message ready for the transcript; `html` is already safe to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub role: Role,
    pub html: String,
    pub image_url: Option<String>,
}

/// State transitions the session reports to whatever draws the page
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Empty the transcript; the welcome panel is shown only for a new chat
    TranscriptCleared { show_welcome: bool },
    MessageAppended(RenderedMessage),

    // Streaming reply
    StreamStarted,
    /// In-progress render, cursor glyph included
    StreamChunk { html: String },
    /// Final render; code blocks are decorated and still need highlighting
    /// and feedback controls
    StreamDone {
        html: String,
        conversation_id: ConversationId,
    },
    /// The body failed; `html` is the partial reply without cursor
    StreamAborted { html: String },

    /// Assistant-styled error message
    Error { message: String },

    // Sidebar
    ConversationsLoaded(Vec<ConversationSummary>),
    ActiveConversationChanged(Option<ConversationId>),

    // Composer
    SubmitAvailability { enabled: bool, sending: bool },
    ComposerCleared,
    AttachmentChanged { preview_url: Option<String> },
    TemperatureChanged { label: String },
    ModelChanged { model: String },

    TokensRemaining(TokenAllowance),
    FeedbackRecorded {
        conversation_id: ConversationId,
        is_positive: bool,
    },
}

/// Presentation side of a [`crate::ChatSession`]
pub trait View {
    fn apply(&mut self, event: ViewEvent);
}

/// Keeps every event it is given
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl View for RecordingView {
    fn apply(&mut self, event: ViewEvent) {
        self.events.push(event);
    }
}

impl RecordingView {
    pub fn take(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }
}
