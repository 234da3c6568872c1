//! # obrolan-core
//!
//! Browser-independent half of the obrolan chat client:
//!
//! - **StreamRenderer**: incremental UTF-8 decoding and markdown re-rendering
//!   of a streamed reply, with a cursor glyph until the stream ends
//! - **ChatSession**: the page state (current conversation, submit guard,
//!   pending image, settings) and the operations that mutate it
//! - **ChatBackend** / **View**: the seams to the HTTP endpoints and to
//!   whatever draws the page
//!
//! Nothing here touches the DOM, so all of it is tested natively.

pub mod backend;
pub mod config;
pub mod decoder;
pub mod error;
pub mod guard;
pub mod markdown;
pub mod render;
pub mod session;
pub mod view;

pub use backend::{ByteStream, ChatBackend};
pub use config::{ClientConfig, Labels};
pub use decoder::Utf8Decoder;
pub use error::{ChatError, ConfigError};
pub use guard::{SubmitGuard, SubmitRejection, SubmitState};
pub use render::{
    feedback_controls, render_stream, RenderOptions, RenderedReply, StreamRenderer,
};
pub use session::{ChatSession, PendingImage, SubmitOutcome};
pub use view::{RecordingView, RenderedMessage, View, ViewEvent};

pub use obrolan_types as types;
