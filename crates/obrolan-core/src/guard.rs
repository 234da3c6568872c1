use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Sending,
}

/// Why a submission did not start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    #[error("a reply is still being generated")]
    Busy,
    #[error("nothing to send")]
    Empty,
}

/// Serialises sends: at most one request/response cycle at a time
#[derive(Debug, Default)]
pub struct SubmitGuard {
    state: SubmitState,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == SubmitState::Sending
    }

    /// `idle → sending` when there is text or an image; otherwise unchanged
    pub fn try_begin(&mut self, has_text: bool, has_image: bool) -> Result<(), SubmitRejection> {
        if self.is_sending() {
            return Err(SubmitRejection::Busy);
        }
        if !has_text && !has_image {
            return Err(SubmitRejection::Empty);
        }
        self.state = SubmitState::Sending;
        Ok(())
    }

    /// `sending → idle`, on completion and on every error path
    pub fn finish(&mut self) {
        self.state = SubmitState::Idle;
    }

    /// Whether the submit control should be enabled
    pub fn can_submit(&self, has_text: bool, has_image: bool) -> bool {
        !self.is_sending() && (has_text || has_image)
    }
}
