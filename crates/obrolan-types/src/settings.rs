use serde::{Deserialize, Serialize};

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Generation settings forwarded with every `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub temperature: f32,
    pub model_choice: String,
}

impl ChatSettings {
    pub fn new(temperature: f32, model_choice: impl Into<String>) -> Self {
        Self {
            temperature: clamp_temperature(temperature),
            model_choice: model_choice.into(),
        }
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        self.temperature = clamp_temperature(temperature);
    }

    /// Temperature with one decimal, as sent to the backend and shown next to the slider
    pub fn temperature_label(&self) -> String {
        format!("{:.1}", self.temperature)
    }
}

/// Clamp into `[MIN_TEMPERATURE, MAX_TEMPERATURE]`; NaN and infinities fall back to the default
pub fn clamp_temperature(value: f32) -> f32 {
    if !value.is_finite() {
        return DEFAULT_TEMPERATURE;
    }
    value.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}
