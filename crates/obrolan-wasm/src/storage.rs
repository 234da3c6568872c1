//! Page configuration and persisted settings

use obrolan_core::types::ChatSettings;
use obrolan_core::ClientConfig;
use web_sys::{Document, Storage};

/// `<script type="application/json" id="obrolan-config">` holding a [`ClientConfig`]
pub const CONFIG_ELEMENT_ID: &str = "obrolan-config";
pub const SETTINGS_KEY: &str = "obrolan.settings";

/// Read the embedded config, falling back to defaults when absent or malformed
pub fn load_config(document: &Document) -> ClientConfig {
    let Some(json) = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content())
    else {
        return ClientConfig::default();
    };

    match ClientConfig::from_json(&json) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Ignoring page config: {}", err);
            ClientConfig::default()
        }
    }
}

pub fn load_settings() -> Option<ChatSettings> {
    let json = local_storage()?.get_item(SETTINGS_KEY).ok()??;
    parse_settings(&json)
}

pub fn save_settings(settings: &ChatSettings) {
    let Some(storage) = local_storage() else {
        return;
    };
    let json = match serde_json::to_string(settings) {
        Ok(json) => json,
        Err(err) => {
            log::warn!("Failed to encode settings: {}", err);
            return;
        }
    };
    if let Err(err) = storage.set_item(SETTINGS_KEY, &json) {
        log::warn!("Failed to save settings: {:?}", err);
    }
}

/// Stored settings from an older page version are dropped rather than trusted
fn parse_settings(json: &str) -> Option<ChatSettings> {
    match serde_json::from_str::<ChatSettings>(json) {
        Ok(settings) => Some(ChatSettings::new(settings.temperature, settings.model_choice)),
        Err(err) => {
            log::debug!("Discarding stored settings: {}", err);
            None
        }
    }
}

fn local_storage() -> Option<Storage> {
    web_sys::window()?.local_storage().ok()?
}
