use serde::{Deserialize, Serialize};

use hamekomi_core::catalog::DEFAULT_PUZZLE_SLUG;
use hamekomi_core::grid::{grid_size_valid, DEFAULT_GRID_SIZE};

const SETTINGS_KEY: &str = "hamekomi.settings.v1";
const SETTINGS_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SavedSettings {
    pub(crate) version: u32,
    pub(crate) muted: bool,
    pub(crate) preview: bool,
    pub(crate) grid_size: u32,
    pub(crate) puzzle_slug: String,
}

impl Default for SavedSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            muted: false,
            preview: false,
            grid_size: DEFAULT_GRID_SIZE,
            puzzle_slug: DEFAULT_PUZZLE_SLUG.to_string(),
        }
    }
}

pub(crate) fn load_settings() -> SavedSettings {
    let Some(storage) = web_sys::window().and_then(|window| window.local_storage().ok().flatten())
    else {
        return SavedSettings::default();
    };
    let Ok(Some(raw)) = storage.get_item(SETTINGS_KEY) else {
        return SavedSettings::default();
    };
    let Ok(settings) = serde_json::from_str::<SavedSettings>(&raw) else {
        return SavedSettings::default();
    };
    if settings.version != SETTINGS_VERSION || !grid_size_valid(settings.grid_size) {
        return SavedSettings::default();
    }
    settings
}

pub(crate) fn save_settings(settings: &SavedSettings) {
    let Some(storage) = web_sys::window().and_then(|window| window.local_storage().ok().flatten())
    else {
        return;
    };
    let Ok(raw) = serde_json::to_string(settings) else {
        return;
    };
    if storage.set_item(SETTINGS_KEY, &raw).is_err() {
        gloo::console::warn!("settings not saved (storage unavailable)");
    }
}
