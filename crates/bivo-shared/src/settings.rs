//! Notification preferences.
//!
//! Settings are an explicit value passed to whoever needs them. Persistence
//! goes through a key-value store (see `bivo-store`), one entry per
//! recognised key, each value JSON-encoded.

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const KEY_ENABLE_SOUND: &str = "enableSound";
pub const KEY_SOUND_VOLUME: &str = "soundVolume";
pub const KEY_ENABLE_VIBRATION: &str = "enableVibration";
pub const KEY_ENABLE_DESKTOP: &str = "enableDesktopNotifications";

/// Every key [`NotificationSettings`] reads or writes.
pub const RECOGNISED_KEYS: [&str; 4] = [
    KEY_ENABLE_SOUND,
    KEY_SOUND_VOLUME,
    KEY_ENABLE_VIBRATION,
    KEY_ENABLE_DESKTOP,
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub enable_sound: bool,
    /// Volume in `[0.0, 1.0]`.
    pub sound_volume: f32,
    pub enable_vibration: bool,
    pub enable_desktop_notifications: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enable_sound: true,
            sound_volume: 0.5,
            enable_vibration: true,
            enable_desktop_notifications: false,
        }
    }
}

impl NotificationSettings {
    /// Encode as `(key, json value)` pairs.
    pub fn to_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_ENABLE_SOUND, self.enable_sound.to_string()),
            (KEY_SOUND_VOLUME, self.sound_volume.to_string()),
            (KEY_ENABLE_VIBRATION, self.enable_vibration.to_string()),
            (KEY_ENABLE_DESKTOP, self.enable_desktop_notifications.to_string()),
        ]
    }

    /// Build settings from stored entries.
    ///
    /// Missing keys keep their default, unknown keys are ignored, and values
    /// that fail to parse are logged and replaced by the default.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut settings = Self::default();

        for (key, raw) in entries {
            match key {
                KEY_ENABLE_SOUND => {
                    if let Some(v) = parse_value::<bool>(key, raw) {
                        settings.enable_sound = v;
                    }
                }
                KEY_SOUND_VOLUME => {
                    if let Some(v) = parse_value::<f32>(key, raw) {
                        if (0.0..=1.0).contains(&v) {
                            settings.sound_volume = v;
                        } else {
                            warn!(key, value = v, "Sound volume out of range, using default");
                        }
                    }
                }
                KEY_ENABLE_VIBRATION => {
                    if let Some(v) = parse_value::<bool>(key, raw) {
                        settings.enable_vibration = v;
                    }
                }
                KEY_ENABLE_DESKTOP => {
                    if let Some(v) = parse_value::<bool>(key, raw) {
                        settings.enable_desktop_notifications = v;
                    }
                }
                _ => {}
            }
        }

        settings
    }

    /// Volume to play a notice at, or `None` when sound is off.
    pub fn effective_volume(&self) -> Option<f32> {
        (self.enable_sound && self.sound_volume > 0.0).then_some(self.sound_volume)
    }
}

fn parse_value<T: serde::de::DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, value = raw, error = %e, "Invalid setting value, using default");
            None
        }
    }
}
