//! Notification settings persisted through a [`KeyValueStore`].

use tracing::{debug, info};

use bivo_shared::settings::RECOGNISED_KEYS;
use bivo_shared::NotificationSettings;

use crate::error::Result;
use crate::kv::KeyValueStore;

/// Reads and writes [`NotificationSettings`] as one entry per key.
pub struct SettingsStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SettingsStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load settings; absent or invalid entries take their defaults.
    pub fn load(&self) -> Result<NotificationSettings> {
        let mut stored = Vec::with_capacity(RECOGNISED_KEYS.len());
        for key in RECOGNISED_KEYS {
            if let Some(value) = self.store.get(key)? {
                stored.push((key, value));
            }
        }

        debug!(stored = stored.len(), "Loaded notification settings");
        Ok(NotificationSettings::from_entries(
            stored.iter().map(|(k, v)| (*k, v.as_str())),
        ))
    }

    pub fn save(&mut self, settings: &NotificationSettings) -> Result<()> {
        for (key, value) in settings.to_entries() {
            self.store.set(key, &value)?;
        }
        info!("Notification settings updated");
        Ok(())
    }

    /// Load, modify and save in one step.
    pub fn update<F>(&mut self, f: F) -> Result<NotificationSettings>
    where
        F: FnOnce(&mut NotificationSettings),
    {
        let mut settings = self.load()?;
        f(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }

    /// Forget every stored preference.
    pub fn reset(&mut self) -> Result<()> {
        for key in RECOGNISED_KEYS {
            self.store.remove(key)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}
