//! # bivo-viewer
//!
//! Headless story viewer. Loads the story feed from the configured backend,
//! plays it with the standard timings and logs every session event until the
//! feed runs out or Ctrl+C is pressed.

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use bivo_client::{init_logging, ClientConfig, HttpStoryClient, Notifier};
use bivo_shared::constants::APP_NAME;
use bivo_shared::NotificationSettings;
use bivo_store::{Database, SettingsStore};
use bivo_stories::{SessionEvent, SessionOptions, StorySession};

fn load_settings(config: &ClientConfig) -> NotificationSettings {
    let db = match config.data_dir {
        Some(ref dir) => Database::open_in(dir),
        None => Database::new(),
    };

    let store = match db {
        Ok(db) => SettingsStore::new(db),
        Err(e) => {
            warn!(error = %e, "Settings database unavailable, using defaults");
            return NotificationSettings::default();
        }
    };

    store.load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load settings, using defaults");
        NotificationSettings::default()
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Logging and configuration
    // -----------------------------------------------------------------------
    init_logging();
    info!("Starting {} story viewer v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let notifier = Notifier::new(load_settings(&config));
    debug!(settings = ?notifier.settings(), "Notification settings");

    // -----------------------------------------------------------------------
    // 2. Open the session
    // -----------------------------------------------------------------------
    let client = Arc::new(HttpStoryClient::new(&config).context("Failed to build HTTP client")?);

    let mut handle = match StorySession::open(client.clone(), client, SessionOptions::default()).await
    {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "Could not load stories");
            return Ok(());
        }
    };

    // -----------------------------------------------------------------------
    // 3. Pump events until the session closes
    // -----------------------------------------------------------------------
    loop {
        tokio::select! {
            event = handle.next_event() => {
                match event {
                    Some(SessionEvent::Closed) | None => break,
                    Some(SessionEvent::Notice(notice)) => {
                        notifier.present(&notice);
                    }
                    Some(SessionEvent::Progress { .. }) => {}
                    Some(SessionEvent::StoryChanged { index, story_id, media_kind }) => {
                        info!(index, story = %story_id, ?media_kind, "Now showing");
                    }
                    Some(other) => debug!(event = ?other, "Session event"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, closing viewer");
                if handle.close().await.is_err() {
                    break;
                }
            }
        }
    }

    handle.join().await;
    info!("Viewer closed");
    Ok(())
}
