//! # bivo-store
//!
//! Local key-value persistence for the Bivochat client.
//!
//! Preferences that a browser build would keep in ambient global storage are
//! written through the [`KeyValueStore`] trait instead, so callers choose the
//! backend: [`Database`] (SQLite on disk) or [`MemoryStore`] for tests and
//! ephemeral sessions. [`SettingsStore`] maps notification settings onto it.

pub mod database;
pub mod kv;
pub mod migrations;
pub mod settings;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use kv::{KeyValueStore, MemoryStore};
pub use settings::SettingsStore;
