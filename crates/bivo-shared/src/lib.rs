//! # bivo-shared
//!
//! Types shared by every Bivochat crate: the story domain model as delivered
//! by the backend, the fixed playback constants, error types for the
//! collaborator boundary, and the notification settings model.

pub mod constants;
pub mod error;
pub mod settings;
pub mod types;

pub use error::ServiceError;
pub use settings::NotificationSettings;
pub use types::*;
