//! # bivo-client
//!
//! Client-side wiring for the Bivochat story viewer: HTTP implementations of
//! the playback collaborators, environment configuration, and notice
//! presentation honouring the user's notification settings.

pub mod config;
pub mod http;
pub mod notifier;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use http::HttpStoryClient;
pub use notifier::Notifier;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("bivo_client=debug,bivo_stories=debug,bivo_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
