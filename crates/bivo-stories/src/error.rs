use thiserror::Error;

/// Errors produced by the playback layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// A session cannot play an empty feed; callers treat this as an
    /// immediate close.
    #[error("Story feed is empty")]
    EmptyFeed,

    /// The session task has ended and no longer accepts input.
    #[error("Playback session is closed")]
    SessionClosed,
}
