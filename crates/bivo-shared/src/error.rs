use thiserror::Error;

/// Failures reported by the story feed provider or interaction submitter.
///
/// None of these are fatal to a playback session: the viewer sees a notice
/// and the playback state is left as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not signed in")]
    Unauthorized,

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Short, user-facing text for a toast.
    pub fn notice(&self) -> &'static str {
        match self {
            ServiceError::Transport(_) => "Network error, please try again",
            ServiceError::Unauthorized => "Please sign in again",
            ServiceError::Status { .. } | ServiceError::Decode(_) => "Something went wrong",
        }
    }
}
