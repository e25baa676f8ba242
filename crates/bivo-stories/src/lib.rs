//! # bivo-stories
//!
//! Story playback for the Bivochat viewer.
//!
//! [`PlaybackEngine`] is a synchronous state machine that owns the current
//! story index, progress, play/pause state, gesture interpretation and the
//! flying-heart layer. [`StorySession`] wraps it in a tokio task that drives
//! the recurring progress timer, talks to the feed provider and interaction
//! submitter, and discards completions that no longer apply.

pub mod engine;
pub mod gesture;
pub mod hearts;
pub mod ports;
pub mod session;

mod error;

pub use engine::{InteractionTicket, Navigation, PlaybackEngine, PlaybackSnapshot, TapReaction, Viewport};
pub use error::PlaybackError;
pub use gesture::{GestureOutcome, GestureState, GestureTracker};
pub use hearts::{FlyingHeart, HeartLayer};
pub use ports::{InteractionSubmitter, StoryFeedProvider};
pub use session::{Notice, NoticeLevel, SessionEvent, SessionHandle, SessionOptions, StorySession, ViewerInput};
