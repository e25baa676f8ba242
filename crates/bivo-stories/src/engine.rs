//! The story playback state machine.
//!
//! [`PlaybackEngine`] is synchronous and clock-free: every operation that
//! depends on time takes the timestamp as an argument. The session layer
//! supplies real timers; tests drive it directly.
//!
//! # Invariants
//!
//! - `current_index` is always a valid index into the feed. Advancing past
//!   the last story closes the session, retreating before the first one does
//!   nothing. Each call moves the index by at most one.
//! - Every index change resets progress to zero and bumps the epoch in the
//!   same call, so the next tick always belongs to the new story.
//! - Like and comment counters are never mutated locally; they are replaced
//!   by fetched summaries, and only when the response carries a ticket for
//!   the current epoch.

use serde::Serialize;
use tracing::debug;

use bivo_shared::constants::{
    DOUBLE_TAP_WINDOW_MS, LIKE_BUTTON_HEART_X, LIKE_BUTTON_HEART_Y, STORY_DURATION_MS,
};
use bivo_shared::{CommentSummary, LikeSummary, Story, StoryId};

use crate::error::PlaybackError;
use crate::gesture::{GestureOutcome, GestureTracker};
use crate::hearts::{FlyingHeart, HeartLayer};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Size of the viewing surface in px, used to place the like-button heart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 390.0,
            height: 844.0,
        }
    }
}

/// Identifies the story and index generation an async request was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InteractionTicket {
    pub story_id: StoryId,
    pub epoch: u64,
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved { from: usize, to: usize },
    Closed,
}

/// What a double-tap produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TapReaction {
    pub heart: FlyingHeart,
    /// Present when a like should be submitted.
    pub like: Option<InteractionTicket>,
}

/// Read-only view of the playback state for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub current_index: usize,
    pub story_count: usize,
    pub story_id: StoryId,
    pub progress_percent: f64,
    pub is_playing: bool,
    pub drag_offset: Option<f32>,
    pub hearts: Vec<FlyingHeart>,
    pub comments_open: bool,
    pub comment_draft: String,
    pub likes: Option<LikeSummary>,
    pub comments: Option<CommentSummary>,
    pub closed: bool,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    feed: Vec<Story>,
    current_index: usize,
    progress_percent: f64,
    is_playing: bool,
    gesture: GestureTracker,
    last_tap: Option<u64>,
    hearts: HeartLayer,
    likes: Option<LikeSummary>,
    comments: Option<CommentSummary>,
    comments_open: bool,
    comment_draft: String,
    epoch: u64,
    closed: bool,
    viewport: Viewport,
}

impl PlaybackEngine {
    /// Begin playback at the first story.
    pub fn start(feed: Vec<Story>) -> Result<Self, PlaybackError> {
        if feed.is_empty() {
            return Err(PlaybackError::EmptyFeed);
        }

        debug!(stories = feed.len(), "Starting story playback");

        Ok(Self {
            feed,
            current_index: 0,
            progress_percent: 0.0,
            is_playing: true,
            gesture: GestureTracker::new(),
            last_tap: None,
            hearts: HeartLayer::new(),
            likes: None,
            comments: None,
            comments_open: false,
            comment_draft: String::new(),
            epoch: 0,
            closed: false,
            viewport: Viewport::default(),
        })
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    // -- Timer ---------------------------------------------------------------

    /// Account for `elapsed_ms` of playback. Does nothing while paused.
    pub fn tick(&mut self, elapsed_ms: u64) -> Option<Navigation> {
        if self.closed || !self.is_playing {
            return None;
        }

        self.progress_percent += 100.0 * elapsed_ms as f64 / STORY_DURATION_MS as f64;
        if self.progress_percent >= 100.0 {
            self.progress_percent = 0.0;
            return Some(self.advance());
        }
        None
    }

    // -- Navigation ----------------------------------------------------------

    /// Move to the next story, or close after the last one.
    pub fn advance(&mut self) -> Navigation {
        if self.closed {
            return Navigation::Closed;
        }

        if self.current_index + 1 >= self.feed.len() {
            debug!(index = self.current_index, "Reached end of feed");
            self.close();
            return Navigation::Closed;
        }

        let from = self.current_index;
        self.move_to(from + 1);
        Navigation::Moved {
            from,
            to: self.current_index,
        }
    }

    /// Move to the previous story. `None` at the first story.
    pub fn retreat(&mut self) -> Option<Navigation> {
        if self.closed || self.current_index == 0 {
            return None;
        }

        let from = self.current_index;
        self.move_to(from - 1);
        Some(Navigation::Moved {
            from,
            to: self.current_index,
        })
    }

    fn move_to(&mut self, index: usize) {
        self.current_index = index;
        self.progress_percent = 0.0;
        self.is_playing = true;
        self.epoch += 1;
        self.last_tap = None;
        self.likes = None;
        self.comments = None;
        debug!(index, epoch = self.epoch, "Story changed");
    }

    /// End the session. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
        self.is_playing = false;
        self.gesture = GestureTracker::new();
    }

    // -- Play state ----------------------------------------------------------

    pub fn toggle_play(&mut self) -> bool {
        if !self.closed {
            self.is_playing = !self.is_playing;
        }
        self.is_playing
    }

    // -- Gestures ------------------------------------------------------------

    /// A touch began; playback pauses for its duration.
    pub fn gesture_start(&mut self, y: f32, t: u64) {
        if self.closed {
            return;
        }
        self.gesture.begin(y, t);
        self.is_playing = false;
    }

    /// Returns the visual drag offset once the touch has become a drag.
    pub fn gesture_move(&mut self, y: f32, t: u64) -> Option<f32> {
        if self.closed {
            return None;
        }
        self.gesture.update(y, t)
    }

    /// Resolve the touch into navigation, or resume playback.
    pub fn gesture_end(&mut self, y: f32, t: u64) -> Option<Navigation> {
        if self.closed {
            return None;
        }

        let navigation = match self.gesture.finish(y, t) {
            GestureOutcome::SwipeDown => self.retreat(),
            GestureOutcome::SwipeUp => Some(self.advance()),
            GestureOutcome::Release => None,
        };

        // A release, or a swipe down on the first story, hands control back
        // to autoplay.
        if navigation.is_none() {
            self.is_playing = true;
        }
        navigation
    }

    // -- Reactions -----------------------------------------------------------

    /// Register a tap on the story surface at `now`.
    ///
    /// The second of two taps less than [`DOUBLE_TAP_WINDOW_MS`] apart is a
    /// double-tap: it spawns a heart at the tap position and asks for a like
    /// unless the viewer already liked the story. The tap that completes a
    /// pair consumes it, so a third quick tap starts a fresh pair.
    pub fn tap(&mut self, x: f32, y: f32, now: u64) -> Option<TapReaction> {
        if self.closed {
            return None;
        }

        let is_double = self
            .last_tap
            .and_then(|last| now.checked_sub(last))
            .is_some_and(|interval| interval > 0 && interval < DOUBLE_TAP_WINDOW_MS);

        self.last_tap = if is_double { None } else { Some(now) };

        if !is_double {
            return None;
        }

        let heart = self.hearts.spawn(now, x, y);
        let like = (!self.viewer_has_liked()).then(|| self.ticket());
        Some(TapReaction { heart, like })
    }

    /// Like-button press: always yields a ticket for a new submission.
    pub fn like_current(&self) -> Option<InteractionTicket> {
        (!self.closed).then(|| self.ticket())
    }

    /// A like-button submission succeeded; spawn its heart if still current.
    pub fn like_confirmed(&mut self, ticket: &InteractionTicket, now: u64) -> Option<FlyingHeart> {
        if !self.is_current(ticket) {
            return None;
        }
        let x = self.viewport.width * LIKE_BUTTON_HEART_X;
        let y = self.viewport.height * LIKE_BUTTON_HEART_Y;
        Some(self.hearts.spawn(now, x, y))
    }

    pub fn set_comment_draft(&mut self, text: impl Into<String>) {
        self.comment_draft = text.into();
    }

    /// Take the draft for submission. `None` when it is blank.
    pub fn submit_comment(&self) -> Option<(InteractionTicket, String)> {
        let text = self.comment_draft.trim();
        if self.closed || text.is_empty() {
            return None;
        }
        Some((self.ticket(), text.to_string()))
    }

    /// `text` was posted. The draft is shared by every story, so it is
    /// cleared wherever the viewer is now, unless it was edited meanwhile.
    pub fn comment_confirmed(&mut self, text: &str) -> bool {
        if self.comment_draft.trim() != text {
            return false;
        }
        self.comment_draft.clear();
        true
    }

    pub fn open_comments(&mut self) {
        self.comments_open = true;
    }

    pub fn close_comments(&mut self) {
        self.comments_open = false;
    }

    // -- Fetched data --------------------------------------------------------

    /// Install a fetched like summary. Stale tickets are ignored.
    pub fn apply_likes(&mut self, ticket: &InteractionTicket, likes: LikeSummary) -> bool {
        if !self.is_current(ticket) {
            debug!(story = %ticket.story_id, epoch = ticket.epoch, "Discarding stale likes");
            return false;
        }
        self.likes = Some(likes);
        true
    }

    /// Install a fetched comment summary. Stale tickets are ignored.
    pub fn apply_comments(&mut self, ticket: &InteractionTicket, comments: CommentSummary) -> bool {
        if !self.is_current(ticket) {
            debug!(story = %ticket.story_id, epoch = ticket.epoch, "Discarding stale comments");
            return false;
        }
        self.comments = Some(comments);
        true
    }

    // -- Hearts --------------------------------------------------------------

    pub fn remove_heart(&mut self, id: u64) -> bool {
        self.hearts.remove(id)
    }

    // -- Accessors -----------------------------------------------------------

    /// Ticket for a request about the current story.
    pub fn ticket(&self) -> InteractionTicket {
        InteractionTicket {
            story_id: self.current_story().id.clone(),
            epoch: self.epoch,
        }
    }

    /// Whether a response for `ticket` may still touch the playback state.
    pub fn is_current(&self, ticket: &InteractionTicket) -> bool {
        !self.closed && ticket.epoch == self.epoch && ticket.story_id == self.current_story().id
    }

    pub fn current_story(&self) -> &Story {
        &self.feed[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn story_count(&self) -> usize {
        self.feed.len()
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn drag_offset(&self) -> Option<f32> {
        self.gesture.drag_offset()
    }

    pub fn hearts(&self) -> &[FlyingHeart] {
        self.hearts.hearts()
    }

    pub fn likes(&self) -> Option<&LikeSummary> {
        self.likes.as_ref()
    }

    pub fn comments(&self) -> Option<&CommentSummary> {
        self.comments.as_ref()
    }

    pub fn comments_open(&self) -> bool {
        self.comments_open
    }

    pub fn comment_draft(&self) -> &str {
        &self.comment_draft
    }

    /// Display flag from the last fetched like summary.
    pub fn viewer_has_liked(&self) -> bool {
        self.likes.as_ref().is_some_and(|l| l.viewer_has_liked)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            current_index: self.current_index,
            story_count: self.feed.len(),
            story_id: self.current_story().id.clone(),
            progress_percent: self.progress_percent,
            is_playing: self.is_playing,
            drag_offset: self.drag_offset(),
            hearts: self.hearts.hearts().to_vec(),
            comments_open: self.comments_open,
            comment_draft: self.comment_draft.clone(),
            likes: self.likes.clone(),
            comments: self.comments.clone(),
            closed: self.closed,
        }
    }
}
