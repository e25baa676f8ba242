//! Vertical touch gesture interpretation.
//!
//! A touch is either not happening, pressed but not yet a drag, or an active
//! drag with a visual follow offset. Releasing the touch resolves it into a
//! [`GestureOutcome`] and returns the tracker to [`GestureState::Idle`].

use bivo_shared::constants::{
    DRAG_START_DELAY_MS, DRAG_START_DISTANCE_PX, SWIPE_DISTANCE_PX, SWIPE_VELOCITY_PX_PER_MS,
};

/// Where and when a touch began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureOrigin {
    pub y: f32,
    /// Milliseconds, on whatever clock the caller uses for the whole gesture.
    pub t: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Pressed { origin: GestureOrigin },
    /// `offset` is the signed vertical displacement; positive is downward.
    Dragging { origin: GestureOrigin, offset: f32 },
}

/// How a released touch should affect playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Committed downward swipe: go to the previous story.
    SwipeDown,
    /// Committed upward swipe: go to the next story.
    SwipeUp,
    /// No qualifying swipe.
    Release,
}

#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    state: GestureState,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Record the touch origin. A new touch replaces any unfinished one.
    pub fn begin(&mut self, y: f32, t: u64) {
        self.state = GestureState::Pressed {
            origin: GestureOrigin { y, t },
        };
    }

    /// Feed a move sample. Returns the drag offset once the touch is a drag.
    pub fn update(&mut self, y: f32, t: u64) -> Option<f32> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Pressed { origin } => {
                let delta = y - origin.y;
                let held_for = t.saturating_sub(origin.t);
                if delta.abs() > DRAG_START_DISTANCE_PX && held_for >= DRAG_START_DELAY_MS {
                    self.state = GestureState::Dragging {
                        origin,
                        offset: delta,
                    };
                    Some(delta)
                } else {
                    None
                }
            }
            GestureState::Dragging { origin, .. } => {
                let offset = y - origin.y;
                self.state = GestureState::Dragging { origin, offset };
                Some(offset)
            }
        }
    }

    /// Resolve the touch. State is cleared whatever the outcome.
    pub fn finish(&mut self, y: f32, t: u64) -> GestureOutcome {
        let origin = match std::mem::take(&mut self.state) {
            GestureState::Idle => return GestureOutcome::Release,
            GestureState::Pressed { origin } | GestureState::Dragging { origin, .. } => origin,
        };

        let delta = y - origin.y;
        // Same-millisecond releases are measured over 1 ms.
        let elapsed = t.saturating_sub(origin.t).max(1) as f32;
        let velocity = delta.abs() / elapsed;

        if delta.abs() > SWIPE_DISTANCE_PX || velocity > SWIPE_VELOCITY_PX_PER_MS {
            if delta > 0.0 {
                GestureOutcome::SwipeDown
            } else {
                GestureOutcome::SwipeUp
            }
        } else {
            GestureOutcome::Release
        }
    }

    pub fn drag_offset(&self) -> Option<f32> {
        match self.state {
            GestureState::Dragging { offset, .. } => Some(offset),
            _ => None,
        }
    }
}
