//! Flying-heart animation tokens.
//!
//! Hearts are cosmetic. The session removes each one on its own timer,
//! [`HEART_LIFETIME_MS`](bivo_shared::constants::HEART_LIFETIME_MS) after
//! it was spawned, never by a renderer callback.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlyingHeart {
    /// Creation timestamp in ms, bumped when two hearts share a millisecond.
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default)]
pub struct HeartLayer {
    hearts: Vec<FlyingHeart>,
}

impl HeartLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, now: u64, x: f32, y: f32) -> FlyingHeart {
        let mut id = now;
        while self.hearts.iter().any(|h| h.id == id) {
            id += 1;
        }

        let heart = FlyingHeart { id, x, y };
        self.hearts.push(heart);
        heart
    }

    /// Remove one heart. Returns `false` if it was already gone.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.hearts.len();
        self.hearts.retain(|h| h.id != id);
        self.hearts.len() != before
    }

    pub fn hearts(&self) -> &[FlyingHeart] {
        &self.hearts
    }

    pub fn len(&self) -> usize {
        self.hearts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hearts.is_empty()
    }
}
