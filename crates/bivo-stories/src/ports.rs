//! Collaborator traits at the edge of the playback engine.
//!
//! The engine never performs I/O itself. A session is handed one feed
//! provider and one interaction submitter; `bivo-client` implements both
//! over HTTP and tests use in-memory fakes.

use async_trait::async_trait;

use bivo_shared::{CommentSummary, LikeSummary, ServiceError, Story, StoryId};

/// Source of the ordered story feed and per-story counters.
#[async_trait]
pub trait StoryFeedProvider: Send + Sync {
    async fn fetch_feed(&self) -> Result<Vec<Story>, ServiceError>;

    async fn fetch_likes(&self, story_id: &StoryId) -> Result<LikeSummary, ServiceError>;

    async fn fetch_comments(&self, story_id: &StoryId) -> Result<CommentSummary, ServiceError>;
}

/// Persists viewer reactions.
#[async_trait]
pub trait InteractionSubmitter: Send + Sync {
    async fn submit_like(&self, story_id: &StoryId) -> Result<(), ServiceError>;

    async fn submit_comment(&self, story_id: &StoryId, text: &str) -> Result<(), ServiceError>;
}
