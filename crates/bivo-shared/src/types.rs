use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque story identifier, unique within a feed.
///
/// The backend emits numeric ids; they are kept as text so the engine never
/// does arithmetic on them.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct StoryId(pub String);

impl StoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StoryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        text_or_number(deserializer).map(Self)
    }
}

/// Opaque comment identifier. Same wire rules as [`StoryId`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CommentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        text_or_number(deserializer).map(Self)
    }
}

/// Accept an id as either a JSON string or an integer.
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

/// Display reference to a user (story author, liker, commenter).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub name: String,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

/// What a story shows full-screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Text,
}

/// A single ephemeral post as delivered by the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    #[serde(rename = "user")]
    pub author: UserRef,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Story {
    /// Video wins over image; a story with neither is text-only.
    pub fn media_kind(&self) -> MediaKind {
        let present = |url: &Option<String>| url.as_deref().is_some_and(|u| !u.is_empty());
        if present(&self.video_url) {
            MediaKind::Video
        } else if present(&self.image_url) {
            MediaKind::Image
        } else {
            MediaKind::Text
        }
    }
}

// ---------------------------------------------------------------------------
// Interaction summaries
// ---------------------------------------------------------------------------

/// Like counters for one story, fetched on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LikeSummary {
    pub count: u32,
    #[serde(rename = "userHasLiked", default)]
    pub viewer_has_liked: bool,
    #[serde(rename = "likes", default)]
    pub likers: Vec<UserRef>,
}

/// A comment left on a story.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    #[serde(rename = "user")]
    pub author: UserRef,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Comment counters and bodies for one story, fetched on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary {
    pub count: u32,
    #[serde(default)]
    pub comments: Vec<Comment>,
}
