//! REST implementation of the story collaborators.
//!
//! | call            | request                                  |
//! |-----------------|------------------------------------------|
//! | feed            | `GET  /api/stories`                      |
//! | likes           | `GET  /api/stories/{id}/likes`           |
//! | comments        | `GET  /api/stories/{id}/comments`        |
//! | like            | `POST /api/stories/{id}/like`            |
//! | comment         | `POST /api/stories/{id}/comments`        |
//!
//! Every request carries the bearer token from [`ClientConfig`] when one is
//! configured.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use bivo_shared::{CommentSummary, LikeSummary, ServiceError, Story, StoryId};
use bivo_stories::{InteractionSubmitter, StoryFeedProvider};

use crate::config::ClientConfig;

#[derive(Serialize)]
struct NewComment<'a> {
    content: &'a str,
}

/// HTTP client for the story endpoints.
#[derive(Clone)]
pub struct HttpStoryClient {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpStoryClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match self.auth_token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        debug!(path, "GET");
        let resp = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(resp)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn post(&self, builder: RequestBuilder, path: &str) -> Result<(), ServiceError> {
        debug!(path, "POST");
        let resp = builder.send().await.map_err(transport_error)?;
        check_status(resp).await?;
        Ok(())
    }
}

fn story_path(story_id: &StoryId, leaf: &str) -> String {
    format!("/api/stories/{}/{}", story_id, leaf)
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    ServiceError::Transport(e.to_string())
}

async fn check_status(resp: Response) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ServiceError::Unauthorized);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl StoryFeedProvider for HttpStoryClient {
    async fn fetch_feed(&self) -> Result<Vec<Story>, ServiceError> {
        self.get_json("/api/stories").await
    }

    async fn fetch_likes(&self, story_id: &StoryId) -> Result<LikeSummary, ServiceError> {
        self.get_json(&story_path(story_id, "likes")).await
    }

    async fn fetch_comments(&self, story_id: &StoryId) -> Result<CommentSummary, ServiceError> {
        self.get_json(&story_path(story_id, "comments")).await
    }
}

#[async_trait]
impl InteractionSubmitter for HttpStoryClient {
    async fn submit_like(&self, story_id: &StoryId) -> Result<(), ServiceError> {
        let path = story_path(story_id, "like");
        self.post(self.request(Method::POST, &path), &path).await
    }

    async fn submit_comment(&self, story_id: &StoryId, text: &str) -> Result<(), ServiceError> {
        let path = story_path(story_id, "comments");
        let builder = self
            .request(Method::POST, &path)
            .json(&NewComment { content: text });
        self.post(builder, &path).await
    }
}
