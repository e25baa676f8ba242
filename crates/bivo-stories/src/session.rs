//! Async playback session.
//!
//! A session owns one [`PlaybackEngine`] inside a dedicated tokio task.
//! Viewer input arrives on an mpsc channel, session events leave on a bounded
//! one, and network requests run in spawned tasks that report back through a
//! completion channel tagged with an [`InteractionTicket`].
//!
//! The progress timer is an explicit `Interval` handle. It exists only while
//! the engine is playing and is rebuilt whenever playback resumes or the
//! index changes, so a tick can never land on a story it was not started for.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use bivo_shared::constants::{HEART_LIFETIME_MS, TICK_PERIOD_MS};
use bivo_shared::{CommentSummary, LikeSummary, MediaKind, ServiceError, Story, StoryId};

use crate::engine::{InteractionTicket, Navigation, PlaybackEngine, PlaybackSnapshot, Viewport};
use crate::error::PlaybackError;
use crate::hearts::FlyingHeart;
use crate::ports::{InteractionSubmitter, StoryFeedProvider};

/// Events buffered for a viewer that is not reading. Beyond this, new events
/// are dropped until the viewer catches up.
pub const EVENT_BUFFER: usize = 1024;

// ---------------------------------------------------------------------------
// Input / event types
// ---------------------------------------------------------------------------

/// Input sent *into* the session task by the viewer.
///
/// Gesture and tap timestamps are milliseconds on the caller's input clock;
/// only differences between them matter.
#[derive(Debug)]
pub enum ViewerInput {
    /// Tap on the media area outside any control.
    TogglePlay,
    /// Manual forward navigation.
    Next,
    /// Manual backward navigation.
    Previous,
    GestureStart { y: f32, t: u64 },
    GestureMove { y: f32, t: u64 },
    GestureEnd { y: f32, t: u64 },
    /// Tap on the story surface, checked for double-tap.
    Tap { x: f32, y: f32, t: u64 },
    /// Like button.
    Like,
    SetCommentDraft(String),
    SubmitComment,
    OpenComments,
    CloseComments,
    /// Request a snapshot of the playback state.
    Snapshot(oneshot::Sender<PlaybackSnapshot>),
    /// Close button.
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient, non-blocking message for the viewer (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    fn error(err: &ServiceError) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: err.notice().to_string(),
        }
    }
}

/// Events sent *from* the session task to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started {
        story_count: usize,
    },
    StoryChanged {
        index: usize,
        story_id: StoryId,
        media_kind: MediaKind,
    },
    Progress {
        index: usize,
        percent: f64,
    },
    PlayStateChanged {
        playing: bool,
    },
    DragMoved {
        offset: f32,
    },
    HeartSpawned(FlyingHeart),
    HeartExpired {
        id: u64,
    },
    LikesUpdated {
        story_id: StoryId,
        likes: LikeSummary,
    },
    CommentsUpdated {
        story_id: StoryId,
        comments: CommentSummary,
    },
    LikeSubmitted {
        story_id: StoryId,
    },
    CommentPosted {
        story_id: StoryId,
    },
    Notice(Notice),
    Closed,
}

/// Options for a playback session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub viewport: Viewport,
    /// Period of the progress timer.
    pub tick_period: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            tick_period: Duration::from_millis(TICK_PERIOD_MS),
        }
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// The viewer's end of a running session.
///
/// Dropping the handle closes the session.
pub struct SessionHandle {
    input_tx: mpsc::Sender<ViewerInput>,
    events: mpsc::Receiver<SessionEvent>,
    live: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub async fn send(&self, input: ViewerInput) -> Result<(), PlaybackError> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| PlaybackError::SessionClosed)
    }

    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, PlaybackError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(ViewerInput::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| PlaybackError::SessionClosed)
    }

    pub async fn close(&self) -> Result<(), PlaybackError> {
        self.send(ViewerInput::Close).await
    }

    /// Wait for the next event. `None` once the session has ended and every
    /// event has been read.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Return an already-queued event without waiting.
    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }

    pub fn is_open(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Wait for the session task to finish.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Story session task failed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct StorySession;

impl StorySession {
    /// Fetch the feed and start playing it.
    ///
    /// A feed failure is returned to the caller and no session is created.
    pub async fn open(
        provider: Arc<dyn StoryFeedProvider>,
        submitter: Arc<dyn InteractionSubmitter>,
        options: SessionOptions,
    ) -> Result<SessionHandle, ServiceError> {
        let feed = provider.fetch_feed().await.map_err(|e| {
            warn!(error = %e, "Failed to load story feed");
            e
        })?;

        info!(stories = feed.len(), "Story feed loaded");
        Ok(Self::spawn(feed, provider, submitter, options))
    }

    /// Start a session over an already-fetched feed.
    ///
    /// An empty feed yields a handle whose only event is
    /// [`SessionEvent::Closed`].
    pub fn spawn(
        feed: Vec<Story>,
        provider: Arc<dyn StoryFeedProvider>,
        submitter: Arc<dyn InteractionSubmitter>,
        options: SessionOptions,
    ) -> SessionHandle {
        let (input_tx, input_rx) = mpsc::channel::<ViewerInput>(64);
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(EVENT_BUFFER);
        let live = Arc::new(AtomicBool::new(false));

        let engine = match PlaybackEngine::start(feed) {
            Ok(engine) => engine.with_viewport(options.viewport),
            Err(e) => {
                info!(reason = %e, "Nothing to play, closing immediately");
                let _ = event_tx.try_send(SessionEvent::Closed);
                return SessionHandle {
                    input_tx,
                    events: event_rx,
                    live,
                    task: None,
                };
            }
        };

        live.store(true, Ordering::SeqCst);

        let (done_tx, done_rx) = mpsc::unbounded_channel::<Completion>();
        let actor = SessionActor {
            reported_playing: engine.is_playing(),
            engine,
            provider,
            submitter,
            events: event_tx,
            events_overflowing: false,
            done_tx,
            live: live.clone(),
            clock: Instant::now(),
            tick_period: options.tick_period,
            timer: None,
            timer_epoch: None,
        };

        let task = tokio::spawn(actor.run(input_rx, done_rx));

        SessionHandle {
            input_tx,
            events: event_rx,
            live,
            task: Some(task),
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeOrigin {
    Button,
    DoubleTap,
}

/// Results of work spawned by the session, delivered back to the actor.
enum Completion {
    Likes {
        ticket: InteractionTicket,
        result: Result<LikeSummary, ServiceError>,
    },
    Comments {
        ticket: InteractionTicket,
        result: Result<CommentSummary, ServiceError>,
    },
    Like {
        ticket: InteractionTicket,
        origin: LikeOrigin,
        result: Result<(), ServiceError>,
    },
    Comment {
        ticket: InteractionTicket,
        text: String,
        result: Result<(), ServiceError>,
    },
    HeartExpired(u64),
}

struct SessionActor {
    engine: PlaybackEngine,
    provider: Arc<dyn StoryFeedProvider>,
    submitter: Arc<dyn InteractionSubmitter>,
    events: mpsc::Sender<SessionEvent>,
    /// Set while the viewer's event buffer is full.
    events_overflowing: bool,
    done_tx: mpsc::UnboundedSender<Completion>,
    live: Arc<AtomicBool>,
    /// Session clock for hearts created outside a tap.
    clock: Instant,
    tick_period: Duration,
    timer: Option<Interval>,
    /// Epoch the running timer was created for.
    timer_epoch: Option<u64>,
    reported_playing: bool,
}

impl SessionActor {
    async fn run(
        mut self,
        mut input_rx: mpsc::Receiver<ViewerInput>,
        mut done_rx: mpsc::UnboundedReceiver<Completion>,
    ) {
        info!(stories = self.engine.story_count(), "Story session started");
        self.emit(SessionEvent::Started {
            story_count: self.engine.story_count(),
        });
        self.story_changed();

        loop {
            self.sync_timer();

            tokio::select! {
                _ = next_tick(&mut self.timer) => {
                    self.on_tick();
                }
                input = input_rx.recv() => {
                    match input {
                        Some(input) => self.on_input(input),
                        None => {
                            info!("Viewer handle dropped, closing story session");
                            self.engine.close();
                        }
                    }
                }
                Some(done) = done_rx.recv() => {
                    self.on_completion(done);
                }
            }

            self.report_play_state();

            if self.engine.is_closed() {
                break;
            }
        }

        // In-flight requests may still finish; the flag and the dropped
        // receiver make sure nothing they return is applied.
        self.live.store(false, Ordering::SeqCst);
        self.timer = None;
        self.emit(SessionEvent::Closed);
        info!("Story session ended");
    }

    /// Keep the timer in step with the engine: present only while playing,
    /// recreated from zero for every new epoch or after a pause.
    fn sync_timer(&mut self) {
        let wanted = (self.engine.is_playing() && !self.engine.is_closed())
            .then(|| self.engine.epoch());

        if wanted == self.timer_epoch {
            return;
        }

        self.timer = wanted.map(|_| {
            let mut interval = time::interval_at(Instant::now() + self.tick_period, self.tick_period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        self.timer_epoch = wanted;
    }

    fn on_tick(&mut self) {
        let elapsed_ms = self.tick_period.as_millis() as u64;
        match self.engine.tick(elapsed_ms) {
            Some(navigation) => self.after_navigation(navigation),
            None => self.emit(SessionEvent::Progress {
                index: self.engine.current_index(),
                percent: self.engine.progress_percent(),
            }),
        }
    }

    fn on_input(&mut self, input: ViewerInput) {
        match input {
            ViewerInput::TogglePlay => {
                self.engine.toggle_play();
            }
            ViewerInput::Next => {
                let navigation = self.engine.advance();
                self.after_navigation(navigation);
            }
            ViewerInput::Previous => {
                if let Some(navigation) = self.engine.retreat() {
                    self.after_navigation(navigation);
                }
            }
            ViewerInput::GestureStart { y, t } => {
                self.engine.gesture_start(y, t);
            }
            ViewerInput::GestureMove { y, t } => {
                if let Some(offset) = self.engine.gesture_move(y, t) {
                    self.emit(SessionEvent::DragMoved { offset });
                }
            }
            ViewerInput::GestureEnd { y, t } => {
                if let Some(navigation) = self.engine.gesture_end(y, t) {
                    self.after_navigation(navigation);
                }
            }
            ViewerInput::Tap { x, y, t } => {
                if let Some(reaction) = self.engine.tap(x, y, t) {
                    debug!(x, y, "Double-tap on story");
                    self.heart_spawned(reaction.heart);
                    if let Some(ticket) = reaction.like {
                        self.submit_like(ticket, LikeOrigin::DoubleTap);
                    }
                }
            }
            ViewerInput::Like => {
                if let Some(ticket) = self.engine.like_current() {
                    self.submit_like(ticket, LikeOrigin::Button);
                }
            }
            ViewerInput::SetCommentDraft(text) => {
                self.engine.set_comment_draft(text);
            }
            ViewerInput::SubmitComment => match self.engine.submit_comment() {
                Some((ticket, text)) => self.submit_comment(ticket, text),
                None => debug!("Ignoring blank comment"),
            },
            ViewerInput::OpenComments => {
                self.engine.open_comments();
                self.refresh_comments();
            }
            ViewerInput::CloseComments => {
                self.engine.close_comments();
            }
            ViewerInput::Snapshot(reply) => {
                let _ = reply.send(self.engine.snapshot());
            }
            ViewerInput::Close => {
                info!(index = self.engine.current_index(), "Viewer closed story session");
                self.engine.close();
            }
        }
    }

    fn on_completion(&mut self, done: Completion) {
        match done {
            Completion::Likes { ticket, result } => match result {
                Ok(likes) => {
                    if self.engine.apply_likes(&ticket, likes.clone()) {
                        self.emit(SessionEvent::LikesUpdated {
                            story_id: ticket.story_id,
                            likes,
                        });
                    }
                }
                Err(e) => warn!(story = %ticket.story_id, error = %e, "Failed to fetch likes"),
            },

            Completion::Comments { ticket, result } => match result {
                Ok(comments) => {
                    if self.engine.apply_comments(&ticket, comments.clone()) {
                        self.emit(SessionEvent::CommentsUpdated {
                            story_id: ticket.story_id,
                            comments,
                        });
                    }
                }
                Err(e) => warn!(story = %ticket.story_id, error = %e, "Failed to fetch comments"),
            },

            Completion::Like {
                ticket,
                origin,
                result,
            } => {
                if !self.engine.is_current(&ticket) {
                    debug!(story = %ticket.story_id, "Discarding stale like result");
                    return;
                }
                match result {
                    Ok(()) => {
                        info!(story = %ticket.story_id, ?origin, "Story liked");
                        self.emit(SessionEvent::LikeSubmitted {
                            story_id: ticket.story_id.clone(),
                        });
                        if origin == LikeOrigin::Button {
                            let now = self.now_ms();
                            if let Some(heart) = self.engine.like_confirmed(&ticket, now) {
                                self.heart_spawned(heart);
                            }
                        }
                        self.refresh_likes();
                    }
                    Err(e) => {
                        warn!(story = %ticket.story_id, error = %e, "Like failed");
                        self.emit(SessionEvent::Notice(Notice::error(&e)));
                    }
                }
            }

            // The draft outlives navigation, so the outcome is reported even
            // when the viewer has moved on. Only the refetch is story-bound.
            Completion::Comment {
                ticket,
                text,
                result,
            } => match result {
                Ok(()) => {
                    info!(story = %ticket.story_id, "Comment posted");
                    self.engine.comment_confirmed(&text);
                    self.emit(SessionEvent::CommentPosted {
                        story_id: ticket.story_id.clone(),
                    });
                    self.emit(SessionEvent::Notice(Notice::info("Comment posted")));
                    if self.engine.is_current(&ticket) {
                        self.refresh_comments();
                    }
                }
                Err(e) => {
                    warn!(story = %ticket.story_id, error = %e, "Comment failed");
                    self.emit(SessionEvent::Notice(Notice::error(&e)));
                }
            },

            Completion::HeartExpired(id) => {
                if self.engine.remove_heart(id) {
                    self.emit(SessionEvent::HeartExpired { id });
                }
            }
        }
    }

    fn after_navigation(&mut self, navigation: Navigation) {
        match navigation {
            Navigation::Moved { from, to } => {
                debug!(from, to, "Story navigation");
                self.story_changed();
            }
            Navigation::Closed => {
                info!("End of story feed");
            }
        }
    }

    fn story_changed(&mut self) {
        let story = self.engine.current_story();
        let event = SessionEvent::StoryChanged {
            index: self.engine.current_index(),
            story_id: story.id.clone(),
            media_kind: story.media_kind(),
        };
        self.emit(event);
        self.refresh_likes();
        self.refresh_comments();
    }

    fn report_play_state(&mut self) {
        let playing = self.engine.is_playing();
        if playing != self.reported_playing && !self.engine.is_closed() {
            self.reported_playing = playing;
            self.emit(SessionEvent::PlayStateChanged { playing });
        }
    }

    // -- Spawned work --------------------------------------------------------

    /// Run `work` in its own task and hand its completion back to the actor
    /// if the session is still alive.
    fn dispatch<F>(&self, work: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let done_tx = self.done_tx.clone();
        let live = self.live.clone();
        tokio::spawn(async move {
            let done = work.await;
            if live.load(Ordering::SeqCst) {
                let _ = done_tx.send(done);
            }
        });
    }

    fn refresh_likes(&self) {
        let ticket = self.engine.ticket();
        let provider = self.provider.clone();
        self.dispatch(async move {
            let result = provider.fetch_likes(&ticket.story_id).await;
            Completion::Likes { ticket, result }
        });
    }

    fn refresh_comments(&self) {
        let ticket = self.engine.ticket();
        let provider = self.provider.clone();
        self.dispatch(async move {
            let result = provider.fetch_comments(&ticket.story_id).await;
            Completion::Comments { ticket, result }
        });
    }

    fn submit_like(&self, ticket: InteractionTicket, origin: LikeOrigin) {
        debug!(story = %ticket.story_id, ?origin, "Submitting like");
        let submitter = self.submitter.clone();
        self.dispatch(async move {
            let result = submitter.submit_like(&ticket.story_id).await;
            Completion::Like {
                ticket,
                origin,
                result,
            }
        });
    }

    fn submit_comment(&self, ticket: InteractionTicket, text: String) {
        debug!(story = %ticket.story_id, len = text.len(), "Submitting comment");
        let submitter = self.submitter.clone();
        self.dispatch(async move {
            let result = submitter.submit_comment(&ticket.story_id, &text).await;
            Completion::Comment {
                ticket,
                text,
                result,
            }
        });
    }

    fn heart_spawned(&mut self, heart: FlyingHeart) {
        self.emit(SessionEvent::HeartSpawned(heart));
        let id = heart.id;
        self.dispatch(async move {
            time::sleep(Duration::from_millis(HEART_LIFETIME_MS)).await;
            Completion::HeartExpired(id)
        });
    }

    // -- Helpers -------------------------------------------------------------

    fn emit(&mut self, event: SessionEvent) {
        match self.events.try_send(event) {
            Ok(()) => {
                if self.events_overflowing {
                    debug!("Viewer caught up with session events");
                    self.events_overflowing = false;
                }
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                if !self.events_overflowing {
                    warn!(capacity = EVENT_BUFFER, "Viewer is not reading events, dropping");
                    self.events_overflowing = true;
                }
            }
            // The viewer may have stopped listening; playback carries on.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    fn now_ms(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }
}

/// Wait for the next timer tick, or forever when no timer is running.
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bivo_shared::{Comment, CommentId, UserRef};
    use chrono::Utc;

    use super::*;

    // -----------------------------------------------------------------------
    // In-memory backend
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct FakeBackend {
        feed: Vec<Story>,
        fail_feed: bool,
        fail_likes: bool,
        like_delay: Duration,
        comment_delay: Duration,
        liked: Mutex<HashSet<StoryId>>,
        like_calls: Mutex<Vec<StoryId>>,
        comment_calls: Mutex<Vec<(StoryId, String)>>,
    }

    impl FakeBackend {
        fn with_feed(feed: Vec<Story>) -> Self {
            Self {
                feed,
                ..Self::default()
            }
        }

        fn like_calls(&self) -> Vec<StoryId> {
            self.like_calls.lock().unwrap().clone()
        }

        fn comment_calls(&self) -> Vec<(StoryId, String)> {
            self.comment_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StoryFeedProvider for FakeBackend {
        async fn fetch_feed(&self) -> Result<Vec<Story>, ServiceError> {
            if self.fail_feed {
                return Err(ServiceError::Transport("offline".into()));
            }
            Ok(self.feed.clone())
        }

        async fn fetch_likes(&self, story_id: &StoryId) -> Result<LikeSummary, ServiceError> {
            let liked = self.liked.lock().unwrap().contains(story_id);
            Ok(LikeSummary {
                count: liked as u32,
                viewer_has_liked: liked,
                likers: Vec::new(),
            })
        }

        async fn fetch_comments(&self, story_id: &StoryId) -> Result<CommentSummary, ServiceError> {
            let comments: Vec<Comment> = self
                .comment_calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, _)| id == story_id)
                .map(|(_, text)| Comment {
                    id: CommentId::new(text.len().to_string()),
                    author: UserRef::default(),
                    content: text.clone(),
                    created_at: Utc::now(),
                })
                .collect();
            Ok(CommentSummary {
                count: comments.len() as u32,
                comments,
            })
        }
    }

    #[async_trait]
    impl InteractionSubmitter for FakeBackend {
        async fn submit_like(&self, story_id: &StoryId) -> Result<(), ServiceError> {
            time::sleep(self.like_delay).await;
            self.like_calls.lock().unwrap().push(story_id.clone());
            if self.fail_likes {
                return Err(ServiceError::Transport("offline".into()));
            }
            self.liked.lock().unwrap().insert(story_id.clone());
            Ok(())
        }

        async fn submit_comment(&self, story_id: &StoryId, text: &str) -> Result<(), ServiceError> {
            time::sleep(self.comment_delay).await;
            self.comment_calls
                .lock()
                .unwrap()
                .push((story_id.clone(), text.to_string()));
            Ok(())
        }
    }

    fn story(id: &str, image: Option<&str>, video: Option<&str>) -> Story {
        Story {
            id: StoryId::new(id),
            author: UserRef {
                name: "Vendor".into(),
                profile_image: None,
                is_verified: true,
            },
            content: Some(format!("story {id}")),
            image_url: image.map(String::from),
            video_url: video.map(String::from),
            created_at: None,
            expires_at: None,
        }
    }

    fn three_stories() -> Vec<Story> {
        vec![
            story("a", Some("/a.jpg"), None),
            story("b", None, Some("/b.mp4")),
            story("c", None, None),
        ]
    }

    async fn open(backend: &Arc<FakeBackend>) -> SessionHandle {
        StorySession::open(backend.clone(), backend.clone(), SessionOptions::default())
            .await
            .unwrap()
    }

    async fn settle() {
        time::sleep(Duration::from_millis(10)).await;
    }

    fn drain(handle: &mut SessionHandle) -> Vec<SessionEvent> {
        std::iter::from_fn(|| handle.try_next_event()).collect()
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_feed_failure_never_starts() {
        let backend = Arc::new(FakeBackend {
            fail_feed: true,
            ..FakeBackend::default()
        });
        let result =
            StorySession::open(backend.clone(), backend.clone(), SessionOptions::default()).await;
        assert!(matches!(result, Err(ServiceError::Transport(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_feed_closes_immediately() {
        let backend = Arc::new(FakeBackend::default());
        let mut handle = open(&backend).await;

        assert_eq!(handle.next_event().await, Some(SessionEvent::Closed));
        assert!(!handle.is_open());
        assert_eq!(handle.snapshot().await.unwrap_err(), PlaybackError::SessionClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autoplay_advances_after_duration() {
        let backend = Arc::new(FakeBackend::with_feed(three_stories()));
        let mut handle = open(&backend).await;

        time::sleep(Duration::from_millis(7_950)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 0);
        assert_eq!(snapshot.progress_percent, 98.75);

        time::sleep(Duration::from_millis(100)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 1);
        assert_eq!(snapshot.progress_percent, 0.0);

        let events = drain(&mut handle);
        assert_eq!(events[0], SessionEvent::Started { story_count: 3 });
        assert!(events.contains(&SessionEvent::StoryChanged {
            index: 1,
            story_id: StoryId::new("b"),
            media_kind: MediaKind::Video,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_suspends_timer() {
        let backend = Arc::new(FakeBackend::with_feed(three_stories()));
        let mut handle = open(&backend).await;

        time::sleep(Duration::from_millis(1_050)).await;
        handle.send(ViewerInput::TogglePlay).await.unwrap();
        time::sleep(Duration::from_secs(20)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 0);
        assert_eq!(snapshot.progress_percent, 12.5);
        assert!(!snapshot.is_playing);
        assert!(drain(&mut handle).contains(&SessionEvent::PlayStateChanged { playing: false }));

        handle.send(ViewerInput::TogglePlay).await.unwrap();
        time::sleep(Duration::from_millis(7_050)).await;
        assert_eq!(handle.snapshot().await.unwrap().current_index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_swipe_and_close() {
        let backend = Arc::new(FakeBackend::with_feed(three_stories()));
        let mut handle = open(&backend).await;

        time::sleep(Duration::from_millis(8_050)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 1);
        assert_eq!(snapshot.progress_percent, 0.0);

        handle
            .send(ViewerInput::GestureStart { y: 600.0, t: 50_000 })
            .await
            .unwrap();
        handle
            .send(ViewerInput::GestureEnd { y: 500.0, t: 50_150 })
            .await
            .unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 2);
        assert_eq!(snapshot.progress_percent, 0.0);
        assert!(snapshot.is_playing);

        handle.send(ViewerInput::Next).await.unwrap();

        let mut indices = Vec::new();
        while let Some(event) = handle.next_event().await {
            match event {
                SessionEvent::StoryChanged { index, .. } => indices.push(index),
                SessionEvent::Closed => break,
                _ => {}
            }
        }
        assert_eq!(indices, vec![0, 1, 2]);

        settle().await;
        assert!(!handle.is_open());
        assert_eq!(
            handle.send(ViewerInput::Next).await.unwrap_err(),
            PlaybackError::SessionClosed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_tap_likes_once() {
        let backend = Arc::new(FakeBackend::with_feed(three_stories()));
        let handle = open(&backend).await;

        handle
            .send(ViewerInput::Tap { x: 120.0, y: 300.0, t: 0 })
            .await
            .unwrap();
        handle
            .send(ViewerInput::Tap { x: 120.0, y: 300.0, t: 250 })
            .await
            .unwrap();
        settle().await;

        assert_eq!(backend.like_calls(), vec![StoryId::new("a")]);
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.hearts.len(), 1);
        assert_eq!(snapshot.hearts[0].x, 120.0);
        assert!(snapshot.likes.as_ref().is_some_and(|l| l.viewer_has_liked));

        // Already liked: another double-tap only animates.
        handle
            .send(ViewerInput::Tap { x: 10.0, y: 10.0, t: 1_000 })
            .await
            .unwrap();
        handle
            .send(ViewerInput::Tap { x: 10.0, y: 10.0, t: 1_100 })
            .await
            .unwrap();
        settle().await;
        assert_eq!(backend.like_calls().len(), 1);
        assert_eq!(handle.snapshot().await.unwrap().hearts.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heart_lives_for_exactly_its_lifetime() {
        let backend = Arc::new(FakeBackend::with_feed(three_stories()));
        let mut handle = open(&backend).await;

        handle
            .send(ViewerInput::Tap { x: 50.0, y: 50.0, t: 0 })
            .await
            .unwrap();
        handle
            .send(ViewerInput::Tap { x: 50.0, y: 50.0, t: 100 })
            .await
            .unwrap();

        time::sleep(Duration::from_millis(HEART_LIFETIME_MS - 1)).await;
        let hearts = handle.snapshot().await.unwrap().hearts;
        assert_eq!(hearts.len(), 1);
        let id = hearts[0].id;

        time::sleep(Duration::from_millis(1)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert!(handle.snapshot().await.unwrap().hearts.is_empty());
        assert!(drain(&mut handle).contains(&SessionEvent::HeartExpired { id }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_taps_do_not_like() {
        let backend = Arc::new(FakeBackend::with_feed(three_stories()));
        let handle = open(&backend).await;

        handle
            .send(ViewerInput::Tap { x: 0.0, y: 0.0, t: 0 })
            .await
            .unwrap();
        handle
            .send(ViewerInput::Tap { x: 0.0, y: 0.0, t: 400 })
            .await
            .unwrap();
        settle().await;

        assert!(backend.like_calls().is_empty());
        assert!(handle.snapshot().await.unwrap().hearts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_like_button_spawns_heart_on_success() {
        let backend = Arc::new(FakeBackend::with_feed(three_stories()));
        let mut handle = open(&backend).await;

        handle.send(ViewerInput::Like).await.unwrap();
        settle().await;

        let events = drain(&mut handle);
        assert!(events.contains(&SessionEvent::LikeSubmitted {
            story_id: StoryId::new("a"),
        }));
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::HeartSpawned(_))));
        assert_eq!(handle.snapshot().await.unwrap().hearts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_like_is_discarded() {
        let backend = Arc::new(FakeBackend {
            like_delay: Duration::from_millis(500),
            ..FakeBackend::with_feed(three_stories())
        });
        let mut handle = open(&backend).await;

        handle.send(ViewerInput::Like).await.unwrap();
        handle.send(ViewerInput::Next).await.unwrap();
        time::sleep(Duration::from_millis(600)).await;

        assert_eq!(backend.like_calls(), vec![StoryId::new("a")]);

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 1);
        assert_eq!(
            snapshot.likes,
            Some(LikeSummary {
                count: 0,
                viewer_has_liked: false,
                likers: Vec::new(),
            })
        );
        assert!(snapshot.hearts.is_empty());

        let events = drain(&mut handle);
        assert!(!events.iter().any(|e| matches!(
            e,
            SessionEvent::LikeSubmitted { .. } | SessionEvent::HeartSpawned(_)
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_like_failure_reports_and_keeps_state() {
        let backend = Arc::new(FakeBackend {
            fail_likes: true,
            ..FakeBackend::with_feed(three_stories())
        });
        let mut handle = open(&backend).await;

        handle.send(ViewerInput::Like).await.unwrap();
        settle().await;

        let events = drain(&mut handle);
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::Notice(Notice {
                level: NoticeLevel::Error,
                ..
            })
        )));

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 0);
        assert!(snapshot.is_playing);
        assert!(snapshot.hearts.is_empty());
        assert!(handle.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_comment_submission() {
        let backend = Arc::new(FakeBackend::with_feed(three_stories()));
        let mut handle = open(&backend).await;

        handle.send(ViewerInput::OpenComments).await.unwrap();
        handle
            .send(ViewerInput::SetCommentDraft("   ".into()))
            .await
            .unwrap();
        handle.send(ViewerInput::SubmitComment).await.unwrap();
        settle().await;
        assert!(backend.comment_calls().is_empty());

        handle
            .send(ViewerInput::SetCommentDraft("Is this in stock?".into()))
            .await
            .unwrap();
        handle.send(ViewerInput::SubmitComment).await.unwrap();
        settle().await;

        assert_eq!(
            backend.comment_calls(),
            vec![(StoryId::new("a"), "Is this in stock?".to_string())]
        );

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.comment_draft, "");
        assert!(snapshot.comments_open);
        assert!(snapshot.is_playing);
        assert_eq!(snapshot.comments.map(|c| c.count), Some(1));

        let events = drain(&mut handle);
        assert!(events.contains(&SessionEvent::CommentPosted {
            story_id: StoryId::new("a"),
        }));
        assert!(events.contains(&SessionEvent::Notice(Notice::info("Comment posted"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_comment_posted_after_navigation_clears_draft() {
        let backend = Arc::new(FakeBackend {
            comment_delay: Duration::from_millis(500),
            ..FakeBackend::with_feed(three_stories())
        });
        let mut handle = open(&backend).await;

        handle
            .send(ViewerInput::SetCommentDraft("Is this in stock?".into()))
            .await
            .unwrap();
        handle.send(ViewerInput::SubmitComment).await.unwrap();
        handle.send(ViewerInput::Next).await.unwrap();
        time::sleep(Duration::from_millis(600)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 1);
        assert_eq!(snapshot.comment_draft, "");
        assert_eq!(snapshot.comments.map(|c| c.count), Some(0));

        let events = drain(&mut handle);
        assert!(events.contains(&SessionEvent::CommentPosted {
            story_id: StoryId::new("a"),
        }));
        assert!(events.contains(&SessionEvent::Notice(Notice::info("Comment posted"))));

        // Submitting again has nothing to post to the new story.
        handle.send(ViewerInput::SubmitComment).await.unwrap();
        time::sleep(Duration::from_millis(600)).await;
        assert_eq!(
            backend.comment_calls(),
            vec![(StoryId::new("a"), "Is this in stock?".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unread_events_are_bounded() {
        let feed: Vec<Story> = (0..20)
            .map(|i| story(&i.to_string(), None, None))
            .collect();
        let backend = Arc::new(FakeBackend::with_feed(feed));
        let mut handle = open(&backend).await;

        // About 1500 progress ticks with nobody reading.
        time::sleep(Duration::from_secs(150)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current_index, 18);
        assert!(handle.is_open());

        let buffered = drain(&mut handle);
        assert_eq!(buffered.len(), EVENT_BUFFER);
        assert_eq!(buffered[0], SessionEvent::Started { story_count: 20 });

        // Once drained, new events flow again.
        handle.send(ViewerInput::Next).await.unwrap();
        settle().await;
        assert!(drain(&mut handle).contains(&SessionEvent::StoryChanged {
            index: 19,
            story_id: StoryId::new("19"),
            media_kind: MediaKind::Text,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_ends_session() {
        let backend = Arc::new(FakeBackend::with_feed(three_stories()));
        let mut handle = open(&backend).await;

        handle.close().await.unwrap();
        while let Some(event) = handle.next_event().await {
            if event == SessionEvent::Closed {
                break;
            }
        }
        assert!(!handle.is_open());
        handle.join().await;
    }
}
