/// Display time of every story, regardless of media kind or video length.
pub const STORY_DURATION_MS: u64 = 8_000;

/// Period of the progress timer.
pub const TICK_PERIOD_MS: u64 = 100;

/// Vertical travel (px) before a touch is treated as a drag.
pub const DRAG_START_DISTANCE_PX: f32 = 10.0;

/// Minimum time (ms) between touch start and a drag being recognised.
pub const DRAG_START_DELAY_MS: u64 = 50;

/// Vertical travel (px) that commits a navigation swipe on release.
pub const SWIPE_DISTANCE_PX: f32 = 80.0;

/// Release velocity (px/ms) that commits a navigation swipe.
pub const SWIPE_VELOCITY_PX_PER_MS: f32 = 0.5;

/// Two taps closer than this (ms) form a double-tap.
pub const DOUBLE_TAP_WINDOW_MS: u64 = 300;

/// Lifetime of a flying heart token (ms).
pub const HEART_LIFETIME_MS: u64 = 3_000;

/// Where the like button spawns its heart, in viewport fractions.
pub const LIKE_BUTTON_HEART_X: f32 = 0.5;
pub const LIKE_BUTTON_HEART_Y: f32 = 0.8;

/// Default backend base URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Application name
pub const APP_NAME: &str = "Bivochat";
