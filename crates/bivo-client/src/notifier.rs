//! Presentation of session notices.
//!
//! The headless viewer has no toast surface, so notices go to the log. The
//! cue computed for each notice says what an interactive shell would play.

use tracing::{info, warn};

use bivo_shared::NotificationSettings;
use bivo_stories::{Notice, NoticeLevel};

/// Side effects that accompany a notice on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoticeCue {
    /// Volume to play the notification sound at, if any.
    pub sound: Option<f32>,
    pub vibrate: bool,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    settings: NotificationSettings,
}

impl Notifier {
    pub fn new(settings: NotificationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: NotificationSettings) {
        self.settings = settings;
    }

    /// Errors vibrate; informational notices only chime.
    pub fn cue(&self, notice: &Notice) -> NoticeCue {
        NoticeCue {
            sound: self.settings.effective_volume(),
            vibrate: self.settings.enable_vibration && notice.level == NoticeLevel::Error,
        }
    }

    pub fn present(&self, notice: &Notice) -> NoticeCue {
        let cue = self.cue(notice);
        match notice.level {
            NoticeLevel::Info => {
                info!(message = %notice.message, sound = ?cue.sound, "Notice");
            }
            NoticeLevel::Error => {
                warn!(
                    message = %notice.message,
                    sound = ?cue.sound,
                    vibrate = cue.vibrate,
                    "Notice"
                );
            }
        }
        cue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(level: NoticeLevel) -> Notice {
        Notice {
            level,
            message: "Comment posted".into(),
        }
    }

    #[test]
    fn test_default_settings_cue() {
        let notifier = Notifier::new(NotificationSettings::default());

        let cue = notifier.cue(&notice(NoticeLevel::Info));
        assert_eq!(cue.sound, Some(0.5));
        assert!(!cue.vibrate);

        let cue = notifier.cue(&notice(NoticeLevel::Error));
        assert!(cue.vibrate);
    }

    #[test]
    fn test_muted() {
        let notifier = Notifier::new(NotificationSettings {
            enable_sound: false,
            enable_vibration: false,
            ..NotificationSettings::default()
        });

        let cue = notifier.present(&notice(NoticeLevel::Error));
        assert_eq!(
            cue,
            NoticeCue {
                sound: None,
                vibrate: false,
            }
        );
    }

    #[test]
    fn test_zero_volume_is_silent() {
        let mut notifier = Notifier::new(NotificationSettings::default());
        notifier.set_settings(NotificationSettings {
            sound_volume: 0.0,
            ..NotificationSettings::default()
        });
        assert_eq!(notifier.cue(&notice(NoticeLevel::Info)).sound, None);
    }
}
