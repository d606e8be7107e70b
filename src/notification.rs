//! Single-slot notification toast.
//!
//! Two states: hidden, or visible with a message. A visible notification
//! hides itself once its display window has elapsed or when the user
//! dismisses it, whichever comes first. A new message replaces the current
//! one and restarts the window.
//!
//! The timer is a deadline checked against the caller's clock in [`Notifier::tick`];
//! nothing runs in the background.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default display window.
pub const DEFAULT_DISPLAY_MS: i64 = 3000;

/// What a consumer renders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationState {
    pub message: String,
    pub is_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Shown {
    message: String,
    shown_at: DateTime<Utc>,
}

/// The notification slot and its auto-dismiss timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notifier {
    #[serde(default)]
    visible: Option<Shown>,
    /// Message of the last notification, kept after it hides.
    #[serde(default)]
    last_message: String,
    #[serde(skip, default = "default_window")]
    window: Duration,
}

fn default_window() -> Duration {
    Duration::milliseconds(DEFAULT_DISPLAY_MS)
}

impl Default for Notifier {
    fn default() -> Self {
        Notifier::with_window(default_window())
    }
}

impl Notifier {
    pub fn with_window(window: Duration) -> Self {
        Notifier { visible: None, last_message: String::new(), window }
    }

    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Show `message`, replacing whatever is visible and restarting the timer.
    pub fn show(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        let message = message.into();
        tracing::info!(%message, "notification shown");
        self.last_message = message.clone();
        self.visible = Some(Shown { message, shown_at: now });
    }

    /// Hide the notification. Returns false if it was already hidden.
    pub fn dismiss(&mut self) -> bool {
        let was_visible = self.visible.take().is_some();
        if was_visible {
            tracing::debug!("notification dismissed");
        }
        was_visible
    }

    /// Fire the auto-dismiss timer if its deadline has passed.
    /// Returns true if this call hid the notification.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let expired = match &self.visible {
            Some(shown) => now - shown.shown_at >= self.window,
            None => false,
        };
        if expired {
            self.visible = None;
            tracing::debug!("notification expired");
        }
        expired
    }

    pub fn is_visible(&self) -> bool {
        self.visible.is_some()
    }

    /// The state a consumer should render at `now`, treating an expired
    /// notification as hidden even if `tick` has not run yet.
    pub fn state_at(&self, now: DateTime<Utc>) -> NotificationState {
        let is_visible = self.deadline().is_some_and(|deadline| now < deadline);
        NotificationState { message: self.last_message.clone(), is_visible }
    }

    /// When the visible notification will hide itself.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.visible.as_ref().map(|s| s.shown_at + self.window)
    }

    pub fn state(&self) -> NotificationState {
        NotificationState {
            message: self.last_message.clone(),
            is_visible: self.is_visible(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 6, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_starts_hidden() {
        let n = Notifier::default();
        assert_eq!(n.state(), NotificationState::default());
        assert_eq!(n.deadline(), None);
    }

    #[test]
    fn test_auto_dismiss_after_window() {
        let mut n = Notifier::default();
        n.show("Enrolled in X", t0());
        assert!(!n.tick(t0() + Duration::milliseconds(2999)));
        assert!(n.is_visible());
        assert!(n.tick(t0() + Duration::milliseconds(3000)));
        assert!(!n.is_visible());
        assert_eq!(n.state().message, "Enrolled in X");
    }

    #[test]
    fn test_manual_dismiss_wins_over_timer() {
        let mut n = Notifier::default();
        n.show("hello", t0());
        assert!(n.dismiss());
        assert!(!n.tick(t0() + Duration::seconds(5)));
        assert!(!n.dismiss());
    }

    #[test]
    fn test_timer_wins_over_manual_dismiss() {
        let mut n = Notifier::default();
        n.show("hello", t0());
        assert!(n.tick(t0() + Duration::seconds(3)));
        assert!(!n.dismiss());
    }

    #[test]
    fn test_new_message_restarts_timer() {
        let mut n = Notifier::default();
        n.show("first", t0());
        n.show("second", t0() + Duration::seconds(2));
        assert!(!n.tick(t0() + Duration::seconds(4)));
        assert_eq!(n.state(), NotificationState { message: "second".into(), is_visible: true });
        assert!(n.tick(t0() + Duration::seconds(5)));
    }

    #[test]
    fn test_state_at_hides_expired_without_tick() {
        let mut n = Notifier::default();
        n.show("hello", t0());
        assert!(n.state_at(t0() + Duration::seconds(1)).is_visible);
        assert!(!n.state_at(t0() + Duration::seconds(3)).is_visible);
        assert!(n.is_visible());
    }

    #[test]
    fn test_custom_window() {
        let mut n = Notifier::with_window(Duration::seconds(10));
        n.show("slow", t0());
        assert!(!n.tick(t0() + Duration::seconds(3)));
        assert_eq!(n.deadline(), Some(t0() + Duration::seconds(10)));
    }
}
