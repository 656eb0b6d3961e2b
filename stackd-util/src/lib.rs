pub mod action;
pub mod color;
pub mod format;
pub mod request;
pub mod sanitizer;
pub mod timeout;
pub mod urgency;

pub use action::{ActionId, NotificationAction, parse_actions};
pub use color::Color;
pub use format::render_text;
pub use request::NotifyRequest;
pub use sanitizer::{strip_markup, to_pango_markup};
pub use timeout::{Timeout, UrgencyTimeouts};
pub use urgency::NotificationUrgency;

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Malformed protocol input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("action key {0:?} has no label")]
    UnpairedAction(String),
    #[error("invalid color {0:?}")]
    InvalidColor(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hint {
    FgColor(String),
    BgColor(String),
    Urgency(u8),
    Value(i32),
}

/// One notification request plus its presentation state.
///
/// Content fields are fixed once the notification is created; only a
/// replace request swaps them, and only the queue manager does that. The
/// render fields (`text`, `height`, `start`) are written by the queue and
/// layout code.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u32,
    pub app_name: String,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub actions: Vec<NotificationAction>,
    pub hints: Vec<Hint>,
    /// Timeout as requested by the caller, already rounded to seconds.
    pub timeout: Timeout,
    /// Effective expiry, resolved once against the urgency defaults.
    pub expire_after: Option<Duration>,
    /// Unique bus name of the caller, signals are addressed to it.
    pub client: Option<String>,
    /// Display text with markup resolved.
    pub text: String,
    /// Pixel height of the whole block, padding included.
    pub height: i32,
    /// When the notification was promoted to the displayed stack.
    pub start: Option<Instant>,
}

impl Notification {
    pub fn from_request(id: u32, request: NotifyRequest, defaults: &UrgencyTimeouts) -> Self {
        let mut n = Notification {
            id,
            app_name: String::new(),
            app_icon: String::new(),
            summary: String::new(),
            body: String::new(),
            actions: Vec::new(),
            hints: Vec::new(),
            timeout: Timeout::UseDefault,
            expire_after: None,
            client: None,
            text: String::new(),
            height: 0,
            start: None,
        };
        n.replace_content(request, defaults);
        n
    }

    /// Swap in the content of a replacing request, keeping id and position.
    ///
    /// The render state is reset; the caller restarts the expiry timer.
    pub fn replace_content(&mut self, request: NotifyRequest, defaults: &UrgencyTimeouts) {
        self.app_name = request.app_name;
        self.app_icon = request.app_icon;
        self.summary = request.summary;
        self.body = request.body;
        self.actions = request.actions;
        self.hints = request.hints;
        self.timeout = Timeout::from_millis(request.expire_timeout);
        self.expire_after = self.timeout.resolve(defaults.for_urgency(self.urgency()));
        self.client = request.client;
        self.text.clear();
        self.height = 0;
    }

    /// Stop this notification from ever expiring.
    pub fn make_sticky(&mut self) {
        self.timeout = Timeout::NeverExpire;
        self.expire_after = None;
    }

    /// Whether the expiry timer has run out at `now`.
    ///
    /// Notifications that were never promoted or never expire are not
    /// expired.
    pub fn is_expired(&self, now: Instant) -> bool {
        match (self.start, self.expire_after) {
            (Some(start), Some(after)) => now.saturating_duration_since(start) >= after,
            _ => false,
        }
    }

    pub fn urgency(&self) -> NotificationUrgency {
        self.hints
            .iter()
            .find_map(|h| match h {
                Hint::Urgency(u) => Some(NotificationUrgency::from(*u)),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Foreground color override from the `fgcolor` hint
    pub fn fg_color(&self) -> Option<&str> {
        self.hints.iter().find_map(|h| match h {
            Hint::FgColor(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Background color override from the `bgcolor` hint
    pub fn bg_color(&self) -> Option<&str> {
        self.hints.iter().find_map(|h| match h {
            Hint::BgColor(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Progress in percent from the `value` hint, if it is in range.
    pub fn progress(&self) -> Option<u8> {
        self.hints.iter().find_map(|h| match h {
            Hint::Value(v) => u8::try_from(*v).ok().filter(|v| *v <= 100),
            _ => None,
        })
    }
}

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    Expired = 1,
    Dismissed = 2,
    CloseNotification = 3,
    Undefined = 4,
}
