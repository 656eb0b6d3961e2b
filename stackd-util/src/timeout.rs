use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::NotificationUrgency;

/// Requested lifetime of a notification once it is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeout {
    /// Defer to the server's per-urgency setting.
    #[default]
    UseDefault,
    /// Stay until closed explicitly or dismissed by the user.
    NeverExpire,
    /// Expire after this many whole seconds.
    Seconds(u32),
}

impl Timeout {
    /// Convert the `expire_timeout` argument of `Notify`.
    ///
    /// Positive values are rounded to the nearest second with a floor of one
    /// second, `0` never expires and negative values use the server default.
    pub fn from_millis(expire_timeout: i32) -> Self {
        match expire_timeout {
            ms if ms > 0 => {
                let secs = (i64::from(ms) + 500) / 1000;
                Self::Seconds(secs.max(1) as u32)
            }
            0 => Self::NeverExpire,
            _ => Self::UseDefault,
        }
    }

    /// Resolve against the default for the notification's urgency.
    ///
    /// Returns `None` when the notification must not expire.
    pub fn resolve(self, default: Option<Duration>) -> Option<Duration> {
        match self {
            Self::UseDefault => default,
            Self::NeverExpire => None,
            Self::Seconds(secs) => Some(Duration::from_secs(u64::from(secs))),
        }
    }
}

/// Server-side expiry used for [`Timeout::UseDefault`], per urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrgencyTimeouts {
    pub low: Option<Duration>,
    pub normal: Option<Duration>,
    pub critical: Option<Duration>,
}

impl UrgencyTimeouts {
    pub fn for_urgency(&self, urgency: NotificationUrgency) -> Option<Duration> {
        match urgency {
            NotificationUrgency::Low => self.low,
            NotificationUrgency::Normal => self.normal,
            NotificationUrgency::Critical => self.critical,
        }
    }
}
