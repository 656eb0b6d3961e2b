use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification urgency level as defined by the freedesktop.org specification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum NotificationUrgency {
    /// Low urgency notification
    Low = 0,
    /// Normal urgency notification (default)
    #[default]
    Normal = 1,
    /// Critical urgency notification
    Critical = 2,
}

impl NotificationUrgency {
    /// Parse the raw `urgency` hint byte.
    ///
    /// Unknown values are reported as `None` so the caller can decide how
    /// loudly to complain before falling back to [`NotificationUrgency::Normal`].
    pub fn from_hint(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Low),
            1 => Some(Self::Normal),
            2 => Some(Self::Critical),
            _ => None,
        }
    }
}

impl From<u8> for NotificationUrgency {
    fn from(value: u8) -> Self {
        Self::from_hint(value).unwrap_or_default()
    }
}

impl fmt::Display for NotificationUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Critical => "critical",
        })
    }
}
