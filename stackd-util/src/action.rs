use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt, str::FromStr};

use crate::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionId {
    Default,
    Custom(String),
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionId::Default => write!(f, "default"),
            ActionId::Custom(value) => write!(f, "{}", value),
        }
    }
}

impl FromStr for ActionId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "default" => ActionId::Default,
            s => ActionId::Custom(s.to_string()),
        })
    }
}

/// A caller-defined action attached to a notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NotificationAction {
    /// Key sent back in `ActionInvoked`
    pub id: ActionId,
    /// User-visible label
    pub label: String,
}

/// Parse the D-Bus action array (alternating key/label pairs).
///
/// DBus format: ["id1", "label1", "id2", "label2", ...]
///
/// Keys are deduplicated, first occurrence wins, and the original order is
/// kept. An unpaired trailing key is a malformed request.
pub fn parse_actions(raw_actions: &[&str]) -> Result<Vec<NotificationAction>, DecodeError> {
    if raw_actions.len() % 2 != 0 {
        return Err(DecodeError::UnpairedAction(
            raw_actions.last().copied().unwrap_or_default().to_string(),
        ));
    }

    let mut actions: Vec<NotificationAction> = Vec::with_capacity(raw_actions.len() / 2);
    for pair in raw_actions.chunks_exact(2) {
        let Ok(id) = pair[0].parse::<ActionId>();
        if actions.iter().any(|a| a.id == id) {
            tracing::debug!("Dropping duplicate action key {}", id);
            continue;
        }
        actions.push(NotificationAction {
            id,
            label: pair[1].to_string(),
        });
    }

    Ok(actions)
}
