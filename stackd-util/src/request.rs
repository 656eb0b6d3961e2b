use crate::{Hint, NotificationAction};

/// A validated `Notify` call.
///
/// Built once from the raw protocol arguments so the rest of the daemon
/// never looks at positional wire data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyRequest {
    pub app_name: String,
    /// `0` means "do not replace".
    pub replaces_id: u32,
    pub app_icon: String,
    pub summary: String,
    pub body: String,
    pub actions: Vec<NotificationAction>,
    pub hints: Vec<Hint>,
    pub expire_timeout: i32,
    /// Unique bus name of the caller.
    pub client: Option<String>,
}

impl NotifyRequest {
    /// The id to replace, if the caller asked for one.
    pub fn replaces(&self) -> Option<u32> {
        (self.replaces_id != 0).then_some(self.replaces_id)
    }
}

#[cfg(feature = "zbus_notifications")]
mod dbus {
    use super::NotifyRequest;
    use crate::{DecodeError, Hint, parse_actions};
    use std::collections::HashMap;
    use zbus::zvariant::Value;

    impl NotifyRequest {
        /// Decode the arguments of `org.freedesktop.Notifications.Notify`.
        ///
        /// The bus has already checked the signature; this validates the
        /// content. Hints of an unexpected type are skipped with a warning,
        /// an unpaired action key rejects the whole call.
        #[allow(clippy::too_many_arguments)]
        pub fn from_dbus(
            app_name: &str,
            replaces_id: u32,
            app_icon: &str,
            summary: &str,
            body: &str,
            actions: &[&str],
            hints: HashMap<&str, Value<'_>>,
            expire_timeout: i32,
            client: Option<&str>,
        ) -> Result<Self, DecodeError> {
            Ok(NotifyRequest {
                app_name: app_name.to_string(),
                replaces_id,
                app_icon: app_icon.to_string(),
                summary: summary.to_string(),
                body: body.to_string(),
                actions: parse_actions(actions)?,
                hints: decode_hints(hints),
                expire_timeout,
                client: client.map(str::to_string),
            })
        }
    }

    pub(super) fn decode_hints(hints: HashMap<&str, Value<'_>>) -> Vec<Hint> {
        let mut decoded: Vec<Hint> = hints
            .into_iter()
            .filter_map(|(k, v)| {
                let hint = match (k, &v) {
                    ("fgcolor", Value::Str(s)) => Some(Hint::FgColor(s.to_string())),
                    ("bgcolor", Value::Str(s)) => Some(Hint::BgColor(s.to_string())),
                    ("urgency", Value::U8(u)) => Some(Hint::Urgency(*u)),
                    ("value", Value::I32(v)) => Some(Hint::Value(*v)),
                    ("value", Value::U32(v)) => i32::try_from(*v).ok().map(Hint::Value),
                    ("fgcolor" | "bgcolor" | "urgency" | "value", _) => {
                        tracing::warn!("Invalid value for hint {}: {:?}", k, v);
                        return None;
                    }
                    _ => {
                        tracing::debug!("Unsupported hint: {}", k);
                        return None;
                    }
                };
                if let Some(Hint::Urgency(u)) = hint {
                    if crate::NotificationUrgency::from_hint(u).is_none() {
                        tracing::warn!("Unknown urgency {}, treating as normal", u);
                    }
                }
                hint
            })
            .collect();

        // HashMap iteration order is random, keep the result stable.
        decoded.sort_by_key(hint_rank);
        decoded
    }

    fn hint_rank(hint: &Hint) -> u8 {
        match hint {
            Hint::Urgency(_) => 0,
            Hint::FgColor(_) => 1,
            Hint::BgColor(_) => 2,
            Hint::Value(_) => 3,
        }
    }
}
