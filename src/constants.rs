// Centralizes magic numbers used by the reactor and the X11 backend

use std::time::Duration;

// ============================================================================
// Reactor Constants
// ============================================================================

/// Period of the timeout and idle scan
pub(crate) const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Buffer size for the protocol-to-reactor channel
pub(crate) const CHANNEL_BUFFER_SIZE: usize = 100;

/// Initial capacity for the displayed notifications vector
pub(crate) const INITIAL_CARDS_CAPACITY: usize = 16;

// ============================================================================
// Protocol Constants
// ============================================================================

pub(crate) const DBUS_NAME: &str = "org.freedesktop.Notifications";

pub(crate) const DBUS_PATH: &str = "/org/freedesktop/Notifications";

// ============================================================================
// Window Constants
// ============================================================================

/// Size of the window before the first layout
pub(crate) const INITIAL_WINDOW_SIZE: u16 = 1;

/// Largest window edge, image rows are addressed with an `i16`
pub(crate) const MAX_WINDOW_SIZE: i32 = i16::MAX as i32;

/// X11 window class, instance and class parts
pub(crate) const WINDOW_CLASS: &[u8] = b"stackd\0Stackd\0";
