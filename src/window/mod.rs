pub mod placement;
pub mod x11;

#[cfg(test)]
pub(crate) mod fake;

pub use placement::Placement;
pub use x11::X11Backend;

use std::time::Duration;

use crate::rendering::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Window system events the daemon reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    Expose,
    VisibilityChange { obscured: bool },
    ButtonPress { button: u8, x: i32, y: i32 },
    /// `keysym` is taken from the first column of the keyboard mapping.
    KeyPress { keysym: u32, state: u16 },
    SelectionNotify,
}

/// Failure of a key or button grab.
#[derive(Debug, thiserror::Error)]
pub enum GrabError {
    /// Another client owns the binding.
    #[error("binding is already grabbed by another client")]
    Access,
    #[error("X protocol failure: {0}")]
    Protocol(String),
}

/// Everything the reactor needs from the window system.
pub trait WindowSystem {
    /// Xinerama heads, or the whole screen when there are none.
    fn monitors(&mut self) -> anyhow::Result<Vec<Rect>>;
    fn pointer_position(&mut self) -> anyhow::Result<Option<(i32, i32)>>;
    /// Root coordinates of the focused window, if any.
    fn focused_window_position(&mut self) -> anyhow::Result<Option<(i32, i32)>>;

    fn move_resize(&mut self, rect: Rect) -> anyhow::Result<()>;
    fn present(&mut self, frame: &Frame) -> anyhow::Result<()>;
    fn map(&mut self) -> anyhow::Result<()>;
    fn unmap(&mut self) -> anyhow::Result<()>;
    fn raise(&mut self) -> anyhow::Result<()>;

    /// Hardware keycode producing `keysym` in the first two columns.
    fn keycode_for(&mut self, keysym: u32) -> Option<u8>;
    fn grab_key(&mut self, keycode: u8, modifiers: u16) -> Result<(), GrabError>;
    fn ungrab_key(&mut self, keycode: u8, modifiers: u16) -> anyhow::Result<()>;
    fn grab_buttons(&mut self) -> Result<(), GrabError>;
    fn ungrab_buttons(&mut self) -> anyhow::Result<()>;

    /// Time since the last user input.
    fn idle_time(&mut self) -> anyhow::Result<Option<Duration>>;

    fn poll_event(&mut self) -> anyhow::Result<Option<WindowEvent>>;
}
