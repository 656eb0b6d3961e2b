//! In-memory window system for exercising policy without an X server.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use super::{GrabError, Rect, WindowEvent, WindowSystem};
use crate::rendering::Frame;

#[derive(Debug, Default)]
pub(crate) struct FakeWindow {
    pub monitors: Vec<Rect>,
    pub pointer: Option<(i32, i32)>,
    pub focus: Option<(i32, i32)>,
    pub idle: Option<Duration>,
    /// Fail every idle query
    pub idle_broken: bool,

    /// keysym to keycode
    pub keymap: HashMap<u32, u8>,
    /// Bindings owned by another client
    pub taken: HashSet<(u8, u16)>,
    pub buttons_taken: bool,
    /// Fail every key grab with a non-access protocol error
    pub broken: bool,

    pub grabbed: HashSet<(u8, u16)>,
    pub grab_attempts: Vec<(u8, u16)>,
    pub buttons_grabbed: bool,
    pub mapped: bool,
    pub raised: usize,
    pub moves: Vec<Rect>,
    pub frames: Vec<(u16, u16)>,
    pub events: VecDeque<WindowEvent>,
}

impl FakeWindow {
    pub fn single_head() -> Self {
        Self {
            monitors: vec![Rect::new(0, 0, 1920, 1080)],
            ..Default::default()
        }
    }
}

impl WindowSystem for FakeWindow {
    fn monitors(&mut self) -> anyhow::Result<Vec<Rect>> {
        Ok(self.monitors.clone())
    }

    fn pointer_position(&mut self) -> anyhow::Result<Option<(i32, i32)>> {
        Ok(self.pointer)
    }

    fn focused_window_position(&mut self) -> anyhow::Result<Option<(i32, i32)>> {
        Ok(self.focus)
    }

    fn move_resize(&mut self, rect: Rect) -> anyhow::Result<()> {
        self.moves.push(rect);
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> anyhow::Result<()> {
        self.frames.push((frame.width, frame.height));
        Ok(())
    }

    fn map(&mut self) -> anyhow::Result<()> {
        self.mapped = true;
        Ok(())
    }

    fn unmap(&mut self) -> anyhow::Result<()> {
        self.mapped = false;
        Ok(())
    }

    fn raise(&mut self) -> anyhow::Result<()> {
        self.raised += 1;
        Ok(())
    }

    fn keycode_for(&mut self, keysym: u32) -> Option<u8> {
        self.keymap.get(&keysym).copied()
    }

    fn grab_key(&mut self, keycode: u8, modifiers: u16) -> Result<(), GrabError> {
        self.grab_attempts.push((keycode, modifiers));
        if self.broken {
            return Err(GrabError::Protocol("BadValue".to_string()));
        }
        if self.taken.contains(&(keycode, modifiers)) {
            return Err(GrabError::Access);
        }
        self.grabbed.insert((keycode, modifiers));
        Ok(())
    }

    fn ungrab_key(&mut self, keycode: u8, modifiers: u16) -> anyhow::Result<()> {
        self.grabbed.remove(&(keycode, modifiers));
        Ok(())
    }

    fn grab_buttons(&mut self) -> Result<(), GrabError> {
        if self.buttons_taken {
            return Err(GrabError::Access);
        }
        self.buttons_grabbed = true;
        Ok(())
    }

    fn ungrab_buttons(&mut self) -> anyhow::Result<()> {
        self.buttons_grabbed = false;
        Ok(())
    }

    fn idle_time(&mut self) -> anyhow::Result<Option<Duration>> {
        if self.idle_broken {
            anyhow::bail!("screensaver extension went away");
        }
        Ok(self.idle)
    }

    fn poll_event(&mut self) -> anyhow::Result<Option<WindowEvent>> {
        Ok(self.events.pop_front())
    }
}
