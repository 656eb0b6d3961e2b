use std::os::fd::{AsRawFd, RawFd};
use std::time::Duration;

use anyhow::Context as _;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::errors::ReplyError;
use x11rb::protocol::screensaver::{self, ConnectionExt as _};
use x11rb::protocol::xinerama::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ButtonIndex, ConfigureWindowAux, ConnectionExt as _, CreateGCAux,
    CreateWindowAux, EventMask, Gcontext, GrabMode, ImageFormat, ModMask, PropMode, StackMode,
    Visibility, Window, WindowClass,
};
use x11rb::protocol::{ErrorKind, Event};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::{GrabError, Rect, WindowEvent, WindowSystem};
use crate::constants::{INITIAL_WINDOW_SIZE, WINDOW_CLASS};
use crate::rendering::Frame;

// Fixed part of a PutImage request
const PUT_IMAGE_HEADER: usize = 24;

/// The popup window on an X server.
pub struct X11Backend {
    conn: RustConnection,
    root: Window,
    window: Window,
    gc: Gcontext,
    depth: u8,
    screen: Rect,
    net_active_window: Atom,
    has_xinerama: bool,
    has_screensaver: bool,
    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<u32>,
}

impl X11Backend {
    /// Connect to `$DISPLAY` and create the (unmapped) popup window.
    pub fn connect(transparency: u8) -> anyhow::Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Cannot open display")?;
        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .context("Display has no default screen")?;
        let root = screen.root;
        let depth = screen.root_depth;
        let visual = screen.root_visual;
        let black = screen.black_pixel;
        let screen_rect = Rect::new(
            0,
            0,
            screen.width_in_pixels.into(),
            screen.height_in_pixels.into(),
        );

        let window = conn.generate_id()?;
        conn.create_window(
            depth,
            window,
            root,
            0,
            0,
            INITIAL_WINDOW_SIZE,
            INITIAL_WINDOW_SIZE,
            0,
            WindowClass::INPUT_OUTPUT,
            visual,
            &CreateWindowAux::new()
                .override_redirect(1u32)
                .background_pixel(black)
                .event_mask(
                    EventMask::EXPOSURE
                        | EventMask::KEY_PRESS
                        | EventMask::VISIBILITY_CHANGE
                        | EventMask::BUTTON_PRESS,
                ),
        )?
        .check()
        .context("Cannot create window")?;

        conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            WINDOW_CLASS,
        )?;

        let opacity_atom = conn.intern_atom(false, b"_NET_WM_WINDOW_OPACITY")?.reply()?.atom;
        let opacity = (f64::from(100 - transparency.min(100)) / 100.0 * f64::from(u32::MAX)) as u32;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            opacity_atom,
            AtomEnum::CARDINAL,
            &[opacity],
        )?;

        let gc = conn.generate_id()?;
        conn.create_gc(gc, window, &CreateGCAux::new())?;

        let net_active_window = conn.intern_atom(false, b"_NET_ACTIVE_WINDOW")?.reply()?.atom;

        let has_xinerama = conn
            .extension_information(xinerama::X11_EXTENSION_NAME)?
            .is_some()
            && conn.xinerama_is_active()?.reply()?.state != 0;
        let has_screensaver = conn
            .extension_information(screensaver::X11_EXTENSION_NAME)?
            .is_some();
        if !has_screensaver {
            tracing::info!("No MIT-SCREEN-SAVER extension, idle detection disabled");
        }

        conn.flush()?;

        let mut backend = Self {
            conn,
            root,
            window,
            gc,
            depth,
            screen: screen_rect,
            net_active_window,
            has_xinerama,
            has_screensaver,
            min_keycode: 0,
            keysyms_per_keycode: 0,
            keysyms: Vec::new(),
        };
        backend.refresh_keyboard_mapping()?;
        Ok(backend)
    }

    /// The connection socket, readable when events are pending.
    pub fn raw_fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }

    fn refresh_keyboard_mapping(&mut self) -> anyhow::Result<()> {
        let setup = self.conn.setup();
        let min = setup.min_keycode;
        let count = setup.max_keycode - min + 1;
        let mapping = self.conn.get_keyboard_mapping(min, count)?.reply()?;
        self.min_keycode = min;
        self.keysyms_per_keycode = mapping.keysyms_per_keycode;
        self.keysyms = mapping.keysyms;
        Ok(())
    }

    fn keysym_at(&self, keycode: u8) -> u32 {
        let per = usize::from(self.keysyms_per_keycode);
        let Some(offset) = keycode.checked_sub(self.min_keycode) else {
            return 0;
        };
        self.keysyms
            .get(usize::from(offset) * per)
            .copied()
            .unwrap_or(0)
    }

    fn translate(&mut self, event: Event) -> Option<WindowEvent> {
        match event {
            Event::Expose(e) if e.count == 0 => Some(WindowEvent::Expose),
            Event::VisibilityNotify(e) => Some(WindowEvent::VisibilityChange {
                obscured: e.state != Visibility::UNOBSCURED,
            }),
            Event::ButtonPress(e) if e.event == self.window => Some(WindowEvent::ButtonPress {
                button: e.detail,
                x: e.event_x.into(),
                y: e.event_y.into(),
            }),
            Event::KeyPress(e) => Some(WindowEvent::KeyPress {
                keysym: self.keysym_at(e.detail),
                state: u16::from(e.state),
            }),
            Event::SelectionNotify(_) => Some(WindowEvent::SelectionNotify),
            Event::MappingNotify(_) => {
                if let Err(err) = self.refresh_keyboard_mapping() {
                    tracing::warn!("Failed to refresh keyboard mapping: {}", err);
                }
                None
            }
            Event::Error(e) => {
                tracing::warn!("X11 error: {:?}", e);
                None
            }
            _ => None,
        }
    }
}

fn grab_error(err: ReplyError) -> GrabError {
    match err {
        ReplyError::X11Error(e) if e.error_kind == ErrorKind::Access => GrabError::Access,
        ReplyError::X11Error(e) => GrabError::Protocol(format!("{:?}", e.error_kind)),
        ReplyError::ConnectionError(e) => GrabError::Protocol(e.to_string()),
    }
}

impl WindowSystem for X11Backend {
    fn monitors(&mut self) -> anyhow::Result<Vec<Rect>> {
        if self.has_xinerama {
            let screens = self.conn.xinerama_query_screens()?.reply()?.screen_info;
            if !screens.is_empty() {
                return Ok(screens
                    .iter()
                    .map(|s| {
                        Rect::new(s.x_org.into(), s.y_org.into(), s.width.into(), s.height.into())
                    })
                    .collect());
            }
        }
        Ok(vec![self.screen])
    }

    fn pointer_position(&mut self) -> anyhow::Result<Option<(i32, i32)>> {
        let pointer = self.conn.query_pointer(self.root)?.reply()?;
        Ok(Some((pointer.root_x.into(), pointer.root_y.into())))
    }

    fn focused_window_position(&mut self) -> anyhow::Result<Option<(i32, i32)>> {
        let property = self
            .conn
            .get_property(false, self.root, self.net_active_window, AtomEnum::WINDOW, 0, 1)?
            .reply()?;
        let focused = property
            .value32()
            .and_then(|mut values| values.next())
            .filter(|window| *window != 0);
        let Some(focused) = focused else {
            return Ok(None);
        };

        match self.conn.translate_coordinates(focused, self.root, 0, 0)?.reply() {
            Ok(reply) => Ok(Some((reply.dst_x.into(), reply.dst_y.into()))),
            Err(ReplyError::X11Error(e)) => {
                // The focused window vanished in the meantime
                tracing::debug!("Cannot locate focused window {}: {:?}", focused, e.error_kind);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn move_resize(&mut self, rect: Rect) -> anyhow::Result<()> {
        self.conn.configure_window(
            self.window,
            &ConfigureWindowAux::new()
                .x(rect.x)
                .y(rect.y)
                .width(rect.width.max(1) as u32)
                .height(rect.height.max(1) as u32),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> anyhow::Result<()> {
        let row_bytes = usize::from(frame.width) * 4;
        if row_bytes == 0 || frame.data.is_empty() {
            return Ok(());
        }

        // Split so no request exceeds the server's limit
        let max_bytes = self
            .conn
            .maximum_request_bytes()
            .saturating_sub(PUT_IMAGE_HEADER);
        let rows_per_request = (max_bytes / row_bytes).clamp(1, usize::from(frame.height).max(1));

        for (i, chunk) in frame.data.chunks(rows_per_request * row_bytes).enumerate() {
            let rows = u16::try_from(chunk.len() / row_bytes)?;
            let y = i16::try_from(i * rows_per_request)?;
            self.conn.put_image(
                ImageFormat::Z_PIXMAP,
                self.window,
                self.gc,
                frame.width,
                rows,
                0,
                y,
                0,
                self.depth,
                chunk,
            )?;
        }
        self.conn.flush()?;
        Ok(())
    }

    fn map(&mut self) -> anyhow::Result<()> {
        self.conn.map_window(self.window)?;
        self.raise()
    }

    fn unmap(&mut self) -> anyhow::Result<()> {
        self.conn.unmap_window(self.window)?;
        self.conn.flush()?;
        Ok(())
    }

    fn raise(&mut self) -> anyhow::Result<()> {
        self.conn.configure_window(
            self.window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn keycode_for(&mut self, keysym: u32) -> Option<u8> {
        let per = usize::from(self.keysyms_per_keycode);
        if per == 0 {
            return None;
        }
        self.keysyms
            .chunks(per)
            .position(|syms| syms.iter().take(2).any(|sym| *sym == keysym))
            .and_then(|index| u8::try_from(index).ok())
            .and_then(|index| self.min_keycode.checked_add(index))
    }

    fn grab_key(&mut self, keycode: u8, modifiers: u16) -> Result<(), GrabError> {
        self.conn
            .grab_key(
                true,
                self.root,
                ModMask::from(modifiers),
                keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )
            .map_err(|e| GrabError::Protocol(e.to_string()))?
            .check()
            .map_err(grab_error)
    }

    fn ungrab_key(&mut self, keycode: u8, modifiers: u16) -> anyhow::Result<()> {
        self.conn
            .ungrab_key(keycode, self.root, ModMask::from(modifiers))?;
        Ok(())
    }

    fn grab_buttons(&mut self) -> Result<(), GrabError> {
        self.conn
            .grab_button(
                false,
                self.window,
                EventMask::BUTTON_PRESS,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                ButtonIndex::ANY,
                ModMask::ANY,
            )
            .map_err(|e| GrabError::Protocol(e.to_string()))?
            .check()
            .map_err(grab_error)
    }

    fn ungrab_buttons(&mut self) -> anyhow::Result<()> {
        self.conn
            .ungrab_button(ButtonIndex::ANY, self.window, ModMask::ANY)?;
        Ok(())
    }

    fn idle_time(&mut self) -> anyhow::Result<Option<Duration>> {
        if !self.has_screensaver {
            return Ok(None);
        }
        let info = self.conn.screensaver_query_info(self.root)?.reply()?;
        Ok(Some(Duration::from_millis(info.ms_since_user_input.into())))
    }

    fn poll_event(&mut self) -> anyhow::Result<Option<WindowEvent>> {
        while let Some(event) = self.conn.poll_for_event()? {
            if let Some(event) = self.translate(event) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}
