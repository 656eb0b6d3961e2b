pub mod draw;
pub mod layout;

pub use draw::PangoRenderer;
pub use layout::{Layout, LayoutConfig, TextMeasure};

use stackd_util::Notification;

/// A drawn window image: 32-bit pixels in the native byte order of
/// cairo's ARGB32 format, premultiplied alpha.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

/// Paints a computed layout.
pub trait Renderer: TextMeasure {
    fn draw(&mut self, layout: &Layout, notifications: &[Notification]) -> anyhow::Result<Frame>;
}
