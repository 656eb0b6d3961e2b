//! Stacking layout: turns the displayed notifications into window geometry.
//!
//! Every block is `text height + 2 × padding` tall and blocks are separated
//! by `separator_height`. The frame is painted around the whole stack, so it
//! eats into the outer edge of the first and last block only.

use stackd_config::NotificationsConfig;
use stackd_util::{Notification, render_text};

use crate::window::Rect;

/// Measures laid out text.
pub trait TextMeasure {
    /// Pixel size of `text`, wrapped at `wrap_width` when given.
    fn text_size(&mut self, text: &str, wrap_width: Option<i32>) -> (i32, i32);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConfig {
    pub format: String,
    pub allow_markup: bool,
    pub padding: i32,
    pub horizontal_padding: i32,
    pub frame_width: i32,
    pub separator_height: i32,
    /// Fixed window width, `None` sizes to the widest text.
    pub width: Option<i32>,
}

impl LayoutConfig {
    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self {
            format: config.format.clone(),
            allow_markup: config.allow_markup,
            padding: config.padding,
            horizontal_padding: config.horizontal_padding,
            frame_width: config.frame_width,
            separator_height: config.separator_height,
            width: (config.geometry.width > 0).then(|| config.geometry.width as i32),
        }
    }

    /// Width available to text inside a fixed-width window.
    fn wrap_width(&self) -> Option<i32> {
        self.width
            .map(|w| (w - 2 * self.horizontal_padding - 2 * self.frame_width).max(1))
    }
}

/// One notification's slot in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub id: u32,
    /// Top of the slot, relative to the window.
    pub y: i32,
    /// Text height plus vertical padding.
    pub height: i32,
    pub text_height: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub width: i32,
    pub height: i32,
    pub frame_width: i32,
    pub padding: i32,
    pub horizontal_padding: i32,
    pub separator_height: i32,
    /// Text wrap width of a fixed-width window.
    pub wrap_width: Option<i32>,
    pub blocks: Vec<Block>,
}

impl Layout {
    /// Lay out `notifications` top to bottom.
    ///
    /// Fills in the display text of notifications that have none yet and
    /// stores each block height on its notification.
    pub fn compute(
        notifications: &mut [Notification],
        config: &LayoutConfig,
        measure: &mut impl TextMeasure,
    ) -> Layout {
        let wrap_width = config.wrap_width();
        let mut blocks = Vec::with_capacity(notifications.len());
        let mut text_width = 0;
        let mut y = 0;

        for (i, n) in notifications.iter_mut().enumerate() {
            if n.text.is_empty() {
                n.text = render_text(&config.format, n, config.allow_markup);
            }
            let (w, h) = measure.text_size(&n.text, wrap_width);
            let h = h.max(0);
            text_width = text_width.max(w);

            n.height = h + 2 * config.padding;
            if i > 0 {
                y += config.separator_height;
            }
            blocks.push(Block {
                id: n.id,
                y,
                height: n.height,
                text_height: h,
            });
            y += n.height;
        }

        let width = config.width.unwrap_or(
            text_width + 2 * config.horizontal_padding + 2 * config.frame_width,
        );

        Layout {
            width,
            height: y,
            frame_width: config.frame_width,
            padding: config.padding,
            horizontal_padding: config.horizontal_padding,
            separator_height: config.separator_height,
            wrap_width,
            blocks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Shrink the window to at most `max_width` × `max_height`.
    ///
    /// Blocks that start below the new bottom edge are dropped and the
    /// last kept block is cut at it. Returns whether anything changed.
    pub fn clip(&mut self, max_width: i32, max_height: i32) -> bool {
        let max_width = max_width.max(1);
        let max_height = max_height.max(1);
        if self.width <= max_width && self.height <= max_height {
            return false;
        }

        self.width = self.width.min(max_width);
        if self.height > max_height {
            self.height = max_height;
            self.blocks.retain(|block| block.y < max_height);
            if let Some(last) = self.blocks.last_mut() {
                last.height = last.height.min(max_height - last.y);
            }
        }
        true
    }

    /// Height of the stack inside the frame.
    pub fn inner_height(&self) -> i32 {
        (self.height - 2 * self.frame_width).max(0)
    }

    /// Background rectangle of block `index`, inset by the frame on the
    /// sides and on the outer edges of the stack.
    pub fn background(&self, index: usize) -> Option<Rect> {
        let block = self.blocks.get(index)?;
        let first = index == 0;
        let last = index + 1 == self.blocks.len();

        let mut rect = Rect {
            x: self.frame_width,
            y: block.y,
            width: self.width - 2 * self.frame_width,
            height: block.height,
        };
        if first {
            rect.y += self.frame_width;
            rect.height -= self.frame_width;
        }
        if last {
            rect.height -= self.frame_width;
        }
        Some(rect)
    }

    /// Width available to text between the horizontal paddings.
    pub fn text_area_width(&self) -> i32 {
        (self.width - 2 * self.horizontal_padding - 2 * self.frame_width).max(0)
    }

    /// Where the text of block `index` starts.
    pub fn text_origin(&self, index: usize) -> Option<(i32, i32)> {
        let block = self.blocks.get(index)?;
        Some((
            self.frame_width + self.horizontal_padding,
            block.y + self.padding,
        ))
    }

    /// Vertical centre line of the separator below block `index`.
    pub fn separator_y(&self, index: usize) -> Option<i32> {
        if self.separator_height <= 0 || index + 1 >= self.blocks.len() {
            return None;
        }
        let block = self.blocks.get(index)?;
        Some(block.y + block.height + self.separator_height / 2)
    }

    /// The notification under window coordinate `y`.
    ///
    /// A slot covers its block and the separator below it, the frame
    /// border belongs to the adjacent block.
    pub fn hit_test(&self, y: i32) -> Option<u32> {
        if y < 0 || y >= self.height {
            return None;
        }
        self.blocks
            .iter()
            .rev()
            .find(|block| y >= block.y)
            .map(|block| block.id)
    }
}
