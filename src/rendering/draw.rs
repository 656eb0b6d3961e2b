use anyhow::Context as _;
use cairo::{Context as CairoContext, Format, ImageSurface};
use pangocairo::functions as pangocairo;
use stackd_config::{Alignment, NotificationsConfig, UrgencyStyle};
use stackd_util::{Color, Notification, NotificationUrgency};

use super::{Frame, Layout, Renderer, TextMeasure};

/// Cairo/pango renderer drawing into an in-memory ARGB32 surface.
pub struct PangoRenderer {
    font: pango::FontDescription,
    alignment: Alignment,
    word_wrap: bool,
    line_height: i32,
    markup: bool,
    frame_color: Color,
    separator_color: Color,
    low: UrgencyStyle,
    normal: UrgencyStyle,
    critical: UrgencyStyle,
    // 1x1 scratch surface for measuring
    scratch: CairoContext,
}

impl PangoRenderer {
    pub fn new(config: &NotificationsConfig) -> anyhow::Result<Self> {
        let surface = ImageSurface::create(Format::ARgb32, 1, 1)?;
        let scratch = CairoContext::new(&surface)?;

        Ok(Self {
            font: pango::FontDescription::from_string(&config.font),
            alignment: config.alignment,
            word_wrap: config.word_wrap,
            line_height: config.line_height,
            markup: config.allow_markup,
            frame_color: config.frame_color(),
            separator_color: config.separator_color(),
            low: config.urgency_style(NotificationUrgency::Low)?,
            normal: config.urgency_style(NotificationUrgency::Normal)?,
            critical: config.urgency_style(NotificationUrgency::Critical)?,
            scratch,
        })
    }

    fn text_layout(&self, cr: &CairoContext, text: &str, wrap_width: Option<i32>) -> pango::Layout {
        let layout = pangocairo::create_layout(cr);
        layout.set_font_description(Some(&self.font));
        layout.set_spacing(self.line_height * pango::SCALE);

        if let Some(width) = wrap_width {
            layout.set_width(width * pango::SCALE);
            layout.set_alignment(match self.alignment {
                Alignment::Left => pango::Alignment::Left,
                Alignment::Center => pango::Alignment::Center,
                Alignment::Right => pango::Alignment::Right,
            });
            if self.word_wrap {
                layout.set_wrap(pango::WrapMode::WordChar);
            } else {
                layout.set_ellipsize(pango::EllipsizeMode::End);
            }
        }

        if self.markup {
            layout.set_markup(text);
        } else {
            layout.set_text(text);
        }
        layout
    }

    fn colors(&self, notification: &Notification) -> (Color, Color) {
        let style = match notification.urgency() {
            NotificationUrgency::Low => &self.low,
            NotificationUrgency::Normal => &self.normal,
            NotificationUrgency::Critical => &self.critical,
        };
        let hint = |value: Option<&str>, fallback: Color| match value.map(str::parse::<Color>) {
            Some(Ok(color)) => color,
            Some(Err(err)) => {
                tracing::debug!("Notification {}: {}", notification.id, err);
                fallback
            }
            None => fallback,
        };
        (
            hint(notification.fg_color(), style.foreground),
            hint(notification.bg_color(), style.background),
        )
    }

    /// Horizontal offset of unwrapped text inside the text area.
    fn align_offset(&self, area_width: i32, text_width: i32) -> i32 {
        let slack = (area_width - text_width).max(0);
        match self.alignment {
            Alignment::Left => 0,
            Alignment::Center => slack / 2,
            Alignment::Right => slack,
        }
    }
}

fn set_color(cr: &CairoContext, color: Color) {
    cr.set_source_rgba(color.r, color.g, color.b, color.a);
}

impl TextMeasure for PangoRenderer {
    fn text_size(&mut self, text: &str, wrap_width: Option<i32>) -> (i32, i32) {
        self.text_layout(&self.scratch, text, wrap_width).pixel_size()
    }
}

impl Renderer for PangoRenderer {
    fn draw(&mut self, layout: &Layout, notifications: &[Notification]) -> anyhow::Result<Frame> {
        let width = u16::try_from(layout.width.max(1)).context("window too wide")?;
        let height = u16::try_from(layout.height.max(1)).context("window too tall")?;

        let mut surface = ImageSurface::create(Format::ARgb32, width.into(), height.into())?;
        {
            let cr = CairoContext::new(&surface)?;

            // The frame is whatever the block backgrounds leave uncovered
            set_color(&cr, self.frame_color);
            cr.paint()?;

            for (i, n) in notifications.iter().enumerate() {
                let (Some(bg), Some((x, y))) = (layout.background(i), layout.text_origin(i)) else {
                    break;
                };
                let (fg_color, bg_color) = self.colors(n);

                set_color(&cr, bg_color);
                cr.rectangle(bg.x.into(), bg.y.into(), bg.width.into(), bg.height.into());
                cr.fill()?;

                let text = self.text_layout(&cr, &n.text, layout.wrap_width);
                let x = match layout.wrap_width {
                    Some(_) => x,
                    None => x + self.align_offset(layout.text_area_width(), text.pixel_size().0),
                };
                set_color(&cr, fg_color);
                cr.move_to(x.into(), y.into());
                pangocairo::show_layout(&cr, &text);

                if let Some(sep_y) = layout.separator_y(i) {
                    set_color(&cr, self.separator_color);
                    cr.set_line_width(layout.separator_height.into());
                    cr.move_to(0.0, sep_y.into());
                    cr.line_to(layout.width.into(), sep_y.into());
                    cr.stroke()?;
                }
            }
        }
        surface.flush();

        let stride = usize::try_from(surface.stride())?;
        let row = usize::from(width) * 4;
        let data = surface.data()?;
        let mut pixels = Vec::with_capacity(row * usize::from(height));
        for line in data.chunks(stride).take(height.into()) {
            pixels.extend_from_slice(&line[..row]);
        }

        Ok(Frame {
            width,
            height,
            data: pixels,
        })
    }
}
