use stackd_config::{FollowMode, Geometry, NotificationsConfig};

use super::{Rect, WindowSystem};

/// Picks the monitor and positions the window on it.
///
/// Remembers the last applied rectangle so an unchanged window is never
/// moved twice.
#[derive(Debug, Clone)]
pub struct Placement {
    geometry: Geometry,
    monitor: Option<u32>,
    follow: FollowMode,
    applied: Option<Rect>,
}

impl Placement {
    pub fn new(config: &NotificationsConfig) -> Self {
        Self {
            geometry: config.geometry,
            monitor: config.monitor,
            follow: config.follow,
            applied: None,
        }
    }

    /// The monitor the window belongs on right now.
    pub fn select_monitor(&self, ws: &mut impl WindowSystem) -> anyhow::Result<Rect> {
        let monitors = ws.monitors()?;

        if let Some(index) = self.monitor {
            match monitors.get(index as usize) {
                Some(monitor) => return Ok(*monitor),
                None => tracing::debug!("Monitor {} does not exist", index),
            }
        }

        let point = match self.follow {
            FollowMode::None => None,
            FollowMode::Mouse => ws.pointer_position()?,
            FollowMode::Keyboard => ws.focused_window_position()?,
        };
        Ok(monitor_at(&monitors, point))
    }

    /// Move the window to fit `width` × `height` on the selected monitor.
    ///
    /// Returns whether the window was actually moved or resized.
    #[cfg(test)]
    pub fn apply(
        &mut self,
        ws: &mut impl WindowSystem,
        width: i32,
        height: i32,
    ) -> anyhow::Result<bool> {
        let monitor = self.select_monitor(ws)?;
        self.apply_on(ws, monitor, width, height)
    }

    /// Like [`Placement::apply`] with an already selected monitor.
    pub fn apply_on(
        &mut self,
        ws: &mut impl WindowSystem,
        monitor: Rect,
        width: i32,
        height: i32,
    ) -> anyhow::Result<bool> {
        let rect = position(&self.geometry, monitor, width, height);
        if self.applied == Some(rect) {
            return Ok(false);
        }
        tracing::trace!("Placing window at {:?}", rect);
        ws.move_resize(rect)?;
        self.applied = Some(rect);
        Ok(true)
    }
}

/// First monitor containing `point`, else the first monitor.
fn monitor_at(monitors: &[Rect], point: Option<(i32, i32)>) -> Rect {
    let default = monitors.first().copied().unwrap_or_default();
    point
        .and_then(|(x, y)| monitors.iter().find(|m| m.contains(x, y)).copied())
        .unwrap_or(default)
}

/// Absolute window rectangle for `geometry` on `monitor`.
///
/// A far-anchored offset is measured from the right or bottom edge, the
/// stored offset is already negative.
pub fn position(geometry: &Geometry, monitor: Rect, width: i32, height: i32) -> Rect {
    let x = if geometry.x_negative {
        monitor.x + (monitor.width - width) + geometry.x
    } else {
        monitor.x + geometry.x
    };
    let y = if geometry.y_negative {
        monitor.y + (monitor.height - height) + geometry.y
    } else {
        monitor.y + geometry.y
    };
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::fake::FakeWindow;

    fn config(geometry: &str, monitor: Option<u32>, follow: FollowMode) -> NotificationsConfig {
        NotificationsConfig {
            geometry: geometry.parse().unwrap(),
            monitor,
            follow,
            ..Default::default()
        }
    }

    fn dual_head() -> FakeWindow {
        FakeWindow {
            monitors: vec![Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1280, 1024)],
            ..Default::default()
        }
    }

    #[test]
    fn test_position_anchors() {
        let monitor = Rect::new(100, 50, 1000, 800);
        let g: Geometry = "300x5+10+20".parse().unwrap();
        assert_eq!(position(&g, monitor, 300, 90), Rect::new(110, 70, 300, 90));

        let g: Geometry = "300x5-30-20".parse().unwrap();
        assert_eq!(
            position(&g, monitor, 300, 90),
            Rect::new(100 + 700 - 30, 50 + 710 - 20, 300, 90)
        );

        let g: Geometry = "0x0-0-0".parse().unwrap();
        let r = position(&g, monitor, 200, 100);
        assert_eq!((r.x + r.width, r.y + r.height), (1100, 850), "flush with far corner");
    }

    #[test]
    fn test_fixed_monitor_wins() {
        let mut ws = dual_head();
        ws.pointer = Some((10, 10));
        let placement = Placement::new(&config("300x5+0+0", Some(1), FollowMode::Mouse));
        assert_eq!(placement.select_monitor(&mut ws).unwrap(), ws.monitors[1]);
    }

    #[test]
    fn test_invalid_monitor_index_falls_through() {
        let mut ws = dual_head();
        ws.pointer = Some((2000, 10));
        let placement = Placement::new(&config("300x5+0+0", Some(7), FollowMode::Mouse));
        assert_eq!(placement.select_monitor(&mut ws).unwrap(), ws.monitors[1]);

        let placement = Placement::new(&config("300x5+0+0", Some(7), FollowMode::None));
        assert_eq!(placement.select_monitor(&mut ws).unwrap(), ws.monitors[0]);
    }

    #[test]
    fn test_follow_pointer() {
        let mut ws = dual_head();
        let placement = Placement::new(&config("300x5+0+0", None, FollowMode::Mouse));

        ws.pointer = Some((1920, 500));
        assert_eq!(placement.select_monitor(&mut ws).unwrap(), ws.monitors[1]);

        ws.pointer = Some((5000, 5000));
        assert_eq!(
            placement.select_monitor(&mut ws).unwrap(),
            ws.monitors[0],
            "outside every monitor"
        );
    }

    #[test]
    fn test_follow_focus_without_focus_uses_default() {
        let mut ws = dual_head();
        let placement = Placement::new(&config("300x5+0+0", None, FollowMode::Keyboard));

        ws.focus = Some((2500, 100));
        assert_eq!(placement.select_monitor(&mut ws).unwrap(), ws.monitors[1]);

        ws.focus = None;
        assert_eq!(placement.select_monitor(&mut ws).unwrap(), ws.monitors[0]);
    }

    #[test]
    fn test_unchanged_placement_not_reapplied() {
        let mut ws = dual_head();
        let mut placement = Placement::new(&config("300x5-30+20", None, FollowMode::None));

        assert!(placement.apply(&mut ws, 300, 109).unwrap());
        assert!(!placement.apply(&mut ws, 300, 109).unwrap());
        assert_eq!(ws.moves, vec![Rect::new(1920 - 300 - 30, 20, 300, 109)]);

        assert!(placement.apply(&mut ws, 300, 60).unwrap());
        assert_eq!(ws.moves.len(), 2);
    }

    #[test]
    fn test_monitor_change_moves_window() {
        let mut ws = dual_head();
        let mut placement = Placement::new(&config("300x5+0+0", None, FollowMode::Mouse));

        ws.pointer = Some((10, 10));
        placement.apply(&mut ws, 300, 100).unwrap();
        ws.pointer = Some((3000, 10));
        assert!(placement.apply(&mut ws, 300, 100).unwrap());
        assert_eq!(ws.moves.last().map(|r| r.x), Some(1920));
    }
}
