// The reactor: one thread owns the queue, the window and the grabs.
//
// Protocol calls, window system events and the periodic tick are
// multiplexed by `run`. Every state change goes through `Notifyd`, which
// recomputes layout and placement and redraws synchronously. Outbound
// signals and chooser requests are collected on `Notifyd` and flushed by
// `run` after each dispatch.

use crate::constants::{DBUS_NAME, MAX_WINDOW_SIZE, TICK_INTERVAL};
use crate::handlers::{Action, MenuEntry, ShortcutManager, action_for_button, context_menu};
use crate::rendering::{Layout, LayoutConfig, PangoRenderer, Renderer};
use crate::state::notifications::{NotificationState, QueuePolicy};
use crate::subscriptions::notifications::{Conns, Input};
use crate::window::{Placement, WindowEvent, WindowSystem, X11Backend};
use anyhow::Context;
use futures_util::StreamExt;
use stackd_config::NotificationsConfig;
use stackd_util::{CloseReason, NotifyRequest};
use std::time::{Duration, Instant};
use tokio::io::unix::AsyncFd;
use tokio::sync::mpsc::Sender;

/// Outbound protocol signals, addressed to the notification's caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Closed {
        id: u32,
        reason: CloseReason,
        client: Option<String>,
    },
    ActionInvoked {
        id: u32,
        key: String,
        client: Option<String>,
    },
}

pub struct Notifyd<W: WindowSystem, R: Renderer> {
    ws: W,
    renderer: R,
    state: NotificationState,
    layout_config: LayoutConfig,
    layout: Layout,
    placement: Placement,
    shortcuts: ShortcutManager,
    idle_threshold: Option<Duration>,
    visible: bool,
    signals: Vec<Signal>,
    menu: Option<Vec<MenuEntry>>,
}

impl<W: WindowSystem, R: Renderer> Notifyd<W, R> {
    /// Set up the reactor core. Shortcut setup failures other than
    /// conflicting grabs are fatal.
    pub fn new(mut ws: W, renderer: R, config: &NotificationsConfig) -> anyhow::Result<Self> {
        let mut shortcuts = ShortcutManager::new(&config.shortcuts);
        shortcuts
            .setup(&mut ws)
            .context("Failed to set up keyboard shortcuts")?;

        Ok(Self {
            ws,
            renderer,
            state: NotificationState::new(QueuePolicy::from_config(config)),
            layout_config: LayoutConfig::from_config(config),
            layout: Layout::default(),
            placement: Placement::new(config),
            shortcuts,
            idle_threshold: config.idle_threshold(),
            visible: false,
            signals: Vec::new(),
            menu: None,
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> &NotificationState {
        &self.state
    }

    #[cfg(test)]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn handle_input(&mut self, input: Input, now: Instant) -> anyhow::Result<()> {
        match input {
            Input::Notify { request, reply } => {
                let id = self.notify(request, now);
                if reply.send(id).is_err() {
                    tracing::debug!("Caller of notification {} went away", id);
                }
                self.refresh(now)
            }
            Input::CloseNotification(id) => self.close_notification(id, now),
            Input::ActionInvoked { id, key } => self.invoke_action(id, &key, now),
        }
    }

    /// Accept a notification. The id is known before anything is drawn.
    pub fn notify(&mut self, request: NotifyRequest, now: Instant) -> u32 {
        tracing::debug!(
            "Notification from {:?}: {:?}",
            request.app_name,
            request.summary
        );
        self.state.enqueue_or_replace(request, now)
    }

    pub fn close_notification(&mut self, id: u32, now: Instant) -> anyhow::Result<()> {
        if !self.state.close(id, CloseReason::CloseNotification) {
            tracing::debug!("CloseNotification for unknown id {}", id);
        }
        self.refresh(now)
    }

    /// Report a chosen action to the caller and dismiss its notification.
    pub fn invoke_action(&mut self, id: u32, key: &str, now: Instant) -> anyhow::Result<()> {
        let Some(n) = self.state.get(id) else {
            tracing::debug!("Action {:?} chosen for closed notification {}", key, id);
            return Ok(());
        };
        self.signals.push(Signal::ActionInvoked {
            id,
            key: key.to_string(),
            client: n.client.clone(),
        });
        self.state.close(id, CloseReason::Dismissed);
        self.refresh(now)
    }

    pub fn handle_window_event(&mut self, event: WindowEvent, now: Instant) -> anyhow::Result<()> {
        tracing::trace!("Window event {:?}", event);
        match event {
            WindowEvent::Expose => {
                if self.visible {
                    self.redraw();
                }
                Ok(())
            }
            WindowEvent::VisibilityChange { obscured: true } if self.visible => self.ws.raise(),
            WindowEvent::VisibilityChange { .. } => Ok(()),
            WindowEvent::ButtonPress { button, y, .. } => {
                match action_for_button(button, y, &self.layout) {
                    Some(action) => self.apply(action, now),
                    None => Ok(()),
                }
            }
            WindowEvent::KeyPress { keysym, state } => {
                match self.shortcuts.action_for_key(keysym, state) {
                    Some(action) => self.apply(action, now),
                    None => Ok(()),
                }
            }
            WindowEvent::SelectionNotify => Ok(()),
        }
    }

    /// Handle every window system event that is already queued.
    pub fn drain_window_events(&mut self, now: Instant) -> anyhow::Result<()> {
        while let Some(event) = self.ws.poll_event()? {
            self.handle_window_event(event, now)?;
        }
        Ok(())
    }

    pub fn apply(&mut self, action: Action, now: Instant) -> anyhow::Result<()> {
        tracing::debug!("User action {:?}", action);
        match action {
            Action::CloseTop => {
                if let Some(id) = self.state.displayed().first().map(|n| n.id) {
                    self.state.close(id, CloseReason::Dismissed);
                }
            }
            Action::CloseAll => self.state.close_all(CloseReason::Dismissed),
            Action::HistoryPop => {
                if self.state.pop_history(now).is_none() {
                    tracing::debug!("History is empty");
                }
            }
            Action::ContextMenu => {
                let entries = context_menu::menu_entries(self.state.displayed());
                if entries.is_empty() {
                    tracing::debug!("No actions to offer");
                } else {
                    self.menu = Some(entries);
                }
            }
            Action::Dismiss(id) => {
                self.state.close(id, CloseReason::Dismissed);
            }
        }
        self.refresh(now)
    }

    /// Whether the user has been inactive for longer than the threshold.
    pub fn is_idle(&mut self) -> bool {
        let Some(threshold) = self.idle_threshold else {
            return false;
        };
        match self.ws.idle_time() {
            Ok(idle) => idle.is_some_and(|idle| idle >= threshold),
            Err(err) => {
                tracing::warn!("Idle query failed, treating user as active: {}", err);
                false
            }
        }
    }

    /// Periodic timeout scan.
    ///
    /// While the user is idle the displayed timers restart on every tick,
    /// so each notification gets its full timeout after they return.
    pub fn tick(&mut self, now: Instant) -> anyhow::Result<()> {
        if self.state.is_empty() {
            return Ok(());
        }
        if self.is_idle() {
            tracing::trace!("User is idle, restarting timeouts");
            self.state.restart_timers(now);
            return Ok(());
        }
        if self.state.expire(now) {
            self.refresh(now)?;
        }
        Ok(())
    }

    pub fn take_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    pub fn take_menu(&mut self) -> Option<Vec<MenuEntry>> {
        self.menu.take()
    }

    /// Fill free slots, collect close signals and bring the window up to date.
    fn refresh(&mut self, now: Instant) -> anyhow::Result<()> {
        self.state.promote(now);
        tracing::trace!(
            "{} displayed, {} waiting, {} in history",
            self.state.displayed().len(),
            self.state.waiting().len(),
            self.state.history().len()
        );
        self.signals
            .extend(self.state.take_closed().into_iter().map(|closed| Signal::Closed {
                id: closed.id,
                reason: closed.reason,
                client: closed.client,
            }));
        self.update_window()
    }

    fn update_window(&mut self) -> anyhow::Result<()> {
        if self.state.is_empty() {
            if self.visible {
                tracing::debug!("Hiding window");
                self.ws.unmap()?;
                self.shortcuts.ungrab_visible(&mut self.ws)?;
                self.visible = false;
            }
            self.layout = Layout::default();
            return Ok(());
        }

        self.layout = Layout::compute(
            self.state.displayed_mut(),
            &self.layout_config,
            &mut self.renderer,
        );

        let monitor = self.placement.select_monitor(&mut self.ws)?;
        let limit = |edge: i32| match edge {
            edge if edge > 0 => edge.min(MAX_WINDOW_SIZE),
            _ => MAX_WINDOW_SIZE,
        };
        if self.layout.clip(limit(monitor.width), limit(monitor.height)) {
            tracing::debug!(
                "Stack does not fit the monitor, clipped to {}x{}",
                self.layout.width,
                self.layout.height
            );
        }
        self.placement.apply_on(
            &mut self.ws,
            monitor,
            self.layout.width,
            self.layout.height,
        )?;

        if !self.visible {
            tracing::debug!("Showing window");
            self.ws.map()?;
            self.shortcuts.grab_visible(&mut self.ws)?;
            self.visible = true;
        }
        self.redraw();
        Ok(())
    }

    /// Paint and upload the current layout.
    ///
    /// A failed frame is logged and skipped, the next change or expose
    /// draws again.
    fn redraw(&mut self) {
        let frame = match self.renderer.draw(&self.layout, self.state.displayed()) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!("Failed to draw notifications: {:#}", err);
                return;
            }
        };
        if let Err(err) = self.ws.present(&frame) {
            tracing::warn!("Failed to present frame: {:#}", err);
        }
    }
}

async fn emit(conns: &Conns, signal: Signal) {
    let result = match &signal {
        Signal::Closed { id, reason, client } => {
            conns
                .notification_closed(*id, *reason, client.as_deref())
                .await
        }
        Signal::ActionInvoked { id, key, client } => {
            conns.action_invoked(*id, key, client.as_deref()).await
        }
    };
    if let Err(err) = result {
        tracing::error!("Failed to emit {:?}: {}", signal, err);
    }
}

fn spawn_chooser(command: String, entries: Vec<MenuEntry>, tx: Sender<Input>) {
    tokio::spawn(async move {
        match context_menu::choose(&command, entries).await {
            Ok(Some(entry)) => {
                let input = Input::ActionInvoked {
                    id: entry.id,
                    key: entry.key,
                };
                if let Err(err) = tx.send(input).await {
                    tracing::error!("Failed to send chosen action: {}", err);
                }
            }
            Ok(None) => tracing::debug!("Nothing chosen"),
            Err(err) => tracing::warn!("Context menu failed: {:#}", err),
        }
    });
}

/// Connect to X11 and the session bus and serve until a fatal error.
pub async fn run(config: NotificationsConfig) -> anyhow::Result<()> {
    let backend = X11Backend::connect(config.transparency)?;
    let x11_fd = AsyncFd::new(backend.raw_fd()).context("Failed to watch the X connection")?;
    let renderer = PangoRenderer::new(&config)?;
    let mut daemon = Notifyd::new(backend, renderer, &config)?;

    let mut conns = Conns::new().await?;
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    loop {
        tokio::select! {
            input = conns.rx.recv() => {
                let Some(input) = input else {
                    anyhow::bail!("Protocol channel closed");
                };
                daemon.handle_input(input, Instant::now())?;
            }
            guard = x11_fd.readable() => {
                let mut guard = guard?;
                daemon.drain_window_events(Instant::now())?;
                guard.clear_ready();
            }
            _ = ticker.tick() => {
                // replies read during the last dispatch may have queued events
                let now = Instant::now();
                daemon.drain_window_events(now)?;
                daemon.tick(now)?;
            }
            _ = conns.name_lost.next() => {
                anyhow::bail!("Lost ownership of {}", DBUS_NAME);
            }
        }

        for signal in daemon.take_signals() {
            emit(&conns, signal).await;
        }
        if let Some(entries) = daemon.take_menu() {
            spawn_chooser(config.dmenu.clone(), entries, conns.tx.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::tests::FixedMeasure;
    use crate::rendering::{Frame, TextMeasure};
    use crate::window::Rect;
    use crate::window::fake::FakeWindow;
    use stackd_config::ShortcutsConfig;
    use stackd_util::parse_actions;
    use tokio::sync::oneshot;
    use x11rb::protocol::xproto::ModMask;

    const XK_SPACE: u32 = 0x0020;
    const XK_GRAVE: u32 = 0x0060;
    const XK_PERIOD: u32 = 0x002e;

    #[derive(Default)]
    struct FakeRenderer {
        draws: usize,
        /// Fail every draw
        fail: bool,
    }

    impl TextMeasure for FakeRenderer {
        fn text_size(&mut self, text: &str, wrap_width: Option<i32>) -> (i32, i32) {
            FixedMeasure.text_size(text, wrap_width)
        }
    }

    impl Renderer for FakeRenderer {
        fn draw(
            &mut self,
            layout: &Layout,
            _: &[stackd_util::Notification],
        ) -> anyhow::Result<Frame> {
            self.draws += 1;
            if self.fail {
                anyhow::bail!("cairo surface could not be created");
            }
            Ok(Frame {
                width: u16::try_from(layout.width)?,
                height: u16::try_from(layout.height)?,
                data: Vec::new(),
            })
        }
    }

    fn config() -> NotificationsConfig {
        NotificationsConfig {
            format: "%s".to_string(),
            allow_markup: false,
            padding: 5,
            frame_width: 1,
            separator_height: 2,
            geometry: "300x0-30+20".parse().unwrap(),
            max_notifications: 2,
            idle_threshold: 0,
            ..Default::default()
        }
    }

    fn window() -> FakeWindow {
        let mut ws = FakeWindow::single_head();
        ws.keymap.insert(XK_SPACE, 65);
        ws.keymap.insert(XK_GRAVE, 49);
        ws.keymap.insert(XK_PERIOD, 60);
        ws
    }

    fn daemon(config: &NotificationsConfig) -> Notifyd<FakeWindow, FakeRenderer> {
        Notifyd::new(window(), FakeRenderer::default(), config).unwrap()
    }

    fn request(summary: &str, client: &str) -> NotifyRequest {
        NotifyRequest {
            app_name: "app".to_string(),
            summary: summary.to_string(),
            expire_timeout: -1,
            client: Some(client.to_string()),
            ..Default::default()
        }
    }

    fn ctrl() -> u16 {
        u16::from(ModMask::CONTROL)
    }

    fn closed(id: u32, reason: CloseReason, client: &str) -> Signal {
        Signal::Closed {
            id,
            reason,
            client: Some(client.to_string()),
        }
    }

    #[test]
    fn test_first_notification_shows_window_and_grabs() {
        let mut d = daemon(&config());
        let now = Instant::now();
        assert!(!d.is_visible());

        let (reply, mut rx) = oneshot::channel();
        let input = Input::Notify {
            request: request("20", ":1.5"),
            reply,
        };
        d.handle_input(input, now).unwrap();

        assert_eq!(rx.try_recv().unwrap(), 1);
        assert!(d.is_visible());
        assert!(d.ws.mapped);
        assert!(d.ws.buttons_grabbed);
        assert_eq!(d.ws.grabbed.len(), 4, "history plus the three visible bindings");
        assert_eq!(d.ws.frames, vec![(300, 30)]);
        assert_eq!(d.ws.moves, vec![Rect::new(1920 - 300 - 30, 20, 300, 30)]);
    }

    #[test]
    fn test_last_close_hides_window_and_releases_grabs() {
        let mut d = daemon(&config());
        let now = Instant::now();
        let id = d.notify(request("20", ":1.5"), now);
        d.refresh(now).unwrap();

        d.close_notification(id, now).unwrap();
        assert!(!d.is_visible());
        assert!(!d.ws.mapped);
        assert!(!d.ws.buttons_grabbed);
        assert_eq!(d.ws.grabbed.len(), 1, "history binding stays");
        assert!(d.layout().is_empty());
        assert_eq!(
            d.take_signals(),
            vec![closed(id, CloseReason::CloseNotification, ":1.5")]
        );
    }

    #[test]
    fn test_close_signal_emitted_once() {
        let mut d = daemon(&config());
        let now = Instant::now();
        let id = d.notify(request("20", ":1.5"), now);
        d.refresh(now).unwrap();

        d.close_notification(id, now).unwrap();
        d.close_notification(id, now).unwrap();
        assert_eq!(d.take_signals().len(), 1);
    }

    #[test]
    fn test_unchanged_redraw_does_not_move_window() {
        let mut d = daemon(&config());
        let now = Instant::now();
        d.notify(request("20", ":1.5"), now);
        d.refresh(now).unwrap();
        d.handle_window_event(WindowEvent::Expose, now).unwrap();

        assert_eq!(d.ws.moves.len(), 1);
        assert_eq!(d.renderer.draws, 2);
    }

    #[test]
    fn test_tall_stack_clipped_to_monitor() {
        let mut d = daemon(&config());
        let now = Instant::now();
        let (reply, mut rx) = oneshot::channel();
        let input = Input::Notify {
            request: request("100000", ":1.5"),
            reply,
        };
        d.handle_input(input, now)
            .expect("an oversized stack must not stop the daemon");

        assert_eq!(rx.try_recv().unwrap(), 1);
        assert!(d.is_visible());
        assert_eq!(d.ws.frames, vec![(300, 1080)], "height clipped to the monitor");
        assert_eq!(d.ws.moves, vec![Rect::new(1920 - 300 - 30, 20, 300, 1080)]);
        assert_eq!(d.layout().blocks.len(), 1);
        assert_eq!(d.state().displayed()[0].height, 100_010);
    }

    #[test]
    fn test_wide_auto_width_clipped_to_monitor() {
        let config = NotificationsConfig {
            geometry: "0x0-30+20".parse().unwrap(),
            ..config()
        };
        let mut d = daemon(&config);
        let now = Instant::now();
        let summary = format!("10 {}", "w".repeat(6997));
        d.notify(request(&summary, ":1.5"), now);
        d.refresh(now).unwrap();

        assert_eq!(d.layout().width, 1920);
        assert_eq!(d.ws.frames.last(), Some(&(1920, 20)));
    }

    #[test]
    fn test_draw_failure_keeps_daemon_running() {
        let mut d = Notifyd::new(
            window(),
            FakeRenderer {
                fail: true,
                ..Default::default()
            },
            &config(),
        )
        .unwrap();
        let now = Instant::now();
        let (reply, mut rx) = oneshot::channel();
        let input = Input::Notify {
            request: request("20", ":1.5"),
            reply,
        };
        d.handle_input(input, now)
            .expect("a failed frame must not stop the daemon");
        assert_eq!(rx.try_recv().unwrap(), 1);
        assert!(d.is_visible());
        assert!(d.ws.frames.is_empty());

        d.handle_window_event(WindowEvent::Expose, now).unwrap();
        assert_eq!(d.renderer.draws, 2, "expose retries the draw");

        d.renderer.fail = false;
        d.handle_window_event(WindowEvent::Expose, now).unwrap();
        assert_eq!(d.ws.frames, vec![(300, 30)]);
    }

    #[test]
    fn test_expose_while_hidden_draws_nothing() {
        let mut d = daemon(&config());
        d.handle_window_event(WindowEvent::Expose, Instant::now()).unwrap();
        assert_eq!(d.renderer.draws, 0);
    }

    #[test]
    fn test_obscured_window_is_raised() {
        let mut d = daemon(&config());
        let now = Instant::now();
        d.notify(request("20", ":1.5"), now);
        d.refresh(now).unwrap();

        d.handle_window_event(WindowEvent::VisibilityChange { obscured: false }, now)
            .unwrap();
        assert_eq!(d.ws.raised, 0);
        d.handle_window_event(WindowEvent::VisibilityChange { obscured: true }, now)
            .unwrap();
        assert_eq!(d.ws.raised, 1);
    }

    #[test]
    fn test_click_dismisses_block_under_pointer() {
        let mut d = daemon(&config());
        let now = Instant::now();
        let first = d.notify(request("20", ":1.5"), now);
        let second = d.notify(request("30", ":1.6"), now);
        d.refresh(now).unwrap();
        d.take_signals();

        // blocks are 30 and 40 tall, the second starts at 32
        d.handle_window_event(WindowEvent::ButtonPress { button: 1, x: 5, y: 40 }, now)
            .unwrap();
        assert_eq!(
            d.take_signals(),
            vec![closed(second, CloseReason::Dismissed, ":1.6")]
        );
        assert_eq!(d.state().displayed()[0].id, first);
        assert_eq!(d.layout().height, 30);
    }

    #[test]
    fn test_right_click_closes_displayed_and_waiting() {
        let mut d = daemon(&config());
        let now = Instant::now();
        for summary in ["10", "10", "10"] {
            d.notify(request(summary, ":1.5"), now);
        }
        d.refresh(now).unwrap();
        assert_eq!(d.state().waiting().len(), 1);

        d.handle_window_event(WindowEvent::ButtonPress { button: 3, x: 0, y: 0 }, now)
            .unwrap();
        let ids: Vec<u32> = d
            .take_signals()
            .into_iter()
            .map(|s| match s {
                Signal::Closed { id, .. } => id,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(!d.is_visible());
    }

    #[test]
    fn test_shortcuts_close_top_and_recall() {
        let mut d = daemon(&config());
        let now = Instant::now();
        let first = d.notify(request("20", ":1.5"), now);
        d.notify(request("30", ":1.5"), now);
        d.refresh(now).unwrap();

        d.handle_window_event(WindowEvent::KeyPress { keysym: XK_SPACE, state: ctrl() }, now)
            .unwrap();
        assert_eq!(d.state().displayed().len(), 1);
        assert_eq!(d.state().history()[0].id, first);

        d.handle_window_event(WindowEvent::KeyPress { keysym: XK_GRAVE, state: ctrl() }, now)
            .unwrap();
        assert_eq!(d.state().displayed()[1].id, first, "recalled at the bottom");
        assert!(d.state().displayed()[1].expire_after.is_none(), "sticky");
    }

    #[test]
    fn test_unbound_key_ignored() {
        let mut d = daemon(&config());
        let now = Instant::now();
        d.notify(request("20", ":1.5"), now);
        d.refresh(now).unwrap();
        d.handle_window_event(WindowEvent::KeyPress { keysym: XK_SPACE, state: 0 }, now)
            .unwrap();
        assert_eq!(d.state().displayed().len(), 1);
    }

    #[test]
    fn test_tick_expires_and_promotes() {
        let mut d = daemon(&config());
        let now = Instant::now();
        let mut short = request("10", ":1.5");
        short.expire_timeout = 1000;
        let first = d.notify(short, now);
        d.notify(request("10", ":1.5"), now);
        let third = d.notify(request("10", ":1.5"), now);
        d.refresh(now).unwrap();
        d.take_signals();

        d.tick(now + Duration::from_millis(500)).unwrap();
        assert!(d.take_signals().is_empty());

        d.tick(now + Duration::from_secs(1)).unwrap();
        assert_eq!(
            d.take_signals(),
            vec![closed(first, CloseReason::Expired, ":1.5")]
        );
        assert_eq!(d.state().displayed()[1].id, third);
    }

    #[test]
    fn test_idle_user_restarts_timeouts() {
        let config = NotificationsConfig {
            idle_threshold: 60,
            ..config()
        };
        let mut d = daemon(&config);
        let now = Instant::now();
        let mut short = request("10", ":1.5");
        short.expire_timeout = 1000;
        d.notify(short, now);
        d.refresh(now).unwrap();

        d.ws.idle = Some(Duration::from_secs(90));
        assert!(d.is_idle());
        let back = now + Duration::from_secs(5);
        d.tick(back).unwrap();
        assert_eq!(d.state().displayed().len(), 1, "held while idle");

        // the user returns: the full second runs again from the last idle tick
        d.ws.idle = Some(Duration::from_secs(1));
        d.tick(back).unwrap();
        assert_eq!(
            d.state().displayed().len(),
            1,
            "must not expire on the first active tick"
        );
        d.tick(back + Duration::from_millis(999)).unwrap();
        assert_eq!(d.state().displayed().len(), 1);
        d.tick(back + Duration::from_secs(1)).unwrap();
        assert!(d.state().displayed().is_empty());
    }

    #[test]
    fn test_failed_idle_query_counts_as_active() {
        let config = NotificationsConfig {
            idle_threshold: 60,
            ..config()
        };
        let mut d = daemon(&config);
        let now = Instant::now();
        let mut short = request("10", ":1.5");
        short.expire_timeout = 1000;
        let id = d.notify(short, now);
        d.refresh(now).unwrap();
        d.take_signals();

        d.ws.idle_broken = true;
        assert!(!d.is_idle());
        d.tick(now + Duration::from_secs(2))
            .expect("an idle query failure must not stop the daemon");
        assert_eq!(
            d.take_signals(),
            vec![closed(id, CloseReason::Expired, ":1.5")]
        );
    }

    #[test]
    fn test_context_menu_and_action_invocation() {
        let mut d = daemon(&config());
        let now = Instant::now();
        let mut with_actions = request("20", ":1.9");
        with_actions.actions = parse_actions(&["open", "Open"]).unwrap();
        let id = d.notify(with_actions, now);
        d.refresh(now).unwrap();

        let state = ctrl() | u16::from(ModMask::SHIFT);
        d.handle_window_event(WindowEvent::KeyPress { keysym: XK_PERIOD, state }, now)
            .unwrap();
        let entries = d.take_menu().unwrap();
        assert_eq!(entries[0].line, "#Open [app]");
        assert!(d.take_menu().is_none());

        d.handle_input(
            Input::ActionInvoked {
                id,
                key: "open".to_string(),
            },
            now,
        )
        .unwrap();
        assert_eq!(
            d.take_signals(),
            vec![
                Signal::ActionInvoked {
                    id,
                    key: "open".to_string(),
                    client: Some(":1.9".to_string()),
                },
                closed(id, CloseReason::Dismissed, ":1.9"),
            ]
        );
    }

    #[test]
    fn test_context_menu_without_actions_offers_nothing() {
        let mut d = daemon(&config());
        let now = Instant::now();
        d.notify(request("20", ":1.5"), now);
        d.refresh(now).unwrap();
        d.apply(Action::ContextMenu, now).unwrap();
        assert!(d.take_menu().is_none());
    }

    #[test]
    fn test_action_for_closed_notification_ignored() {
        let mut d = daemon(&config());
        d.invoke_action(42, "open", Instant::now()).unwrap();
        assert!(d.take_signals().is_empty());
    }

    #[test]
    fn test_queued_window_events_drained() {
        let mut d = daemon(&config());
        let now = Instant::now();
        d.notify(request("20", ":1.5"), now);
        d.notify(request("20", ":1.5"), now);
        d.refresh(now).unwrap();

        d.ws.events.push_back(WindowEvent::ButtonPress { button: 1, x: 0, y: 0 });
        d.ws.events.push_back(WindowEvent::ButtonPress { button: 1, x: 0, y: 0 });
        d.drain_window_events(now).unwrap();
        assert!(d.state().displayed().is_empty());
        assert!(d.ws.events.is_empty());
    }

    #[test]
    fn test_disabled_shortcuts_from_config() {
        let config = NotificationsConfig {
            shortcuts: ShortcutsConfig {
                close: "none".to_string(),
                close_all: "none".to_string(),
                history: "none".to_string(),
                context: "none".to_string(),
            },
            ..config()
        };
        let mut d = daemon(&config);
        let now = Instant::now();
        d.notify(request("20", ":1.5"), now);
        d.refresh(now).unwrap();
        assert!(d.ws.grabbed.is_empty());
        assert!(d.ws.grab_attempts.is_empty());
    }
}
