use stackd_config::NotificationsConfig;
use stackd_util::{CloseReason, Notification, NotifyRequest, UrgencyTimeouts};
use std::collections::VecDeque;
use std::time::Instant;

use crate::constants::INITIAL_CARDS_CAPACITY;

/// Queue limits and promotion policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueuePolicy {
    /// Maximum displayed notifications, `None` for no limit.
    pub max_slots: Option<usize>,
    pub history_length: usize,
    pub sticky_history: bool,
    pub do_not_disturb: bool,
    pub timeouts: UrgencyTimeouts,
}

impl QueuePolicy {
    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self {
            max_slots: config.max_slots(),
            history_length: config.history_length,
            sticky_history: config.sticky_history,
            do_not_disturb: config.do_not_disturb,
            timeouts: config.timeouts(),
        }
    }
}

/// A notification that left waiting/displayed, to be reported to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed {
    pub id: u32,
    pub reason: CloseReason,
    pub client: Option<String>,
}

/// Owns every known notification.
///
/// Each id lives in exactly one of `waiting`, `displayed` or `history`.
/// Close events are collected in an outbox and drained by the reactor, so
/// one notification produces exactly one `NotificationClosed`.
#[derive(Debug)]
pub struct NotificationState {
    /// Accepted but not yet shown, head is promoted first
    waiting: VecDeque<Notification>,
    /// Currently visible, top to bottom
    displayed: Vec<Notification>,
    /// Closed notifications, most recent first
    history: VecDeque<Notification>,
    next_id: u32,
    policy: QueuePolicy,
    closed: Vec<Closed>,
}

impl NotificationState {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            waiting: VecDeque::new(),
            displayed: Vec::with_capacity(INITIAL_CARDS_CAPACITY),
            history: VecDeque::new(),
            next_id: 1,
            policy,
            closed: Vec::new(),
        }
    }

    pub fn waiting(&self) -> &VecDeque<Notification> {
        &self.waiting
    }

    pub fn displayed(&self) -> &[Notification] {
        &self.displayed
    }

    /// Layout writes display text and heights back through this.
    pub(crate) fn displayed_mut(&mut self) -> &mut [Notification] {
        &mut self.displayed
    }

    pub fn history(&self) -> &VecDeque<Notification> {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.displayed.is_empty()
    }

    /// Insert a new notification, or replace one that is still live.
    ///
    /// A replace keeps the id and the position. A displayed notification
    /// restarts its expiry timer. Unknown replace ids get a fresh id.
    pub fn enqueue_or_replace(&mut self, request: NotifyRequest, now: Instant) -> u32 {
        if let Some(id) = request.replaces() {
            if let Some(n) = self.displayed.iter_mut().find(|n| n.id == id) {
                n.replace_content(request, &self.policy.timeouts);
                n.start = Some(now);
                tracing::debug!("Replaced displayed notification {}", id);
                return id;
            }
            if let Some(n) = self.waiting.iter_mut().find(|n| n.id == id) {
                n.replace_content(request, &self.policy.timeouts);
                tracing::debug!("Replaced waiting notification {}", id);
                return id;
            }
            tracing::debug!("Notification {} to replace is gone, allocating a new id", id);
        }

        let id = self.allocate_id();
        let notification = Notification::from_request(id, request, &self.policy.timeouts);
        self.waiting.push_back(notification);
        self.promote(now);
        id
    }

    /// Next id after `next_id` that is neither 0 nor held by any
    /// waiting, displayed or history entry.
    fn allocate_id(&mut self) -> u32 {
        loop {
            let id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1).max(1);
            if id != 0 && !self.is_known(id) {
                return id;
            }
            tracing::trace!("Id {} still in use, skipping", id);
        }
    }

    fn is_known(&self, id: u32) -> bool {
        self.waiting
            .iter()
            .chain(self.displayed.iter())
            .chain(self.history.iter())
            .any(|n| n.id == id)
    }

    fn has_free_slot(&self) -> bool {
        self.policy
            .max_slots
            .is_none_or(|max| self.displayed.len() < max)
    }

    /// Move waiting notifications into free display slots, oldest first.
    pub fn promote(&mut self, now: Instant) {
        if self.policy.do_not_disturb {
            return;
        }
        while self.has_free_slot() {
            let Some(mut n) = self.waiting.pop_front() else {
                break;
            };
            n.start = Some(now);
            tracing::trace!("Promoted notification {}", n.id);
            self.displayed.push(n);
        }
    }

    /// Move `id` into history and queue its close signal.
    ///
    /// Returns `false` when the id is not waiting or displayed.
    pub fn close(&mut self, id: u32, reason: CloseReason) -> bool {
        let notification = if let Some(pos) = self.displayed.iter().position(|n| n.id == id) {
            self.displayed.remove(pos)
        } else if let Some(pos) = self.waiting.iter().position(|n| n.id == id) {
            match self.waiting.remove(pos) {
                Some(n) => n,
                None => return false,
            }
        } else {
            return false;
        };

        self.retire(notification, reason);
        true
    }

    fn retire(&mut self, mut notification: Notification, reason: CloseReason) {
        tracing::debug!("Closing notification {} ({:?})", notification.id, reason);
        self.closed.push(Closed {
            id: notification.id,
            reason,
            client: notification.client.clone(),
        });
        notification.start = None;
        self.history.push_front(notification);
        self.history.truncate(self.policy.history_length);
    }

    /// Close everything waiting or displayed, displayed first, top to bottom.
    pub fn close_all(&mut self, reason: CloseReason) {
        let displayed = std::mem::take(&mut self.displayed);
        let waiting = std::mem::take(&mut self.waiting);
        for n in displayed.into_iter().chain(waiting) {
            self.retire(n, reason);
        }
    }

    /// Bring back the most recently closed notification.
    pub fn pop_history(&mut self, now: Instant) -> Option<u32> {
        let mut notification = self.history.pop_front()?;
        let id = notification.id;
        if self.policy.sticky_history {
            notification.make_sticky();
        }
        notification.text.clear();
        notification.height = 0;
        self.waiting.push_front(notification);
        self.promote(now);
        Some(id)
    }

    /// Close every displayed notification whose timer ran out.
    ///
    /// Returns whether anything expired.
    pub fn expire(&mut self, now: Instant) -> bool {
        let expired: Vec<u32> = self
            .displayed
            .iter()
            .filter(|n| n.is_expired(now))
            .map(|n| n.id)
            .collect();
        for id in &expired {
            self.close(*id, CloseReason::Expired);
        }
        !expired.is_empty()
    }

    /// Restart the expiry timer of every displayed notification.
    ///
    /// Called while the user is idle, so the full timeout runs again once
    /// they come back.
    pub fn restart_timers(&mut self, now: Instant) {
        for n in &mut self.displayed {
            n.start = Some(now);
        }
    }

    /// Drain pending close events.
    pub fn take_closed(&mut self) -> Vec<Closed> {
        std::mem::take(&mut self.closed)
    }

    /// Find a live notification by id.
    pub fn get(&self, id: u32) -> Option<&Notification> {
        self.displayed
            .iter()
            .chain(self.waiting.iter())
            .find(|n| n.id == id)
    }
}
