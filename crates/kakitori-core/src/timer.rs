//! Cancellable timer registry driven by an external clock.
//!
//! The writer never spawns threads or callbacks of its own. Every delayed
//! effect (animation steps, hint and flash expiry, peek auto-hide) is a
//! [`TimerId`] in one queue, and the host advances time with
//! [`TimerQueue::poll`]. Cancelling a kind or the whole queue is therefore
//! enough to make sure nothing fires after a rebind or detach.

use std::time::Duration;

/// What a timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Step of a stroke-order animation; `tag` is the stroke index,
    /// or the stroke count for the end marker.
    Animation,
    /// End of a hint highlight.
    Hint,
    /// End of the correct/incorrect colour flash.
    Flash,
    /// End of a peek at the full reference.
    Peek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub id: TimerId,
    pub kind: TimerKind,
    pub tag: usize,
    pub due: Duration,
}

#[derive(Debug, Clone)]
struct PendingTimer {
    id: TimerId,
    kind: TimerKind,
    tag: usize,
    due: Duration,
}

/// Pending timers keyed by id.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer firing at `due` (writer clock).
    pub fn schedule(&mut self, kind: TimerKind, due: Duration, tag: usize) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(PendingTimer { id, kind, tag, due });
        id
    }

    /// Cancel one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Cancel every timer of `kind`, returning how many were dropped.
    pub fn cancel_kind(&mut self, kind: TimerKind) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.kind != kind);
        before - self.pending.len()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return every timer due at or before `now`, earliest first.
    pub fn poll(&mut self, now: Duration) -> Vec<TimerEvent> {
        let (mut fired, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|t| t.due <= now);
        self.pending = rest;
        fired.sort_by_key(|t| (t.due, t.id));
        fired
            .into_iter()
            .map(|t| TimerEvent {
                id: t.id,
                kind: t.kind,
                tag: t.tag,
                due: t.due,
            })
            .collect()
    }

    /// Number of pending timers of `kind`.
    pub fn pending(&self, kind: TimerKind) -> usize {
        self.pending.iter().filter(|t| t.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest pending due time.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|t| t.due).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_poll_returns_due_in_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKind::Animation, ms(800), 2);
        timers.schedule(TimerKind::Animation, ms(0), 0);
        timers.schedule(TimerKind::Animation, ms(400), 1);

        let fired = timers.poll(ms(500));
        let tags: Vec<_> = fired.iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![0, 1]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_due(), Some(ms(800)));
    }

    #[test]
    fn test_cancel_single() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule(TimerKind::Hint, ms(1000), 0);
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.poll(ms(2000)).is_empty());
    }

    #[test]
    fn test_cancel_kind_leaves_others() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKind::Animation, ms(0), 0);
        timers.schedule(TimerKind::Animation, ms(400), 1);
        timers.schedule(TimerKind::Peek, ms(1000), 0);

        assert_eq!(timers.cancel_kind(TimerKind::Animation), 2);
        assert_eq!(timers.pending(TimerKind::Animation), 0);
        assert_eq!(timers.pending(TimerKind::Peek), 1);
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = TimerQueue::new();
        timers.schedule(TimerKind::Flash, ms(300), 0);
        timers.schedule(TimerKind::Peek, ms(1000), 0);
        timers.cancel_all();
        assert!(timers.is_empty());
        assert_eq!(timers.next_due(), None);
    }
}
