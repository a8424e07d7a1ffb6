//! Notification center - toast queue read by the UI

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;

use crate::domain::{Notification, NotificationDraft};
use crate::ports::Clock;

/// Bounded FIFO of notifications. When full, the oldest entry is dropped.
pub struct NotificationCenter {
    queue: Mutex<VecDeque<Notification>>,
    capacity: usize,
    next_id: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl NotificationCenter {
    pub fn new(clock: Arc<dyn Clock>, capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
            clock,
        }
    }

    // A poisoned queue only holds toasts, so keep using it.
    fn queue(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, draft: NotificationDraft) -> Notification {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind: draft.kind,
            title: draft.title,
            message: draft.message,
            timestamp: self.clock.now_ms(),
            upgrade: draft.upgrade,
        };
        debug!(kind = %notification.kind, title = %notification.title, "notification");

        let mut queue = self.queue();
        while queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(notification.clone());
        notification
    }

    /// Snapshot of queued notifications, oldest first
    pub fn pending(&self) -> Vec<Notification> {
        self.queue().iter().cloned().collect()
    }

    /// Take every queued notification
    pub fn drain(&self) -> Vec<Notification> {
        self.queue().drain(..).collect()
    }

    /// Remove one notification. Returns false if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.queue();
        let before = queue.len();
        queue.retain(|n| n.id != id);
        queue.len() != before
    }

    /// Drop notifications older than `age`. Returns how many were removed.
    pub fn expire_older_than(&self, age: Duration) -> usize {
        let cutoff = self.clock.now_ms() - age.as_millis() as i64;
        let mut queue = self.queue();
        let before = queue.len();
        queue.retain(|n| n.timestamp >= cutoff);
        before - queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FixedClock;
    use crate::domain::{NotificationKind, UpgradeTrigger};
    use chrono::NaiveDate;

    fn center(capacity: usize) -> (NotificationCenter, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        (NotificationCenter::new(clock.clone(), capacity), clock)
    }

    #[test]
    fn test_push_and_drain() {
        let (center, _) = center(4);
        let first = center.push(NotificationDraft::success("Saved!", "Item added"));
        center.push(
            NotificationDraft::warning("Limit", "Sign up").with_upgrade(UpgradeTrigger::SaveLimit),
        );

        let drained = center.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].id, first.id);
        assert_eq!(drained[1].kind, NotificationKind::Warning);
        assert_eq!(drained[1].upgrade, Some(UpgradeTrigger::SaveLimit));
        assert!(center.pending().is_empty());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let (center, _) = center(2);
        center.push(NotificationDraft::info("1", ""));
        center.push(NotificationDraft::info("2", ""));
        center.push(NotificationDraft::info("3", ""));

        let titles: Vec<_> = center.pending().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["2", "3"]);
    }

    #[test]
    fn test_huge_capacity_does_not_preallocate() {
        let (center, _) = center(usize::MAX);
        center.push(NotificationDraft::info("only", ""));
        assert_eq!(center.pending().len(), 1);
    }

    #[test]
    fn test_dismiss_and_expire() {
        let (center, clock) = center(8);
        let old = center.push(NotificationDraft::info("old", ""));
        clock.advance(chrono::Duration::seconds(6));
        center.push(NotificationDraft::info("new", ""));

        assert_eq!(center.expire_older_than(Duration::from_secs(5)), 1);
        assert!(!center.dismiss(old.id));
        assert_eq!(center.pending().len(), 1);
    }
}
