//! Observable state slots.
//!
//! Every piece of shared state (busy flag, current result, dashboards, widget
//! projections) lives in a `Slot`: the owner replaces the whole value, and
//! readers get cheap snapshots or subscribe to changes. Nothing is patched in
//! place, so a reader always sees a consistent value without locking.

use tokio::sync::watch;

/// A single-owner, many-reader value cell.
#[derive(Debug)]
pub struct Slot<T> {
    tx: watch::Sender<T>,
}

impl<T> Slot<T> {
    /// Creates a slot holding `initial`.
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replaces the value and notifies subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Replaces the value with one derived from the current value.
    ///
    /// The closure runs while the slot is locked, so concurrent updates
    /// cannot interleave between the read and the write.
    pub fn update<R>(&self, f: impl FnOnce(&T) -> (T, R)) -> R {
        let mut out = None;
        self.tx.send_modify(|current| {
            let (next, r) = f(current);
            *current = next;
            out = Some(r);
        });
        match out {
            Some(r) => r,
            None => unreachable!("send_modify always runs its closure"),
        }
    }

    /// Subscribes to future changes.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Slot<T> {
    /// Returns a snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_and_get() {
        let slot = Slot::new(1);
        slot.set(2);
        assert_eq!(slot.get(), 2);
    }

    #[test]
    fn test_update_returns_value() {
        let slot = Slot::new(Arc::new(vec![1, 2]));
        let len = slot.update(|v| {
            let mut next = v.as_ref().clone();
            next.push(3);
            let len = next.len();
            (Arc::new(next), len)
        });
        assert_eq!(len, 3);
        assert_eq!(*slot.get(), vec![1, 2, 3]);
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_updates() {
        let slot = Slot::new(Arc::new(vec!["a"]));
        let snapshot = slot.get();
        slot.set(Arc::new(vec!["b"]));
        assert_eq!(*snapshot, vec!["a"]);
    }

    #[tokio::test]
    async fn test_subscriber_sees_changes() {
        let slot = Slot::new(false);
        let mut rx = slot.subscribe();
        slot.set(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
