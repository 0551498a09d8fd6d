//! Observable state container
//!
//! A cloneable handle over a single shared value. Readers take snapshots,
//! writers replace or mutate the value, and subscribers receive the current
//! value immediately followed by every later change.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug)]
pub struct Observable<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value and notify every subscriber
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate the value in place and notify every subscriber
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        self.tx.send_modify(f);
    }

    /// Subscribe to the value; the first `next()` yields the current value.
    pub fn subscribe(&self) -> Subscription<T> {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        Subscription { rx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone + PartialEq> Observable<T> {
    /// Replace the value only when it differs; returns whether it changed.
    ///
    /// Subscribers are not woken for a no-op write.
    pub fn set_if_changed(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}

/// Receiving side of an [`Observable`]
#[derive(Debug)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Wait for the next value.
    ///
    /// Returns `None` once every handle to the observable has been dropped.
    /// Intermediate values written between two calls are coalesced.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Latest value without waiting
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_subscribe_replays_current_value() {
        let observable = Observable::new(1);
        observable.set(2);

        let mut subscription = observable.subscribe();
        assert_eq!(subscription.next().await, Some(2));

        observable.set(3);
        assert_eq!(subscription.next().await, Some(3));
    }

    #[tokio::test]
    async fn test_update_notifies() {
        let observable = Observable::new(vec![1]);
        let mut subscription = observable.subscribe();
        assert_eq!(subscription.next().await, Some(vec![1]));

        observable.update(|values| values.push(2));
        assert_eq!(subscription.next().await, Some(vec![1, 2]));
        assert_eq!(observable.get(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_set_if_changed_skips_equal_values() {
        let observable = Observable::new("a".to_string());
        let mut subscription = observable.subscribe();
        subscription.next().await;

        assert!(!observable.set_if_changed("a".to_string()));
        let pending = tokio::time::timeout(Duration::from_millis(20), subscription.next()).await;
        assert!(pending.is_err(), "no notification expected for equal value");

        assert!(observable.set_if_changed("b".to_string()));
        assert_eq!(subscription.next().await, Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_subscription_ends_when_observable_dropped() {
        let observable = Observable::new(0u8);
        let mut subscription = observable.subscribe();
        assert_eq!(subscription.next().await, Some(0));

        drop(observable);
        assert_eq!(subscription.next().await, None);
    }

    #[tokio::test]
    async fn test_current_does_not_consume_change() {
        let observable = Observable::new("draft".to_string());
        let mut subscription = observable.subscribe();

        observable.set("saved".to_string());
        assert_eq!(subscription.current(), "saved");
        // The pending change is still delivered to next()
        assert_eq!(subscription.next().await, Some("saved".to_string()));
    }

    #[test]
    fn test_clones_share_state() {
        let observable = Observable::new(10);
        let other = observable.clone();
        other.set(11);
        assert_eq!(observable.get(), 11);
        let _subscription = observable.subscribe();
        assert_eq!(other.subscriber_count(), 1);
    }
}
