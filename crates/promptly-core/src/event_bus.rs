//! Application-wide event bus
//!
//! Holds the most recently dispatched event. Components that need to react
//! to cross-cutting happenings ("profile-changed", "template-saved", ...)
//! subscribe to it instead of holding references to each other.

use serde::{Deserialize, Serialize};

use crate::observable::{Observable, Subscription};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    state: Observable<Option<BusEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            state: Observable::new(None),
        }
    }

    /// Publish an event. Subscribers are notified even if it repeats the last one.
    pub fn dispatch(&self, event: impl Into<String>, data: Option<serde_json::Value>) {
        let event = BusEvent {
            event: event.into(),
            data,
        };
        tracing::debug!(event = %event.event, "Dispatching bus event");
        self.state.set(Some(event));
    }

    /// Last dispatched event, if any
    pub fn last(&self) -> Option<BusEvent> {
        self.state.get()
    }

    pub fn subscribe(&self) -> Subscription<Option<BusEvent>> {
        self.state.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_initial_value_is_none() {
        let bus = EventBus::new();
        let mut subscription = bus.subscribe();
        assert_eq!(subscription.next().await, Some(None));
        assert!(bus.last().is_none());
    }

    #[tokio::test]
    async fn test_repeated_dispatch_notifies_each_time() {
        let bus = EventBus::new();
        let mut subscription = bus.subscribe();
        subscription.next().await;

        bus.dispatch("profile-changed", Some(json!({"id": "p1"})));
        let first = subscription.next().await.flatten().unwrap();
        assert_eq!(first.event, "profile-changed");
        assert_eq!(first.data, Some(json!({"id": "p1"})));

        bus.dispatch("profile-changed", Some(json!({"id": "p1"})));
        let second = subscription.next().await.flatten().unwrap();
        assert_eq!(second, first);
    }
}
