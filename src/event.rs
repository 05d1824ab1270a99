//! Change notification for exchange items
//!
//! An explicit publish-subscribe list with stable listener keys. Dispatch is
//! synchronous and best-effort: a failing listener is logged and the
//! remaining listeners still run. Parallel dispatch is a possible future
//! extension of `emit`.

use crate::error::ExchangeResult;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::rc::Rc;

/// Payload broadcast when an item's definition, time set, element set or
/// values change
#[derive(Debug, Clone)]
pub struct ExchangeEvent {
    /// Id of the exchange item that changed
    pub item: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl ExchangeEvent {
    pub fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// A change-notification callback
///
/// Listener identity is the key it was attached under, not the closure
/// itself, so the same functional listener can be detached later.
pub type Listener = Rc<dyn Fn(&ExchangeEvent) -> ExchangeResult<()>>;

/// Keyed listener registry with best-effort dispatch
#[derive(Default)]
pub struct EventBroadcast {
    listeners: RefCell<Vec<(String, Listener)>>,
}

impl EventBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Attach a listener under `key`; a second attach under the same key is
    /// ignored
    pub fn attach(&self, key: &str, listener: Listener) {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.iter().any(|(k, _)| k == key) {
            return;
        }
        listeners.push((key.to_string(), listener));
    }

    /// Detach the listener attached under `key`, if any
    pub fn detach(&self, key: &str) {
        self.listeners.borrow_mut().retain(|(k, _)| k != key);
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    /// Invoke every listener in registration order
    ///
    /// Errors are swallowed here so a misbehaving observer cannot break the
    /// broadcaster or starve later listeners. The registry is snapshotted
    /// before dispatch, so listeners may attach/detach during the walk.
    pub fn emit(&self, event: &ExchangeEvent) {
        let snapshot: Vec<(String, Listener)> = self.listeners.borrow().clone();
        for (key, listener) in snapshot {
            if let Err(error) = listener(event) {
                tracing::warn!(listener = %key, item = %event.item, %error,
                    "change listener failed; continuing dispatch");
            }
        }
    }
}

impl std::fmt::Debug for EventBroadcast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcast")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExchangeError;

    #[test]
    fn test_attach_is_idempotent_per_key() {
        let bus = EventBroadcast::new();
        let hits = Rc::new(RefCell::new(0));
        for _ in 0..2 {
            let hits = hits.clone();
            bus.attach(
                "counter",
                Rc::new(move |_| {
                    *hits.borrow_mut() += 1;
                    Ok(())
                }),
            );
        }
        bus.emit(&ExchangeEvent::new("out", "values reset"));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_detach_by_key() {
        let bus = EventBroadcast::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        bus.attach(
            "counter",
            Rc::new(move |_| {
                *h.borrow_mut() += 1;
                Ok(())
            }),
        );
        bus.detach("counter");
        assert!(bus.is_empty());
        bus.emit(&ExchangeEvent::new("out", "values reset"));
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_failing_listener_does_not_stop_dispatch() {
        let bus = EventBroadcast::new();
        let hits = Rc::new(RefCell::new(Vec::new()));

        bus.attach(
            "broken",
            Rc::new(|_| Err(ExchangeError::Listener("broken".into()))),
        );
        let h = hits.clone();
        bus.attach(
            "first",
            Rc::new(move |_| {
                h.borrow_mut().push("first");
                Ok(())
            }),
        );
        let h = hits.clone();
        bus.attach(
            "second",
            Rc::new(move |_| {
                h.borrow_mut().push("second");
                Ok(())
            }),
        );

        bus.emit(&ExchangeEvent::new("out", "values reset"));
        assert_eq!(*hits.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_listener_may_detach_itself_during_dispatch() {
        let bus = Rc::new(EventBroadcast::new());
        let inner = bus.clone();
        bus.attach(
            "once",
            Rc::new(move |_| {
                inner.detach("once");
                Ok(())
            }),
        );
        bus.emit(&ExchangeEvent::new("out", "first"));
        assert!(bus.is_empty());
    }
}
