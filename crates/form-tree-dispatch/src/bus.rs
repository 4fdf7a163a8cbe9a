//! Event bus addressed by component ids.
//!
//! Components subscribe under their own id. A sender addresses the id of the
//! component it is interested in (usually itself), and the event bubbles
//! from the most specific subscribed ancestor outwards, like DOM events over
//! the logical id hierarchy instead of DOM nodes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::owners::owners_of;
use crate::Propagation;

pub type ListenerId = u64;

type Listener = Rc<dyn Fn(Option<&Value>) -> Propagation>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Continue to less specific owners when a listener returns
    /// [`Propagation::Continue`]. When `false` only the most specific owner
    /// is invoked.
    pub bubble: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self { bubble: true }
    }
}

#[derive(Default)]
struct Subscriptions {
    next_listener_id: ListenerId,
    // event name -> owner id -> listeners in registration order
    events: HashMap<String, IndexMap<String, Vec<(ListenerId, Listener)>>>,
}

/// Per-form event bus.
///
/// Cloning yields another handle to the same subscription table, so
/// listeners can hold the bus and subscribe, unsubscribe or send while an
/// event is being delivered.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Subscriptions>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, owner_id: &str, event_name: &str, listener: F) -> ListenerId
    where
        F: Fn(Option<&Value>) -> Propagation + 'static,
    {
        let mut subs = self.inner.borrow_mut();
        subs.next_listener_id = subs.next_listener_id.saturating_add(1);
        let id = subs.next_listener_id;
        subs.events
            .entry(event_name.to_string())
            .or_default()
            .entry(owner_id.to_string())
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, owner_id: &str, event_name: &str, listener_id: ListenerId) -> bool {
        let mut subs = self.inner.borrow_mut();
        let Some(owners) = subs.events.get_mut(event_name) else {
            return false;
        };
        let Some(listeners) = owners.get_mut(owner_id) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != listener_id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            owners.shift_remove(owner_id);
        }
        if owners.is_empty() {
            subs.events.remove(event_name);
        }
        removed
    }

    /// Drop every listener registered under `owner_id`, for all events.
    ///
    /// Returns the number of listeners removed.
    pub fn unsubscribe_owner(&self, owner_id: &str) -> usize {
        let mut subs = self.inner.borrow_mut();
        let mut removed = 0;
        subs.events.retain(|_, owners| {
            if let Some(listeners) = owners.shift_remove(owner_id) {
                removed += listeners.len();
            }
            !owners.is_empty()
        });
        removed
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.inner
            .borrow()
            .events
            .get(event_name)
            .map_or(0, |owners| owners.values().map(Vec::len).sum())
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().events.clear();
    }

    /// Deliver `event_name` to the owners of `target_id`.
    ///
    /// Returns `true` when a listener stopped propagation.
    pub fn send(
        &self,
        target_id: &str,
        event_name: &str,
        data: Option<&Value>,
        options: SendOptions,
    ) -> bool {
        let batches = self.snapshot(target_id, event_name, options);
        tracing::trace!(target_id, event_name, owners = batches.len(), "sending event");
        for listeners in batches {
            for listener in listeners {
                if listener(data) == Propagation::Stop {
                    return true;
                }
            }
        }
        false
    }

    /// [`send`](Self::send), then run `callback` unless a listener stopped
    /// propagation. With no subscribers the callback always runs.
    pub fn send_with_callback<C>(
        &self,
        target_id: &str,
        event_name: &str,
        data: Option<&Value>,
        callback: C,
        options: SendOptions,
    ) -> bool
    where
        C: FnOnce(),
    {
        let handled = self.send(target_id, event_name, data, options);
        if !handled {
            callback();
        }
        handled
    }

    // Listener lists are copied out so that delivery runs without the table
    // borrowed.
    fn snapshot(&self, target_id: &str, event_name: &str, options: SendOptions) -> Vec<Vec<Listener>> {
        let subs = self.inner.borrow();
        let Some(owners) = subs.events.get(event_name) else {
            return Vec::new();
        };
        let mut matched = owners_of(owners.keys(), target_id);
        if !options.bubble {
            matched.truncate(1);
        }
        matched
            .into_iter()
            .filter_map(|owner| owners.get(owner))
            .map(|listeners| listeners.iter().map(|(_, l)| Rc::clone(l)).collect())
            .collect()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subs = self.inner.borrow();
        let mut events: Vec<(&str, usize)> = subs
            .events
            .iter()
            .map(|(name, owners)| (name.as_str(), owners.len()))
            .collect();
        events.sort_unstable();
        f.debug_struct("EventBus").field("events", &events).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_subscribe_and_send() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        bus.subscribe("root_a", "focus", move |data| {
            log.borrow_mut().push(data.cloned());
            Propagation::Stop
        });
        assert!(bus.send("root_a_0", "focus", Some(&Value::from(1)), SendOptions::default()));
        assert!(!bus.send("root_b", "focus", None, SendOptions::default()));
        assert!(!bus.send("root_a", "blur", None, SendOptions::default()));
        assert_eq!(*seen.borrow(), vec![Some(Value::from(1))]);
    }

    #[test]
    fn test_unsubscribe_cleans_up() {
        let bus = EventBus::new();
        let id = bus.subscribe("root", "e", |_| Propagation::Stop);
        assert_eq!(bus.listener_count("e"), 1);
        assert!(!bus.unsubscribe("root", "e", id + 1));
        assert!(bus.unsubscribe("root", "e", id));
        assert!(!bus.unsubscribe("root", "e", id));
        assert_eq!(bus.listener_count("e"), 0);
    }

    #[test]
    fn test_unsubscribe_owner() {
        let bus = EventBus::new();
        bus.subscribe("root_a", "x", |_| Propagation::Stop);
        bus.subscribe("root_a", "y", |_| Propagation::Stop);
        bus.subscribe("root_b", "x", |_| Propagation::Stop);
        assert_eq!(bus.unsubscribe_owner("root_a"), 2);
        assert_eq!(bus.listener_count("x"), 1);
        assert_eq!(bus.listener_count("y"), 0);
    }

    #[test]
    fn test_callback_without_subscribers() {
        let bus = EventBus::new();
        let called = Cell::new(false);
        let handled = bus.send_with_callback("root", "nobody", None, || called.set(true), SendOptions::default());
        assert!(!handled);
        assert!(called.get());
    }

    #[test]
    fn test_callback_skipped_when_handled() {
        let bus = EventBus::new();
        bus.subscribe("root", "e", |_| Propagation::Stop);
        let called = Cell::new(false);
        bus.send_with_callback("root_x", "e", None, || called.set(true), SendOptions::default());
        assert!(!called.get());
    }

    #[test]
    fn test_registration_order_within_owner() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let order = Rc::clone(&order);
            bus.subscribe("root", "e", move |_| {
                order.borrow_mut().push(n);
                if n == 1 {
                    Propagation::Stop
                } else {
                    Propagation::Continue
                }
            });
        }
        assert!(bus.send("root", "e", None, SendOptions::default()));
        assert_eq!(*order.borrow(), vec![0, 1]);
    }
}
