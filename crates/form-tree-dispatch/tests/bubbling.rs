use std::cell::RefCell;
use std::rc::Rc;

use form_tree_dispatch::{EventBus, Propagation, SendOptions};

type Log = Rc<RefCell<Vec<&'static str>>>;

fn subscribe_logged(bus: &EventBus, log: &Log, owner: &'static str, result: Propagation) {
    let log = Rc::clone(log);
    bus.subscribe(owner, "activate", move |_| {
        log.borrow_mut().push(owner);
        result
    });
}

#[test]
fn innermost_owner_stops_propagation() {
    let bus = EventBus::new();
    let log: Log = Rc::default();
    subscribe_logged(&bus, &log, "root", Propagation::Stop);
    subscribe_logged(&bus, &log, "root_gatherings", Propagation::Stop);
    subscribe_logged(&bus, &log, "root_gatherings_0", Propagation::Stop);

    assert!(bus.send("root_gatherings_0_units_1", "activate", None, SendOptions::default()));
    assert_eq!(*log.borrow(), vec!["root_gatherings_0"]);
}

#[test]
fn continue_bubbles_to_next_ancestor() {
    let bus = EventBus::new();
    let log: Log = Rc::default();
    subscribe_logged(&bus, &log, "root", Propagation::Stop);
    subscribe_logged(&bus, &log, "root_gatherings", Propagation::Stop);
    subscribe_logged(&bus, &log, "root_gatherings_0", Propagation::Continue);

    assert!(bus.send("root_gatherings_0_units_1", "activate", None, SendOptions::default()));
    assert_eq!(*log.borrow(), vec!["root_gatherings_0", "root_gatherings"]);
}

#[test]
fn unhandled_event_reaches_every_owner_then_callback() {
    let bus = EventBus::new();
    let log: Log = Rc::default();
    for owner in ["root", "root_gatherings", "root_gatherings_0", "root_other"] {
        subscribe_logged(&bus, &log, owner, Propagation::Continue);
    }

    let called = RefCell::new(false);
    let handled = bus.send_with_callback(
        "root_gatherings_0_units_1",
        "activate",
        None,
        || *called.borrow_mut() = true,
        SendOptions::default(),
    );
    assert!(!handled);
    assert!(*called.borrow());
    assert_eq!(*log.borrow(), vec!["root_gatherings_0", "root_gatherings", "root"]);
}

#[test]
fn no_bubble_invokes_only_most_specific_owner() {
    let bus = EventBus::new();
    let log: Log = Rc::default();
    subscribe_logged(&bus, &log, "root", Propagation::Stop);
    subscribe_logged(&bus, &log, "root_gatherings_0", Propagation::Continue);

    let handled = bus.send(
        "root_gatherings_0_units_1",
        "activate",
        None,
        SendOptions { bubble: false },
    );
    assert!(!handled);
    assert_eq!(*log.borrow(), vec!["root_gatherings_0"]);
}

#[test]
fn sibling_with_common_prefix_is_not_an_ancestor() {
    let bus = EventBus::new();
    let log: Log = Rc::default();
    subscribe_logged(&bus, &log, "root_units_1", Propagation::Stop);

    assert!(!bus.send("root_units_10", "activate", None, SendOptions::default()));
    assert!(log.borrow().is_empty());
}

#[test]
fn self_unsubscribe_during_dispatch_keeps_order() {
    let bus = EventBus::new();
    let log: Log = Rc::default();

    let id_cell: Rc<RefCell<Option<u64>>> = Rc::default();
    {
        let bus_handle = bus.clone();
        let log = Rc::clone(&log);
        let id_cell_in = Rc::clone(&id_cell);
        let id = bus.subscribe("root", "activate", move |_| {
            log.borrow_mut().push("once");
            if let Some(id) = *id_cell_in.borrow() {
                bus_handle.unsubscribe("root", "activate", id);
            }
            Propagation::Continue
        });
        *id_cell.borrow_mut() = Some(id);
    }
    subscribe_logged(&bus, &log, "root", Propagation::Continue);

    bus.send("root_a", "activate", None, SendOptions::default());
    bus.send("root_a", "activate", None, SendOptions::default());
    assert_eq!(*log.borrow(), vec!["once", "root", "root"]);
    assert_eq!(bus.listener_count("activate"), 1);
}

#[test]
fn listener_may_send_reentrantly() {
    let bus = EventBus::new();
    let log: Log = Rc::default();
    subscribe_logged(&bus, &log, "root", Propagation::Stop);
    {
        let bus_handle = bus.clone();
        bus.subscribe("root_map", "locate", move |data| {
            bus_handle.send("root_map", "activate", data, SendOptions::default());
            Propagation::Stop
        });
    }
    assert!(bus.send("root_map_0", "locate", None, SendOptions::default()));
    assert_eq!(*log.borrow(), vec!["root"]);
}
