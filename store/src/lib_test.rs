#![allow(clippy::float_cmp)]

use super::*;
use std::cell::{Cell, RefCell};
use wire::{Pose, RoiKind};

fn store() -> Store {
    Store::with_client_id("client_test")
}

// =============================================================
// get / set
// =============================================================

#[test]
fn fresh_store_holds_defaults() {
    let s = store();
    assert_eq!(s.viewport(), Viewport::default());
    assert!(s.show_raw());
    assert_eq!(s.max_points_to_render(), 10_000);
    assert_eq!(s.connection_status(), ConnectionState::Disconnected);
    assert!(s.sensors().is_empty());
}

#[test]
fn generated_client_id_has_prefix() {
    let s = Store::new();
    assert!(s.client_id().starts_with("client_"));
    assert_ne!(Store::new().client_id(), s.client_id());
}

#[test]
fn set_notifies_with_new_and_old() {
    let s = store();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    s.subscribe(StateKey::ShowRaw, move |new, old, key| {
        log.borrow_mut().push((new.clone(), old.clone(), key));
        Ok(())
    })
    .forget();

    s.set(StateValue::ShowRaw(false));

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], (StateValue::ShowRaw(false), StateValue::ShowRaw(true), StateKey::ShowRaw));
}

#[test]
fn set_silent_writes_without_notifying() {
    let s = store();
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let _sub = s.subscribe(StateKey::Fps, move |_, _, _| {
        c.set(c.get() + 1);
        Ok(())
    });

    s.set_silent(StateValue::Fps(30.0));

    assert_eq!(count.get(), 0);
    assert_eq!(s.fps(), 30.0);
}

#[test]
fn subscribers_of_other_keys_are_not_called() {
    let s = store();
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let _sub = s.subscribe(StateKey::ShowFiltered, move |_, _, _| {
        c.set(c.get() + 1);
        Ok(())
    });

    s.set(StateValue::ShowRaw(false));

    assert_eq!(count.get(), 0);
}

// =============================================================
// update
// =============================================================

#[test]
fn update_notifies_each_key_once_after_all_writes() {
    let s = Rc::new(store());
    let observed = Rc::new(RefCell::new(Vec::new()));

    let reader = Rc::clone(&s);
    let log = Rc::clone(&observed);
    let _sub = s.subscribe(StateKey::ShowRaw, move |_, _, _| {
        log.borrow_mut().push(reader.performance_mode());
        Ok(())
    });

    s.update([StateValue::ShowRaw(false), StateValue::PerformanceMode(true)]);

    assert_eq!(*observed.borrow(), vec![true]);
}

#[test]
fn update_with_repeated_key_reports_pre_batch_old_value() {
    let s = store();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let _sub = s.subscribe(StateKey::TargetFps, move |new, old, _| {
        log.borrow_mut().push((new.clone(), old.clone()));
        Ok(())
    });

    s.update([StateValue::TargetFps(30), StateValue::TargetFps(15)]);

    assert_eq!(*seen.borrow(), vec![(StateValue::TargetFps(15), StateValue::TargetFps(60))]);
}

#[test]
fn update_silent_does_not_notify() {
    let s = store();
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let _sub = s.subscribe(StateKey::ShowRaw, move |_, _, _| {
        c.set(c.get() + 1);
        Ok(())
    });

    s.update_silent([StateValue::ShowRaw(false)]);

    assert_eq!(count.get(), 0);
    assert!(!s.show_raw());
}

// =============================================================
// Subscriptions
// =============================================================

#[test]
fn dropping_the_subscription_unsubscribes() {
    let s = store();
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let sub = s.subscribe(StateKey::ShowRaw, move |_, _, _| {
        c.set(c.get() + 1);
        Ok(())
    });
    assert_eq!(s.subscriber_count(StateKey::ShowRaw), 1);

    sub.unsubscribe();
    s.set(StateValue::ShowRaw(false));

    assert_eq!(count.get(), 0);
    assert_eq!(s.subscriber_count(StateKey::ShowRaw), 0);
}

#[test]
fn failing_subscriber_does_not_block_others() {
    let s = store();
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let _bad = s.subscribe(StateKey::ShowRaw, |_, _, _| Err(String::from("boom")));
    let _good = s.subscribe(StateKey::ShowRaw, move |_, _, _| {
        c.set(c.get() + 1);
        Ok(())
    });

    s.set(StateValue::ShowRaw(false));

    assert_eq!(count.get(), 1);
}

#[test]
fn subscriber_may_write_from_inside_callback() {
    let s = Rc::new(store());
    let writer = Rc::clone(&s);
    let _sub = s.subscribe(StateKey::ShowRaw, move |new, _, _| {
        if let StateValue::ShowRaw(flag) = new {
            writer.set(StateValue::ShowFiltered(*flag));
        }
        Ok(())
    });

    s.set(StateValue::ShowRaw(false));

    assert!(!s.show_filtered());
}

#[test]
fn subscriber_may_unsubscribe_itself() {
    let s = Rc::new(store());
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let count = Rc::new(Cell::new(0));

    let holder = Rc::clone(&slot);
    let c = Rc::clone(&count);
    let sub = s.subscribe(StateKey::ShowRaw, move |_, _, _| {
        c.set(c.get() + 1);
        holder.borrow_mut().take();
        Ok(())
    });
    *slot.borrow_mut() = Some(sub);

    s.set(StateValue::ShowRaw(false));
    s.set(StateValue::ShowRaw(true));

    assert_eq!(count.get(), 1);
}

#[test]
fn subscription_outliving_store_is_harmless() {
    let sub = {
        let s = store();
        s.subscribe(StateKey::ShowRaw, |_, _, _| Ok(()))
    };
    drop(sub);
}

// =============================================================
// Sensors
// =============================================================

#[test]
fn sensor_mutations_notify_and_replace_the_map() {
    let s = store();
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let _sub = s.subscribe(StateKey::Sensors, move |_, _, _| {
        c.set(c.get() + 1);
        Ok(())
    });

    s.set_sensor(Sensor::new("a"));
    let before = s.sensors();
    s.set_sensor(Sensor::new("b"));

    assert_eq!(count.get(), 2);
    assert_eq!(before.len(), 1);
    assert_eq!(s.sensors().len(), 2);
}

#[test]
fn update_sensor_builds_a_new_value() {
    let s = store();
    s.set_sensor(Sensor::new("a"));
    let id = SensorId::new("a");

    let pose = Pose { tx: 1.0, ty: 2.0, theta_deg: 90.0 };
    assert!(s.update_sensor(&id, |sensor| sensor.with_pose(pose)));
    assert!(!s.update_sensor(&SensorId::new("missing"), Sensor::clone));

    assert_eq!(s.get_sensor(&id).map(|sensor| sensor.pose), Some(pose));
}

#[test]
fn remove_and_clear_sensors() {
    let s = store();
    s.replace_sensors([Sensor::new("a"), Sensor::new("b")]);

    assert!(s.remove_sensor(&SensorId::new("a")).is_some());
    assert!(s.remove_sensor(&SensorId::new("a")).is_none());
    assert_eq!(s.sensors().len(), 1);

    s.clear_sensors();
    assert!(s.sensors().is_empty());
}

#[test]
fn replace_sensors_notifies_once() {
    let s = store();
    s.set_sensor(Sensor::new("stale"));
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let _sub = s.subscribe(StateKey::Sensors, move |_, _, _| {
        c.set(c.get() + 1);
        Ok(())
    });

    s.replace_sensors([Sensor::new("a"), Sensor::new("b"), Sensor::new("c")]);

    assert_eq!(count.get(), 1);
    assert!(s.get_sensor(&SensorId::new("stale")).is_none());
    assert_eq!(s.sensors().len(), 3);
}

// =============================================================
// Typed reads
// =============================================================

#[test]
fn typed_reads_follow_writes() {
    let s = store();
    s.set(StateValue::Selection(Selection::Roi { kind: RoiKind::Include, index: 0 }));
    s.set(StateValue::Frame(FrameInfo { seq: 42, source_ts: 7, received_at: 1.0 }));

    assert_eq!(s.selection(), Selection::Roi { kind: RoiKind::Include, index: 0 });
    assert_eq!(s.last_seq(), 42);
}
