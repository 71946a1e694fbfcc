#![allow(clippy::float_cmp)]

use super::*;
use crate::config::ClientConfig;
use crate::features::form::MemoryForm;
use futures::channel::mpsc::{UnboundedReceiver, unbounded};

// =============================================================================
// HELPERS
// =============================================================================

fn transport() -> Transport {
    Transport::new(Rc::new(Store::with_client_id("client_test")), ClientConfig::default())
}

fn connected() -> (Transport, UnboundedReceiver<String>) {
    let t = transport();
    let (tx, mut rx) = unbounded();
    t.begin_connect();
    t.on_open(tx, 0.0);
    while let Ok(Some(_)) = rx.try_next() {}
    (t, rx)
}

fn next_json(rx: &mut UnboundedReceiver<String>) -> serde_json::Value {
    let text = rx.try_next().ok().flatten().expect("outbound message");
    serde_json::from_str(&text).expect("json")
}

fn detailed_sensor(id: &str) -> Sensor {
    Sensor {
        endpoint: Some(Endpoint { host: "10.0.0.5".into(), port: 10940 }),
        skip_step: Some(2),
        mask: Some(SensorMask { angle: Some(AngleMask { min_deg: -90.0, max_deg: 90.0 }), range: None }),
        ..Sensor::new(id)
    }
}

// =============================================================================
// LIST
// =============================================================================

#[test]
fn rows_sort_by_slot_then_id() {
    let store = Store::with_client_id("client_test");
    store.set_sensor(Sensor { slot: Some(1), ..Sensor::new("b") });
    store.set_sensor(Sensor { slot: Some(0), ..Sensor::new("z") });
    store.set_sensor(Sensor::new("a"));
    store.set_sensor(Sensor { slot: Some(1), name: Some("Front".into()), ..Sensor::new("a1") });

    let ids: Vec<String> = rows(&store).into_iter().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, vec!["z", "a1", "b", "a"]);
    assert_eq!(rows(&store)[1].label, "Front");
}

// =============================================================================
// POSE / ENABLE
// =============================================================================

#[test]
fn pose_edit_is_applied_locally() {
    let store = Store::with_client_id("client_test");
    store.set_sensor(Sensor::new("lidar-a"));
    let id = SensorId::new("lidar-a");

    let pose = apply_pose_edit(&store, &id, PoseField::Tx, "1.5").expect("known sensor");
    assert_eq!(pose.tx, 1.5);
    apply_pose_edit(&store, &id, PoseField::Theta, "45");
    assert_eq!(store.get_sensor(&id).map(|s| s.pose), Some(Pose { tx: 1.5, ty: 0.0, theta_deg: 45.0 }));
}

#[test]
fn unparsable_pose_text_keeps_current_value() {
    let store = Store::with_client_id("client_test");
    store.set_sensor(Sensor::new("lidar-a").with_pose(Pose { tx: 2.0, ty: 3.0, theta_deg: 0.0 }));
    let pose = apply_pose_edit(&store, &SensorId::new("lidar-a"), PoseField::Ty, "abc").expect("known sensor");
    assert_eq!(pose.ty, 3.0);
    assert!(apply_pose_edit(&store, &SensorId::new("missing"), PoseField::Tx, "1").is_none());
}

#[test]
fn send_pose_carries_store_pose_and_client_id() {
    let (t, mut rx) = connected();
    t.store().set_sensor(Sensor::new("lidar-a").with_pose(Pose { tx: 0.5, ty: -1.0, theta_deg: 10.0 }));
    assert!(send_pose(&t, &SensorId::new("lidar-a")));
    let sent = next_json(&mut rx);
    assert_eq!(sent["type"], "sensor.update");
    assert_eq!(sent["clientId"], "client_test");
    assert_eq!(sent["patch"]["pose"]["ty"], -1.0);
    assert!(!send_pose(&t, &SensorId::new("missing")));
}

#[test]
fn pose_editor_keeps_one_timer_per_sensor() {
    let t = Rc::new(transport());
    t.store().set_sensor(Sensor::new("lidar-a"));
    let editor = PoseEditor::new();
    let id = SensorId::new("lidar-a");
    let before = editor.timer(&id).arm();
    editor.edit(&t, &id, PoseField::Tx, "4");
    assert!(!editor.timer(&id).is_current(before));
    assert_eq!(t.store().get_sensor(&id).map(|s| s.pose.tx), Some(4.0));
}

#[test]
fn enable_toggle_is_optimistic_and_sent() {
    let (t, mut rx) = connected();
    t.store().set_sensor(Sensor::new("lidar-a"));
    assert!(set_enabled(&t, &SensorId::new("lidar-a"), false));
    assert_eq!(t.store().get_sensor(&SensorId::new("lidar-a")).map(|s| s.enabled), Some(false));
    let sent = next_json(&mut rx);
    assert_eq!(sent["type"], "sensor.enable");
    assert_eq!(sent["enabled"], false);
}

#[test]
fn enable_toggle_without_link_reports_inline() {
    let t = transport();
    t.store().set_sensor(Sensor::new("lidar-a"));
    assert!(!set_enabled(&t, &SensorId::new("lidar-a"), false));
    let msg = t.store().panel_message().expect("inline message");
    assert!(msg.is_error);
    assert_eq!(msg.panel, Panel::Sensors);
}

// =============================================================================
// DETAILS MODAL
// =============================================================================

#[test]
fn patch_only_carries_fields_the_sensor_reported() {
    let editable = EditableSensor::from_sensor(&detailed_sensor("lidar-a"));
    let form = MemoryForm::new();
    editable.write_form(&form);
    form.set_text("skip_step", "0");
    form.set_text("mask.angle.max_deg", "120");

    let patch = editable.patch_from_form(&form);
    assert_eq!(patch.skip_step, Some(1));
    assert_eq!(patch.endpoint.as_ref().map(|e| e.port), Some(10940));
    assert_eq!(patch.mask.and_then(|m| m.angle).map(|a| a.max_deg), Some(120.0));
    assert!(patch.mask.and_then(|m| m.range).is_none());
    assert!(patch.ignore_checksum_error.is_none());
    assert!(patch.pose.is_none());
}

#[test]
fn modal_closes_on_matching_ack_only() {
    let (t, mut rx) = connected();
    t.store().set_sensor(detailed_sensor("lidar-a"));
    let form = MemoryForm::new();
    let mut modal = SensorModal::new();
    assert!(modal.open(t.store(), &SensorId::new("lidar-a"), &form));
    assert_eq!(form.text("endpoint.host").as_deref(), Some("10.0.0.5"));

    form.set_text("endpoint.port", "10941");
    assert!(modal.save(&t, &form));
    assert!(modal.is_saving());
    assert_eq!(next_json(&mut rx)["patch"]["endpoint"]["port"], 10941);

    let other = ServerMessage::SensorUpdated { sensor: Sensor::new("lidar-b"), client_id: None };
    assert!(!modal.on_message(&other));
    assert!(modal.is_open());

    let ack = ServerMessage::Ok { reference: Some("sensor.update".into()), sensor: Some(Sensor::new("lidar-a")) };
    assert!(modal.on_message(&ack));
    assert!(!modal.is_open());
}

#[test]
fn modal_refresh_closes_when_sensor_disappears() {
    let store = Store::with_client_id("client_test");
    store.set_sensor(Sensor::new("lidar-a"));
    let form = MemoryForm::new();
    let mut modal = SensorModal::new();
    assert!(!modal.open(&store, &SensorId::new("missing"), &form));
    assert!(modal.open(&store, &SensorId::new("lidar-a"), &form));
    store.clear_sensors();
    modal.refresh(&store, &form);
    assert!(!modal.is_open());
}

#[test]
fn registered_handlers_close_modal_on_echo() {
    let (t, _rx) = connected();
    let t = Rc::new(t);
    t.store().set_sensor(detailed_sensor("lidar-a"));
    let modal = Rc::new(RefCell::new(SensorModal::new()));
    register_handlers(&t, &modal);

    let form = MemoryForm::new();
    assert!(modal.borrow_mut().open(t.store(), &SensorId::new("lidar-a"), &form));
    assert!(modal.borrow_mut().save(&t, &form));

    t.on_message(r#"{"type":"sensor.updated","clientId":"client_test","sensor":{"id":"lidar-a"}}"#, 0.0);
    assert!(!modal.borrow().is_open());

    t.on_message(r#"{"type":"error","message":"bad endpoint"}"#, 0.0);
    let msg = t.store().panel_message().expect("inline message");
    assert_eq!(msg.text, "bad endpoint");
    assert!(msg.is_error);
}

// =============================================================================
// REST
// =============================================================================

#[test]
fn new_sensor_form_falls_back_to_defaults() {
    let form = MemoryForm::new().with_text("name", "  ").with_text("mode", "md");
    let body = new_sensor_from_form(&form);
    assert_eq!(body.kind, "hokuyo_urg_eth");
    assert_eq!(body.endpoint, "192.168.1.10:10940");
    assert_eq!(body.mode, SensorMode::MD);
    assert!(body.name.is_none());
    assert!(body.enabled);
}

#[test]
fn delete_of_unknown_sensor_is_refused_locally() {
    let t = transport();
    let api = Api::new(t.config());
    let ok = futures::executor::block_on(delete(&api, &t, &SensorId::new("ghost")));
    assert!(!ok);
    let msg = t.store().panel_message().expect("inline message");
    assert_eq!(msg.text, "Sensor not found or missing config ID");
    assert!(t.store().notice().is_none());
}

#[test]
fn failed_create_reports_toast_and_inline() {
    let t = transport();
    let api = Api::new(t.config());
    let body = new_sensor_from_form(&MemoryForm::new());
    let ok = futures::executor::block_on(create(&api, &t, &body));
    assert!(!ok);
    let msg = t.store().panel_message().expect("inline message");
    assert!(msg.text.starts_with("Failed to add sensor: "));
    assert_eq!(t.store().notice().map(|n| n.level), Some(NoticeLevel::Error));
}
