#![allow(clippy::float_cmp)]

use super::*;
use crate::model::{Pose, Sensor};
use crate::{decode_message, encode_message};

#[test]
fn snapshot_decodes_sensors_sinks_and_mask() {
    let msg = decode_message(
        r#"{
            "type": "sensor.snapshot",
            "sensors": [{"id": "a", "pose": {"tx": 1, "ty": 2, "theta_deg": 0}}],
            "publishers": {"sinks": [{"type": "nng", "url": "tcp://x:1"}]},
            "world_mask": {"includes": [[[0,0],[1,0],[1,1]]], "excludes": []}
        }"#,
    )
    .expect("decode");
    let ServerMessage::SensorSnapshot { sensors, publishers, filter_config, world_mask } = msg else {
        panic!("wrong variant");
    };
    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].pose.ty, 2.0);
    assert_eq!(publishers.expect("publishers").sinks.len(), 1);
    assert!(filter_config.is_none());
    assert_eq!(world_mask.expect("mask").include.len(), 1);
}

#[test]
fn sensor_updated_reads_client_id() {
    let msg = decode_message(r#"{"type":"sensor.updated","sensor":{"id":"a"},"clientId":"client_1"}"#)
        .expect("decode");
    let ServerMessage::SensorUpdated { client_id, .. } = msg else {
        panic!("wrong variant");
    };
    assert_eq!(client_id.as_deref(), Some("client_1"));
}

#[test]
fn ok_reads_ref_field() {
    let msg = decode_message(r#"{"type":"ok","ref":"sensor.update"}"#).expect("decode");
    assert_eq!(msg, ServerMessage::Ok { reference: Some("sensor.update".into()), sensor: None });
}

#[test]
fn error_without_message_is_empty_text() {
    let msg = decode_message(r#"{"type":"error"}"#).expect("decode");
    assert_eq!(msg, ServerMessage::Error { message: String::new() });
}

#[test]
fn filtered_lite_tolerates_missing_sequence() {
    let msg = decode_message(r#"{"type":"filtered-lite","xy":[1,2],"sid":[3]}"#).expect("decode");
    assert_eq!(msg.kind(), "filtered-lite");
}

#[test]
fn kind_matches_serialized_tag() {
    let msg = ServerMessage::WorldUpdated { world_mask: crate::WorldMask::default() };
    let json = serde_json::to_value(&msg).expect("serialize");
    assert_eq!(json["type"], msg.kind());
}

#[test]
fn sensor_update_carries_client_id_when_set() {
    let msg = ClientMessage::SensorUpdate {
        id: "a".into(),
        patch: crate::SensorPatch::pose(Pose { tx: 1.0, ty: 2.0, theta_deg: 30.0 }),
        client_id: Some("client_x".into()),
    };
    let json: serde_json::Value = serde_json::from_str(&encode_message(&msg)).expect("json");
    assert_eq!(json["type"], "sensor.update");
    assert_eq!(json["id"], "a");
    assert_eq!(json["clientId"], "client_x");
    assert_eq!(json["patch"]["pose"]["theta_deg"], 30.0);
}

#[test]
fn sensor_update_omits_absent_client_id() {
    let msg = ClientMessage::SensorUpdate { id: "a".into(), patch: crate::SensorPatch::default(), client_id: None };
    let json: serde_json::Value = serde_json::from_str(&encode_message(&msg)).expect("json");
    assert!(json.get("clientId").is_none());
}

#[test]
fn world_update_nests_mask_under_patch() {
    let msg = ClientMessage::world_update(crate::WorldMask::default());
    let json: serde_json::Value = serde_json::from_str(&encode_message(&msg)).expect("json");
    assert_eq!(json["type"], "world.update");
    assert!(json["patch"]["world_mask"]["includes"].is_array());
    assert!(json["patch"]["world_mask"]["excludes"].is_array());
}

#[test]
fn enable_message_shape() {
    let msg = ClientMessage::SensorEnable { id: Sensor::new("s1").id, enabled: false };
    let json: serde_json::Value = serde_json::from_str(&encode_message(&msg)).expect("json");
    assert_eq!(json, serde_json::json!({"type": "sensor.enable", "id": "s1", "enabled": false}));
}
