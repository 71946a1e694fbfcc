#![allow(clippy::float_cmp)]

use super::*;

// =============================================================================
// SensorId
// =============================================================================

#[test]
fn sensor_id_accepts_string_and_integer() {
    let a: SensorId = serde_json::from_str(r#""lidar-a""#).expect("string id");
    let b: SensorId = serde_json::from_str("3").expect("integer id");
    assert_eq!(a.as_str(), "lidar-a");
    assert_eq!(b.as_str(), "3");
}

#[test]
fn sensor_id_serializes_as_string() {
    let json = serde_json::to_string(&SensorId::new("7")).expect("serialize");
    assert_eq!(json, r#""7""#);
}

// =============================================================================
// Endpoint
// =============================================================================

#[test]
fn endpoint_parses_host_port_string() {
    let ep: Endpoint = serde_json::from_str(r#""192.168.1.10:10940""#).expect("endpoint");
    assert_eq!(ep, Endpoint { host: "192.168.1.10".into(), port: 10940 });
}

#[test]
fn endpoint_accepts_object_form() {
    let ep: Endpoint = serde_json::from_str(r#"{"host":"h","port":1}"#).expect("endpoint");
    assert_eq!(ep, Endpoint { host: "h".into(), port: 1 });
}

#[test]
fn endpoint_without_port_gets_zero() {
    assert_eq!(Endpoint::parse("sensor.local"), Endpoint { host: "sensor.local".into(), port: 0 });
    assert_eq!(Endpoint::parse("h:abc").port, 0);
}

#[test]
fn endpoint_serializes_as_pair() {
    let json = serde_json::to_value(Endpoint { host: "h".into(), port: 2 }).expect("serialize");
    assert_eq!(json, serde_json::json!({"host": "h", "port": 2}));
}

// =============================================================================
// Sensor
// =============================================================================

#[test]
fn sensor_decodes_legacy_shapes() {
    let sensor: Sensor = serde_json::from_value(serde_json::json!({
        "id": 2,
        "enabled": false,
        "pose": {"tx": 1.5, "ty": -2.0, "theta_deg": 90.0},
        "endpoint": "10.0.0.2:10940",
        "mode": "MD",
        "ignore_checksum_error": 1,
        "skip_step": 0,
        "mask": {
            "angle": {"min": -45.0, "max": 45.0},
            "range": {"min_m": 0.2, "max_m": 12.0}
        }
    }))
    .expect("sensor");

    assert_eq!(sensor.id.as_str(), "2");
    assert!(!sensor.enabled);
    assert_eq!(sensor.pose.theta_deg, 90.0);
    assert_eq!(sensor.endpoint, Some(Endpoint { host: "10.0.0.2".into(), port: 10940 }));
    assert_eq!(sensor.mode, SensorMode::MD);
    assert_eq!(sensor.ignore_checksum_error, Some(true));
    assert_eq!(sensor.skip_step, Some(1));
    let mask = sensor.mask.expect("mask");
    assert_eq!(mask.angle, Some(AngleMask { min_deg: -45.0, max_deg: 45.0 }));
    assert_eq!(mask.range, Some(RangeMask { near_m: 0.2, far_m: 12.0 }));
}

#[test]
fn sensor_range_mask_accepts_bare_min_max() {
    let mask: SensorMask =
        serde_json::from_str(r#"{"range":{"min":1.0,"max":4.0}}"#).expect("mask");
    assert_eq!(mask.range, Some(RangeMask { near_m: 1.0, far_m: 4.0 }));
}

#[test]
fn sensor_defaults_to_enabled_me() {
    let sensor: Sensor = serde_json::from_str(r#"{"id":"a"}"#).expect("sensor");
    assert!(sensor.enabled);
    assert_eq!(sensor.mode, SensorMode::ME);
    assert_eq!(sensor.pose, Pose::default());
}

#[test]
fn sensor_label_falls_back_to_slot() {
    let mut sensor = Sensor::new("");
    sensor.slot = Some(4);
    assert_eq!(sensor.label(), "slot4");
    assert_eq!(Sensor::new("front").label(), "front");
}

#[test]
fn sensor_with_pose_leaves_original_untouched() {
    let original = Sensor::new("a");
    let moved = original.with_pose(Pose { tx: 1.0, ty: 2.0, theta_deg: 3.0 });
    assert_eq!(original.pose, Pose::default());
    assert_eq!(moved.pose.ty, 2.0);
    assert_eq!(moved.id, original.id);
}

#[test]
fn pose_rotation_and_translation_compose() {
    let pose = Pose::default().translated(1.0, -1.0).rotated(-15.0);
    assert_eq!(pose, Pose { tx: 1.0, ty: -1.0, theta_deg: -15.0 });
}

#[test]
fn sensor_mode_parse_is_lenient() {
    assert_eq!(SensorMode::parse_lenient("md"), SensorMode::MD);
    assert_eq!(SensorMode::parse_lenient("ME"), SensorMode::ME);
    assert_eq!(SensorMode::parse_lenient(""), SensorMode::ME);
}

// =============================================================================
// SensorPatch
// =============================================================================

#[test]
fn patch_serializes_only_present_fields() {
    let patch = SensorPatch::pose(Pose { tx: 1.0, ty: 0.0, theta_deg: 0.0 });
    let json = serde_json::to_value(&patch).expect("serialize");
    assert_eq!(json, serde_json::json!({"pose": {"tx": 1.0, "ty": 0.0, "theta_deg": 0.0}}));
}

#[test]
fn patch_apply_clamps_skip_step() {
    let patch = SensorPatch { skip_step: Some(0), enabled: Some(false), ..SensorPatch::default() };
    let next = patch.apply(&Sensor::new("a"));
    assert_eq!(next.skip_step, Some(1));
    assert!(!next.enabled);
}

#[test]
fn empty_patch_reports_empty() {
    assert!(SensorPatch::default().is_empty());
    assert!(!SensorPatch::pose(Pose::default()).is_empty());
}

// =============================================================================
// PointSet
// =============================================================================

#[test]
fn point_set_drops_mismatched_tags() {
    let set = PointSet::new(vec![1.0, 2.0, 3.0, 4.0], vec![7]);
    assert_eq!(set.len(), 2);
    assert!(set.sid.is_empty());
    assert_eq!(set.tag(1), 0);
}

#[test]
fn point_set_drops_dangling_coordinate() {
    let set = PointSet::new(vec![1.0, 2.0, 3.0], vec![]);
    assert_eq!(set.xy, vec![1.0, 2.0]);
    assert_eq!(set.len(), 1);
}

#[test]
fn point_set_iter_yields_tags() {
    let set = PointSet::new(vec![1.0, 2.0, 3.0, 4.0], vec![5, 6]);
    let points: Vec<_> = set.iter().collect();
    assert_eq!(points, vec![(1.0, 2.0, 5), (3.0, 4.0, 6)]);
}

#[test]
fn point_set_filtered_keeps_tags_aligned() {
    let set = PointSet::new(vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0], vec![10, 11, 12]);
    let kept = set.filtered(|_, x, _| x > 0.5);
    assert_eq!(kept.xy, vec![1.0, 1.0, 2.0, 2.0]);
    assert_eq!(kept.sid, vec![11, 12]);
}

// =============================================================================
// WorldMask
// =============================================================================

#[test]
fn world_mask_uses_plural_wire_names() {
    let mask: WorldMask = serde_json::from_value(serde_json::json!({
        "includes": [[[0, 0], [1, 0], [1, 1]]],
        "excludes": []
    }))
    .expect("mask");
    assert_eq!(mask.include.len(), 1);
    assert_eq!(mask.include[0].vertices()[1], [1.0, 0.0]);
    let json = serde_json::to_value(&mask).expect("serialize");
    assert!(json.get("includes").is_some());
    assert!(json.get("excludes").is_some());
}

#[test]
fn polygon_validity_requires_three_vertices() {
    assert!(!Polygon(vec![[0.0, 0.0], [1.0, 0.0]]).is_valid());
    assert!(Polygon(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).is_valid());
}

#[test]
fn world_mask_selects_polygons_by_kind() {
    let mut mask = WorldMask::default();
    mask.polygons_mut(RoiKind::Exclude).push(Polygon::default());
    assert!(mask.polygons(RoiKind::Include).is_empty());
    assert_eq!(mask.polygons(RoiKind::Exclude).len(), 1);
    assert!(!mask.is_empty());
}

#[test]
fn retain_valid_drops_degenerate_polygons() {
    let square = Polygon(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    let mut mask = WorldMask {
        include: vec![Polygon(vec![[0.0, 0.0], [1.0, 1.0]]), square.clone()],
        exclude: vec![Polygon::default()],
    };
    assert_eq!(mask.retain_valid(), 2);
    assert_eq!(mask.include, vec![square]);
    assert!(mask.exclude.is_empty());
    assert_eq!(mask.retain_valid(), 0);
}
