#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn filter_defaults_match_factory_values() {
    let config = FilterConfig::default();
    assert!(config.prefilter.enabled);
    assert_eq!(config.prefilter.neighborhood.k, 5);
    assert_eq!(config.prefilter.spike_removal.window_size, 3);
    assert!(!config.prefilter.intensity_filter.enabled);
    assert_eq!(config.postfilter.isolation_removal.required_neighbors, 2);
}

#[test]
fn partial_filter_config_fills_defaults() {
    let config: FilterConfig = serde_json::from_value(serde_json::json!({
        "prefilter": {"neighborhood": {"k": 9}}
    }))
    .expect("config");
    assert_eq!(config.prefilter.neighborhood.k, 9);
    assert_eq!(config.prefilter.neighborhood.r_base, 0.05);
    assert_eq!(config.postfilter, Postfilter::default());
}

#[test]
fn dbscan_uses_hub_field_names() {
    let json = serde_json::to_value(DbscanConfig::default()).expect("serialize");
    assert_eq!(json["minPts"], 5);
    assert_eq!(json["R_max"], 5);
    assert_eq!(json["M_max"], 600);
    assert_eq!(json["eps_norm"], 2.5);
}

#[test]
fn nng_sink_decodes_with_index_fallback() {
    let sink: Sink = serde_json::from_value(serde_json::json!({
        "index": 2,
        "type": "nng",
        "url": "tcp://0.0.0.0:5555",
        "encoding": "json",
        "rate_limit": 10
    }))
    .expect("sink");
    assert_eq!(sink.kind, SinkKind::Nng { encoding: SinkEncoding::Json });
    assert_eq!(sink.topic, "clusters");
    assert!(sink.enabled);
    assert_eq!(sink.address(0), SinkId("2".into()));
}

#[test]
fn osc_sink_prefers_stable_id() {
    let sink: Sink = serde_json::from_value(serde_json::json!({
        "id": "sink-a",
        "index": 0,
        "type": "osc",
        "url": "osc://127.0.0.1:9000",
        "in_bundle": true
    }))
    .expect("sink");
    assert_eq!(sink.kind, SinkKind::Osc { in_bundle: true, bundle_fragment_size: 1024 });
    assert_eq!(sink.address(5), SinkId("sink-a".into()));
}

#[test]
fn sink_without_id_or_index_uses_position() {
    let sink = Sink::template(false);
    assert_eq!(sink.address(3), SinkId("3".into()));
    assert_eq!(sink.type_name(), "nng");
}

#[test]
fn sink_serializes_type_tag_inline() {
    let json = serde_json::to_value(Sink::template(true)).expect("serialize");
    assert_eq!(json["type"], "osc");
    assert_eq!(json["bundle_fragment_size"], 1024);
    assert!(json.get("id").is_none());
}
