use super::*;
use crate::config::ClientConfig;
use crate::features::form::MemoryForm;
use futures::channel::mpsc::{UnboundedReceiver, unbounded};

fn connected() -> (Transport, UnboundedReceiver<String>) {
    let t = Transport::new(Rc::new(Store::with_client_id("client_test")), ClientConfig::default());
    let (tx, mut rx) = unbounded();
    t.begin_connect();
    t.on_open(tx, 0.0);
    while let Ok(Some(_)) = rx.try_next() {}
    (t, rx)
}

#[test]
fn defaults_are_valid() {
    assert!(validate(&DbscanConfig::default()).is_empty());
}

#[test]
fn zero_eps_is_rejected_and_nothing_is_sent() {
    let (t, mut rx) = connected();
    let config = DbscanConfig { eps_norm: 0.0, min_pts: 5, ..DbscanConfig::default() };
    assert!(publish(&t, config, 0.0).is_none());
    assert!(rx.try_next().is_err());
    let msg = t.store().panel_message().expect("inline message");
    assert!(msg.text.starts_with("eps_norm"));
    assert_eq!(t.store().dbscan_config(), DbscanConfig::default());
}

#[test]
fn height_band_must_be_ordered() {
    let config = DbscanConfig { h_min: 0.2, h_max: 0.2, ..DbscanConfig::default() };
    let fields: Vec<_> = validate(&config).iter().map(|e| e.field).collect();
    assert_eq!(fields, vec!["h_max"]);
}

#[test]
fn form_submit_sends_wire_names() {
    let (t, mut rx) = connected();
    let form = MemoryForm::new().with_text("minPts", "7").with_text("eps_norm", "");
    let sent = submit(&t, &form, 0.0).expect("sent");
    assert_eq!(sent.min_pts, 7);
    let text = rx.try_next().ok().flatten().expect("outbound");
    let value: serde_json::Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["type"], "dbscan.update");
    assert_eq!(value["config"]["minPts"], 7);
    assert_eq!(value["config"]["eps_norm"], 2.5);
}

#[test]
fn disconnected_publish_reports_failure() {
    let t = Transport::new(Rc::new(Store::with_client_id("client_test")), ClientConfig::default());
    assert!(publish(&t, DbscanConfig::default(), 0.0).is_none());
    assert!(t.store().notice().is_some());
}
