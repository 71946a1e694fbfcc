use super::*;
use crate::config::ClientConfig;
use crate::features::form::MemoryForm;
use std::rc::Rc;
use store::StateValue;

fn transport() -> Transport {
    Transport::new(Rc::new(Store::with_client_id("client_test")), ClientConfig::default())
}

fn with_sinks(t: &Transport, sinks: Vec<Sink>) {
    t.store().set(StateValue::Sinks(Rc::new(sinks)));
}

#[test]
fn rows_prefer_stable_ids() {
    let t = transport();
    let legacy = Sink { index: Some(4), ..Sink::template(false) };
    let stable = Sink { id: Some(SinkId("pub-7".into())), ..Sink::template(true) };
    with_sinks(&t, vec![legacy, stable, Sink::template(false)]);

    let addresses: Vec<String> = rows(t.store()).into_iter().map(|r| r.address.0).collect();
    assert_eq!(addresses, vec!["4", "pub-7", "2"]);
}

#[test]
fn summary_describes_transport() {
    assert_eq!(summary(&Sink::template(false)), "nng tcp://localhost:5555 [clusters] 30/s msgpack");
    let osc = Sink {
        kind: SinkKind::Osc { in_bundle: true, bundle_fragment_size: 512 },
        rate_limit: 0,
        ..Sink::template(true)
    };
    assert_eq!(summary(&osc), "osc osc://localhost:8000 [clusters] unlimited bundle 512B");
}

#[test]
fn switching_type_starts_from_template() {
    let form = MemoryForm::new().with_text("type", "osc").with_text("topic", "blobs");
    let sink = read_form(&form, &Sink::template(false));
    assert_eq!(sink.type_name(), "osc");
    assert_eq!(sink.url, "osc://localhost:8000");
    assert_eq!(sink.topic, "blobs");
}

#[test]
fn written_form_reads_back_the_same_sink() {
    let form = MemoryForm::new();
    let sink = Sink {
        kind: SinkKind::Nng { encoding: SinkEncoding::Json },
        url: "tcp://0.0.0.0:6000".into(),
        rate_limit: 10,
        ..Sink::template(false)
    };
    write_form(&form, &sink);
    assert_eq!(read_form(&form, &Sink::template(false)), sink);
}

#[test]
fn url_scheme_must_match_transport() {
    let nng = Sink { url: "osc://x:1".into(), ..Sink::template(false) };
    let fields: Vec<_> = validate(&nng).iter().map(|e| e.field).collect();
    assert_eq!(fields, vec!["url"]);
    assert!(validate(&Sink::template(true)).is_empty());

    let empty_bundle = Sink { kind: SinkKind::Osc { in_bundle: true, bundle_fragment_size: 0 }, ..Sink::template(true) };
    assert_eq!(validate(&empty_bundle)[0].field, "bundle_fragment_size");
}

#[test]
fn invalid_create_never_leaves_the_client() {
    let t = transport();
    let api = Api::new(t.config());
    let form = MemoryForm::new().with_text("type", "nng").with_text("url", "udp://nope");
    assert!(!futures::executor::block_on(create(&api, &t, &form)));
    let msg = t.store().panel_message().expect("inline message");
    assert_eq!(msg.panel, Panel::Sinks);
    assert_eq!(msg.text, "url: must start with tcp://");
    assert!(t.store().notice().is_none());
}

#[test]
fn out_of_range_position_is_reported() {
    let t = transport();
    let api = Api::new(t.config());
    assert!(address_at(t.store(), 0).is_none());
    assert!(!futures::executor::block_on(delete(&api, &t, 0)));
    assert_eq!(t.store().panel_message().map(|m| m.text), Some("Sink not found".into()));
}

#[test]
fn failed_delete_reports_toast_and_inline() {
    let t = transport();
    with_sinks(&t, vec![Sink::template(false)]);
    let api = Api::new(t.config());
    assert!(!futures::executor::block_on(delete(&api, &t, 0)));
    let msg = t.store().panel_message().expect("inline message");
    assert!(msg.text.starts_with("Failed to delete sink: "));
    assert_eq!(t.store().notice().map(|n| n.level), Some(NoticeLevel::Error));
}
