use super::*;

#[test]
fn decode_raw_lite_keeps_points_and_sequence() {
    let msg = decode_message(r#"{"type":"raw-lite","seq":5,"t":100,"xy":[1,2,3,4],"sid":[0,1]}"#)
        .expect("decode should succeed");
    assert_eq!(
        msg,
        ServerMessage::RawLite { seq: 5, t: 100, xy: vec![1.0, 2.0, 3.0, 4.0], sid: vec![0, 1] }
    );
}

#[test]
fn decode_rejects_malformed_json() {
    let err = decode_message("{not json").expect_err("should fail");
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn decode_rejects_missing_type() {
    let err = decode_message(r#"{"seq":1}"#).expect_err("should fail");
    assert!(matches!(err, CodecError::MissingType));
}

#[test]
fn decode_rejects_non_string_type() {
    let err = decode_message(r#"{"type":7}"#).expect_err("should fail");
    assert!(matches!(err, CodecError::MissingType));
}

#[test]
fn decode_reports_unknown_type_by_name() {
    let err = decode_message(r#"{"type":"sensor.reboot"}"#).expect_err("should fail");
    match err {
        CodecError::UnknownType(kind) => assert_eq!(kind, "sensor.reboot"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn decode_reports_schema_errors_with_kind() {
    let err = decode_message(r#"{"type":"sensor.updated","sensor":"nope"}"#).expect_err("should fail");
    match err {
        CodecError::Schema { kind, .. } => assert_eq!(kind, "sensor.updated"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn encode_request_snapshot_is_bare_type() {
    let text = encode_message(&ClientMessage::RequestSnapshot);
    assert_eq!(text, r#"{"type":"sensor.requestSnapshot"}"#);
}

#[test]
fn every_declared_kind_is_unique() {
    let mut kinds = ServerMessage::KINDS.to_vec();
    kinds.sort_unstable();
    kinds.dedup();
    assert_eq!(kinds.len(), ServerMessage::KINDS.len());
}
