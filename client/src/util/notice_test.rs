#![allow(clippy::float_cmp)]

use super::*;

fn store() -> Store {
    Store::with_client_id("client_test")
}

#[test]
fn notice_carries_expiry() {
    let s = store();
    notify(&s, NoticeLevel::Success, "saved", 1000.0);
    let notice = s.notice().expect("notice");
    assert_eq!(notice.text, "saved");
    assert_eq!(notice.expires_at, 3500.0);
}

#[test]
fn expire_clears_only_when_due() {
    let s = store();
    notify(&s, NoticeLevel::Info, "hello", 0.0);
    panel_message(&s, Panel::Filters, "ok", false, 0.0);

    assert!(!expire(&s, 1000.0));
    assert!(s.notice().is_some());

    // Panel message lifetime is shorter than the notice lifetime.
    assert!(expire(&s, 2000.0));
    assert!(s.panel_message().is_none());
    assert!(s.notice().is_some());

    assert!(expire(&s, 2500.0));
    assert!(s.notice().is_none());
}

#[test]
fn failure_sets_both_channels() {
    let s = store();
    report_failure(&s, Panel::Sinks, "HTTP 500", 0.0);
    assert_eq!(s.notice().map(|n| n.level), Some(NoticeLevel::Error));
    let msg = s.panel_message().expect("panel message");
    assert!(msg.is_error);
    assert_eq!(msg.panel, Panel::Sinks);
}
