//! Transient user feedback: toast notices and inline panel messages.
//!
//! Both live in the store with an absolute expiry time. The page's stats
//! timer calls [`expire`] so they clear on their own.

#[cfg(test)]
#[path = "notice_test.rs"]
mod notice_test;

use store::{Notice, NoticeLevel, Panel, PanelMessage, StateValue, Store};

use crate::config::{DEFAULT_NOTICE_MS, DEFAULT_PANEL_MESSAGE_MS};

/// Show a toast that clears after the default notice lifetime.
pub fn notify(store: &Store, level: NoticeLevel, text: impl Into<String>, now_ms: f64) {
    let text = text.into();
    match level {
        NoticeLevel::Error => log::warn!("notice: {text}"),
        NoticeLevel::Warning => log::info!("notice: {text}"),
        NoticeLevel::Info | NoticeLevel::Success => log::debug!("notice: {text}"),
    }
    store.set(StateValue::Notice(Some(Notice { level, text, expires_at: now_ms + DEFAULT_NOTICE_MS })));
}

/// Show an inline message under one panel.
pub fn panel_message(store: &Store, panel: Panel, text: impl Into<String>, is_error: bool, now_ms: f64) {
    store.set(StateValue::PanelMessage(Some(PanelMessage {
        panel,
        text: text.into(),
        is_error,
        expires_at: now_ms + DEFAULT_PANEL_MESSAGE_MS,
    })));
}

/// Report a failed operation both as a toast and inline.
pub fn report_failure(store: &Store, panel: Panel, text: impl Into<String>, now_ms: f64) {
    let text = text.into();
    panel_message(store, panel, text.clone(), true, now_ms);
    notify(store, NoticeLevel::Error, text, now_ms);
}

/// Clear the notice and panel message once their time is up. Returns
/// whether anything was cleared.
pub fn expire(store: &Store, now_ms: f64) -> bool {
    let mut cleared = Vec::new();
    if store.notice().is_some_and(|n| n.expires_at <= now_ms) {
        cleared.push(StateValue::Notice(None));
    }
    if store.panel_message().is_some_and(|m| m.expires_at <= now_ms) {
        cleared.push(StateValue::PanelMessage(None));
    }
    let any = !cleared.is_empty();
    if any {
        store.update(cleared);
    }
    any
}
