//! Sinks panel: cluster publishers configured on the hub.
//!
//! Sinks are not mirrored locally. Every create, update or delete is a REST
//! round trip followed by a snapshot request, and the list is redrawn from
//! whatever the snapshot reports. A sink is addressed by its stable id when
//! the hub supplies one and by list position otherwise.

#[cfg(test)]
#[path = "sinks_test.rs"]
mod sinks_test;

use store::{NoticeLevel, Panel, Store};
use wire::config::SinkEncoding;
use wire::{Sink, SinkId, SinkKind};

use super::form::{FormFields, ValidationError, count, flag, text_or};
use crate::net::api::{Api, ApiError};
use crate::net::transport::Transport;
use crate::util::clock::now_ms;
use crate::util::notice;

/// One row of the sinks list.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkRow {
    pub address: SinkId,
    pub enabled: bool,
    pub summary: String,
}

/// Rows in hub order.
#[must_use]
pub fn rows(store: &Store) -> Vec<SinkRow> {
    store
        .sinks()
        .iter()
        .enumerate()
        .map(|(position, sink)| SinkRow {
            address: sink.address(position),
            enabled: sink.enabled,
            summary: summary(sink),
        })
        .collect()
}

/// One-line description, e.g. `nng tcp://0.0.0.0:5555 [clusters] 30/s msgpack`.
#[must_use]
pub fn summary(sink: &Sink) -> String {
    let rate = if sink.rate_limit == 0 { String::from("unlimited") } else { format!("{}/s", sink.rate_limit) };
    let detail = match &sink.kind {
        SinkKind::Nng { encoding } => encoding_name(*encoding).to_owned(),
        SinkKind::Osc { in_bundle: true, bundle_fragment_size } => format!("bundle {bundle_fragment_size}B"),
        SinkKind::Osc { in_bundle: false, .. } => String::from("messages"),
    };
    format!("{} {} [{}] {rate} {detail}", sink.type_name(), sink.url, sink.topic)
}

fn encoding_name(encoding: SinkEncoding) -> &'static str {
    match encoding {
        SinkEncoding::Msgpack => "msgpack",
        SinkEncoding::Json => "json",
    }
}

// =============================================================================
// FORM
// =============================================================================

/// Read the sink form. Switching `type` starts from that transport's
/// template; fields the form lacks keep the values of `current`.
#[must_use]
pub fn read_form(form: &impl FormFields, current: &Sink) -> Sink {
    let osc = text_or(form, "type", current.type_name()).eq_ignore_ascii_case("osc");
    let base = if osc == matches!(current.kind, SinkKind::Osc { .. }) { current.clone() } else { Sink::template(osc) };
    let kind = match base.kind {
        SinkKind::Nng { encoding } => {
            let text = text_or(form, "encoding", encoding_name(encoding));
            let encoding = if text.eq_ignore_ascii_case("json") { SinkEncoding::Json } else { SinkEncoding::Msgpack };
            SinkKind::Nng { encoding }
        }
        SinkKind::Osc { in_bundle, bundle_fragment_size } => SinkKind::Osc {
            in_bundle: flag(form, "in_bundle", in_bundle),
            bundle_fragment_size: count(form, "bundle_fragment_size", bundle_fragment_size),
        },
    };
    Sink {
        id: current.id.clone(),
        index: current.index,
        kind,
        enabled: flag(form, "enabled", base.enabled),
        url: text_or(form, "url", &base.url).trim().to_owned(),
        topic: text_or(form, "topic", &base.topic).trim().to_owned(),
        rate_limit: count(form, "rate_limit", base.rate_limit),
    }
}

pub fn write_form(form: &impl FormFields, sink: &Sink) {
    form.set_text("type", sink.type_name());
    form.set_checked("enabled", sink.enabled);
    form.set_text("url", &sink.url);
    form.set_text("topic", &sink.topic);
    form.set_text("rate_limit", &sink.rate_limit.to_string());
    match &sink.kind {
        SinkKind::Nng { encoding } => form.set_text("encoding", encoding_name(*encoding)),
        SinkKind::Osc { in_bundle, bundle_fragment_size } => {
            form.set_checked("in_bundle", *in_bundle);
            form.set_text("bundle_fragment_size", &bundle_fragment_size.to_string());
        }
    }
}

/// The hub rejects a URL whose scheme does not match the transport, so it
/// is checked before the round trip.
#[must_use]
pub fn validate(sink: &Sink) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let scheme = match sink.kind {
        SinkKind::Nng { .. } => "tcp://",
        SinkKind::Osc { .. } => "osc://",
    };
    if !sink.url.starts_with(scheme) || sink.url.len() == scheme.len() {
        errors.push(ValidationError::new("url", format!("must start with {scheme}")));
    }
    if sink.topic.is_empty() {
        errors.push(ValidationError::new("topic", "must not be empty"));
    }
    if let SinkKind::Osc { in_bundle: true, bundle_fragment_size: 0 } = sink.kind {
        errors.push(ValidationError::new("bundle_fragment_size", "must be > 0 when bundling"));
    }
    errors
}

fn check(store: &Store, sink: &Sink) -> bool {
    match validate(sink).first() {
        Some(first) => {
            notice::panel_message(store, Panel::Sinks, first.to_string(), true, now_ms());
            false
        }
        None => true,
    }
}

// =============================================================================
// REST
// =============================================================================

/// Address of the sink at `position` in the current list.
#[must_use]
pub fn address_at(store: &Store, position: usize) -> Option<SinkId> {
    store.sinks().get(position).map(|sink| sink.address(position))
}

/// Create a sink from the form, starting at the nng or osc template.
pub async fn create(api: &Api, transport: &Transport, form: &impl FormFields) -> bool {
    let osc = form.text("type").is_some_and(|t| t.eq_ignore_ascii_case("osc"));
    let sink = read_form(form, &Sink::template(osc));
    if !check(transport.store(), &sink) {
        return false;
    }
    let result = api.create_sink(&sink).await;
    finish(transport, result.map(drop), "Sink added", "Failed to add sink")
}

/// Replace the sink at `position` with the form's values.
pub async fn update(api: &Api, transport: &Transport, position: usize, form: &impl FormFields) -> bool {
    let store = transport.store();
    let Some(current) = store.sinks().get(position).cloned() else {
        notice::panel_message(store, Panel::Sinks, "Sink not found", true, now_ms());
        return false;
    };
    let sink = read_form(form, &current);
    if !check(store, &sink) {
        return false;
    }
    let address = current.address(position);
    let result = api.update_sink(&address, &sink).await;
    finish(transport, result.map(drop), &format!("Sink {address} updated"), "Failed to update sink")
}

/// Flip one sink's `enabled` flag.
pub async fn set_enabled(api: &Api, transport: &Transport, position: usize, enabled: bool) -> bool {
    let store = transport.store();
    let Some(current) = store.sinks().get(position).cloned() else {
        notice::panel_message(store, Panel::Sinks, "Sink not found", true, now_ms());
        return false;
    };
    let address = current.address(position);
    let sink = Sink { enabled, ..current };
    let state = if enabled { "enabled" } else { "disabled" };
    let result = api.update_sink(&address, &sink).await;
    finish(transport, result.map(drop), &format!("Sink {address} {state}"), "Failed to update sink")
}

pub async fn delete(api: &Api, transport: &Transport, position: usize) -> bool {
    let Some(address) = address_at(transport.store(), position) else {
        notice::panel_message(transport.store(), Panel::Sinks, "Sink not found", true, now_ms());
        return false;
    };
    let result = api.delete_sink(&address).await;
    finish(transport, result, &format!("Sink {address} deleted"), "Failed to delete sink")
}

fn finish(transport: &Transport, result: Result<(), ApiError>, ok_text: &str, fail_text: &str) -> bool {
    let store = transport.store();
    match result {
        Ok(()) => {
            notice::panel_message(store, Panel::Sinks, ok_text, false, now_ms());
            notice::notify(store, NoticeLevel::Success, ok_text, now_ms());
            transport.request_snapshot();
            true
        }
        Err(err) => {
            log::warn!("{fail_text}: {err}");
            notice::report_failure(store, Panel::Sinks, format!("{fail_text}: {err}"), now_ms());
            false
        }
    }
}
