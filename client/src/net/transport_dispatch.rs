//! Built-in inbound dispatch: writes each decoded message into the store.

use std::rc::Rc;

use store::{FrameInfo, NoticeLevel, Selection, StateValue, Store};
use wire::{PointSet, ServerMessage, WorldMask};

use super::Transport;
use crate::util::notice;

pub(super) fn apply(transport: &Transport, message: &ServerMessage, now_ms: f64) {
    let store = transport.store();
    match message {
        ServerMessage::ClustersLite { seq, t, items } => {
            let fps = transport.record_frame(now_ms);
            store.update([
                StateValue::ClusterItems(Rc::new(items.clone())),
                StateValue::Frame(FrameInfo { seq: *seq, source_ts: *t, received_at: now_ms }),
                StateValue::Fps(fps),
            ]);
        }
        ServerMessage::RawLite { seq, t, xy, sid } => {
            let fps = transport.record_frame(now_ms);
            store.update([
                StateValue::RawPoints(Rc::new(PointSet::new(xy.clone(), sid.clone()))),
                StateValue::Frame(FrameInfo { seq: *seq, source_ts: *t, received_at: now_ms }),
                StateValue::Fps(fps),
            ]);
        }
        ServerMessage::FilteredLite { seq, t, xy, sid } => {
            let mut values = vec![StateValue::FilteredPoints(Rc::new(PointSet::new(xy.clone(), sid.clone())))];
            if let Some(seq) = seq {
                values.push(StateValue::Frame(FrameInfo {
                    seq: *seq,
                    source_ts: t.unwrap_or_default(),
                    received_at: now_ms,
                }));
            }
            store.update(values);
        }
        ServerMessage::SensorSnapshot { sensors, publishers, filter_config, world_mask } => {
            log::debug!("snapshot: {} sensors", sensors.len());
            store.replace_sensors(sensors.iter().cloned());
            let mut values = Vec::new();
            if let Some(publishers) = publishers {
                values.push(StateValue::Sinks(Rc::new(publishers.sinks.clone())));
            }
            if let Some(config) = filter_config {
                values.push(StateValue::FilterConfig(*config));
            }
            if let Some(mask) = world_mask {
                values.push(StateValue::WorldMask(valid_mask(mask)));
            }
            store.update(values);
            drop_stale_selection(store);
        }
        ServerMessage::SensorUpdated { sensor, client_id } => {
            if client_id.as_deref() == Some(store.client_id()) {
                log::debug!("ignoring echo of own update for {}", sensor.id);
                return;
            }
            store.set_sensor(sensor.clone());
        }
        ServerMessage::FilterConfig { config } | ServerMessage::FilterUpdated { config } => {
            store.set(StateValue::FilterConfig(*config));
        }
        ServerMessage::DbscanConfig { config } | ServerMessage::DbscanUpdated { config } => {
            store.set(StateValue::DbscanConfig(*config));
        }
        ServerMessage::WorldUpdated { world_mask } => {
            store.set(StateValue::WorldMask(valid_mask(world_mask)));
            drop_stale_selection(store);
        }
        ServerMessage::Ok { reference, sensor } => {
            if let Some(sensor) = sensor {
                store.set_sensor(sensor.clone());
            }
            log::debug!("ok: {}", reference.as_deref().unwrap_or("-"));
        }
        ServerMessage::Error { message } => {
            let text = if message.is_empty() { "Server error" } else { message.as_str() };
            notice::notify(store, NoticeLevel::Error, text, now_ms);
        }
    }
}

fn valid_mask(mask: &WorldMask) -> WorldMask {
    let mut mask = mask.clone();
    let dropped = mask.retain_valid();
    if dropped > 0 {
        log::warn!("dropped {dropped} world polygon(s) with fewer than {} vertices", wire::Polygon::MIN_VERTICES);
    }
    mask
}

/// Clear a selection that points at a sensor, polygon or vertex that no
/// longer exists.
pub(super) fn drop_stale_selection(store: &Store) {
    let valid = match store.selection() {
        Selection::None => true,
        Selection::Sensor(id) => store.sensors().contains_key(&id),
        Selection::Roi { kind, index } => store.world_mask().polygon(kind, index).is_some(),
        Selection::Vertex { kind, roi, vertex } => {
            store.world_mask().polygon(kind, roi).is_some_and(|p| vertex < p.len())
        }
    };
    if !valid {
        store.set(StateValue::Selection(Selection::None));
    }
}
