//! Sensors panel: list rows, pose and enable edits, the details modal and
//! REST create/update/delete.
//!
//! DESIGN
//! ======
//! Pose edits are optimistic: the store's sensor is replaced immediately so
//! the canvas follows the input, and one `sensor.update` carrying the
//! settled pose goes out after the pose debounce. Create/update/delete via
//! REST are not mirrored locally; a snapshot request after the round trip
//! brings the list up to date.

#[cfg(test)]
#[path = "sensors_test.rs"]
mod sensors_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use store::{NoticeLevel, Panel, Store};
use wire::model::{AngleMask, RangeMask};
use wire::rest::NewSensor;
use wire::{Endpoint, Pose, Sensor, SensorId, SensorMask, SensorMode, SensorPatch, ServerMessage};

use super::form::{FormFields, count, flag, number, parse_number, text_or};
use crate::net::api::{Api, ApiError};
use crate::net::transport::Transport;
use crate::util::clock::now_ms;
use crate::util::debounce::Debounce;
use crate::util::notice;

// =============================================================================
// LIST
// =============================================================================

/// One row of the sensors list.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRow {
    pub id: SensorId,
    pub label: String,
    pub enabled: bool,
    pub pose: Pose,
    pub endpoint: String,
    pub mode: SensorMode,
}

/// Rows ordered by slot, then id.
#[must_use]
pub fn rows(store: &Store) -> Vec<SensorRow> {
    let sensors = store.sensors();
    let mut list: Vec<&Sensor> = sensors.values().collect();
    list.sort_by(|a, b| (a.slot.unwrap_or(u32::MAX), &a.id).cmp(&(b.slot.unwrap_or(u32::MAX), &b.id)));
    list.into_iter()
        .map(|s| SensorRow {
            id: s.id.clone(),
            label: s.name.clone().unwrap_or_else(|| s.label()),
            enabled: s.enabled,
            pose: s.pose,
            endpoint: s.endpoint.as_ref().map(ToString::to_string).unwrap_or_default(),
            mode: s.mode,
        })
        .collect()
}

// =============================================================================
// POSE / ENABLE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseField {
    Tx,
    Ty,
    Theta,
}

impl PoseField {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Tx => "tx",
            Self::Ty => "ty",
            Self::Theta => "theta_deg",
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn apply(self, pose: Pose, text: &str) -> Pose {
        let current = match self {
            Self::Tx => pose.tx,
            Self::Ty => pose.ty,
            Self::Theta => pose.theta_deg,
        };
        let value = parse_number(Some(text), f64::from(current)) as f32;
        match self {
            Self::Tx => Pose { tx: value, ..pose },
            Self::Ty => Pose { ty: value, ..pose },
            Self::Theta => Pose { theta_deg: value, ..pose },
        }
    }
}

/// Write one pose field into the store's sensor. Returns the new pose, or
/// `None` for an unknown sensor.
pub fn apply_pose_edit(store: &Store, id: &SensorId, field: PoseField, text: &str) -> Option<Pose> {
    let sensor = store.get_sensor(id)?;
    let pose = field.apply(sensor.pose, text);
    store.set_sensor(sensor.with_pose(pose));
    Some(pose)
}

/// Send the store's current pose for `id`.
pub fn send_pose(transport: &Transport, id: &SensorId) -> bool {
    let Some(sensor) = transport.store().get_sensor(id) else {
        return false;
    };
    transport.update_sensor(id, SensorPatch::pose(sensor.pose))
}

/// Debounced pose editing, one timer per sensor.
#[derive(Debug, Default)]
pub struct PoseEditor {
    timers: RefCell<HashMap<SensorId, Debounce>>,
}

impl PoseEditor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Debounce handle for one sensor's pose inputs.
    #[must_use]
    pub fn timer(&self, id: &SensorId) -> Debounce {
        self.timers.borrow_mut().entry(id.clone()).or_default().clone()
    }

    /// Apply an edit optimistically and schedule the send.
    pub fn edit(&self, transport: &Rc<Transport>, id: &SensorId, field: PoseField, text: &str) -> Option<Pose> {
        let pose = apply_pose_edit(transport.store(), id, field, text)?;
        let timer = self.timer(id);
        #[cfg(feature = "hydrate")]
        {
            let transport = Rc::clone(transport);
            let id = id.clone();
            timer.schedule(transport.config().pose_debounce_ms, move || {
                if !send_pose(&transport, &id) {
                    notice::panel_message(transport.store(), Panel::Sensors, "send failed", true, now_ms());
                }
            });
        }
        #[cfg(not(feature = "hydrate"))]
        timer.arm();
        Some(pose)
    }
}

/// Toggle a sensor on or off through the live channel.
pub fn set_enabled(transport: &Transport, id: &SensorId, enabled: bool) -> bool {
    let store = transport.store();
    store.update_sensor(id, |s| s.with_enabled(enabled));
    let sent = transport.enable_sensor(id, enabled);
    if !sent {
        notice::panel_message(store, Panel::Sensors, "send failed", true, now_ms());
    }
    sent
}

// =============================================================================
// DETAILS MODAL
// =============================================================================

/// The optional sensor settings present on one sensor. Only fields the hub
/// reported are shown and patched.
#[derive(Debug, Clone, PartialEq)]
pub struct EditableSensor {
    pub endpoint: Option<Endpoint>,
    pub mode: Option<SensorMode>,
    pub ignore_checksum_error: Option<bool>,
    pub skip_step: Option<u32>,
    pub mask: Option<SensorMask>,
}

impl EditableSensor {
    #[must_use]
    pub fn from_sensor(sensor: &Sensor) -> Self {
        Self {
            endpoint: sensor.endpoint.clone(),
            mode: Some(sensor.mode),
            ignore_checksum_error: sensor.ignore_checksum_error,
            skip_step: sensor.skip_step.map(|s| s.max(1)),
            mask: sensor.mask,
        }
    }

    pub fn write_form(&self, form: &impl FormFields) {
        if let Some(ep) = &self.endpoint {
            form.set_text("endpoint.host", &ep.host);
            form.set_text("endpoint.port", &ep.port.to_string());
        }
        if let Some(mode) = self.mode {
            form.set_text("mode", mode.as_str());
        }
        if let Some(ice) = self.ignore_checksum_error {
            form.set_checked("ignore_checksum_error", ice);
        }
        if let Some(step) = self.skip_step {
            form.set_text("skip_step", &step.to_string());
        }
        if let Some(mask) = &self.mask {
            if let Some(angle) = mask.angle {
                form.set_text("mask.angle.min_deg", &angle.min_deg.to_string());
                form.set_text("mask.angle.max_deg", &angle.max_deg.to_string());
            }
            if let Some(range) = mask.range {
                form.set_text("mask.range.near_m", &range.near_m.to_string());
                form.set_text("mask.range.far_m", &range.far_m.to_string());
            }
        }
    }

    /// Patch holding exactly the fields this snapshot carries.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn patch_from_form(&self, form: &impl FormFields) -> SensorPatch {
        let f32_field = |field: &str, fallback: f32| number(form, field, f64::from(fallback)) as f32;
        SensorPatch {
            endpoint: self.endpoint.as_ref().map(|ep| Endpoint {
                host: text_or(form, "endpoint.host", &ep.host),
                port: u16::try_from(count(form, "endpoint.port", u32::from(ep.port))).unwrap_or(ep.port),
            }),
            mode: self.mode.map(|mode| {
                form.text("mode").map_or(mode, |t| SensorMode::parse_lenient(&t))
            }),
            ignore_checksum_error: self.ignore_checksum_error.map(|ice| flag(form, "ignore_checksum_error", ice)),
            skip_step: self.skip_step.map(|step| count(form, "skip_step", step).max(1)),
            mask: self.mask.map(|mask| SensorMask {
                angle: mask.angle.map(|a| AngleMask {
                    min_deg: f32_field("mask.angle.min_deg", a.min_deg),
                    max_deg: f32_field("mask.angle.max_deg", a.max_deg),
                }),
                range: mask.range.map(|r| RangeMask {
                    near_m: f32_field("mask.range.near_m", r.near_m),
                    far_m: f32_field("mask.range.far_m", r.far_m),
                }),
            }),
            ..SensorPatch::default()
        }
    }
}

/// Details modal state. Save sends a patch and the modal stays open until
/// the hub acknowledges the same sensor.
#[derive(Debug, Default)]
pub struct SensorModal {
    open: Option<(SensorId, EditableSensor)>,
    pending_save: Option<SensorId>,
}

impl SensorModal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    #[must_use]
    pub fn sensor_id(&self) -> Option<&SensorId> {
        self.open.as_ref().map(|(id, _)| id)
    }

    #[must_use]
    pub fn editable(&self) -> Option<&EditableSensor> {
        self.open.as_ref().map(|(_, e)| e)
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.pending_save.is_some()
    }

    /// Open for `id` and fill the form. `false` if the sensor is unknown.
    pub fn open(&mut self, store: &Store, id: &SensorId, form: &impl FormFields) -> bool {
        let Some(sensor) = store.get_sensor(id) else {
            return false;
        };
        let editable = EditableSensor::from_sensor(&sensor);
        editable.write_form(form);
        self.open = Some((id.clone(), editable));
        self.pending_save = None;
        true
    }

    pub fn close(&mut self) {
        self.open = None;
        self.pending_save = None;
    }

    /// Send the form as a `sensor.update` and wait for the ack.
    pub fn save(&mut self, transport: &Transport, form: &impl FormFields) -> bool {
        let Some((id, editable)) = &self.open else {
            return false;
        };
        let patch = editable.patch_from_form(form);
        if patch.is_empty() {
            return false;
        }
        if !transport.update_sensor(id, patch) {
            notice::panel_message(transport.store(), Panel::Sensors, "send failed", true, now_ms());
            return false;
        }
        self.pending_save = Some(id.clone());
        true
    }

    /// Close when `message` acknowledges the pending save. Returns whether
    /// it closed.
    pub fn on_message(&mut self, message: &ServerMessage) -> bool {
        let Some(pending) = &self.pending_save else {
            return false;
        };
        let acked = match message {
            ServerMessage::Ok { reference, sensor: Some(sensor) } => {
                reference.as_deref() == Some("sensor.update") && &sensor.id == pending
            }
            ServerMessage::SensorUpdated { sensor, .. } => &sensor.id == pending,
            _ => false,
        };
        if acked {
            self.close();
        }
        acked
    }

    /// Re-read the open sensor after a store change. Closes if it vanished.
    pub fn refresh(&mut self, store: &Store, form: &impl FormFields) {
        let Some(id) = self.sensor_id().cloned() else {
            return;
        };
        if self.is_saving() {
            return;
        }
        match store.get_sensor(&id) {
            Some(sensor) => {
                let editable = EditableSensor::from_sensor(&sensor);
                editable.write_form(form);
                self.open = Some((id, editable));
            }
            None => self.close(),
        }
    }
}

/// Wire the modal to `ok` / `sensor.updated` acks and surface `ok` and
/// `error` replies under the sensors panel.
pub fn register_handlers(transport: &Rc<Transport>, modal: &Rc<RefCell<SensorModal>>) {
    for kind in ["ok", "sensor.updated"] {
        let modal = Rc::clone(modal);
        transport.register_handler(
            kind,
            Rc::new(move |message: &ServerMessage| -> Result<(), String> {
                let mut modal = modal.try_borrow_mut().map_err(|e| e.to_string())?;
                if modal.on_message(message) {
                    log::debug!("sensor save acknowledged");
                }
                Ok(())
            }),
        );
    }

    let store = Rc::clone(transport.store());
    transport.register_handler(
        "ok",
        Rc::new(move |message: &ServerMessage| -> Result<(), String> {
            if let ServerMessage::Ok { reference: Some(reference), .. } = message {
                notice::panel_message(&store, Panel::Sensors, format!("OK: {reference}"), false, now_ms());
            }
            Ok(())
        }),
    );

    let store = Rc::clone(transport.store());
    transport.register_handler(
        "error",
        Rc::new(move |message: &ServerMessage| -> Result<(), String> {
            if let ServerMessage::Error { message } = message {
                let text = if message.is_empty() { "Error" } else { message.as_str() };
                notice::panel_message(&store, Panel::Sensors, text, true, now_ms());
            }
            Ok(())
        }),
    );
}

// =============================================================================
// REST
// =============================================================================

/// Build the `POST /sensors` body from the add-sensor form.
#[must_use]
pub fn new_sensor_from_form(form: &impl FormFields) -> NewSensor {
    let port = u16::try_from(count(form, "port", 0)).unwrap_or(0);
    NewSensor::from_form(
        &text_or(form, "type", wire::rest::SENSOR_TYPES[0]),
        &form.text("name").unwrap_or_default(),
        &form.text("host").unwrap_or_default(),
        port,
        SensorMode::parse_lenient(&form.text("mode").unwrap_or_default()),
        flag(form, "enabled", true),
    )
}

/// Create a sensor, then refresh. Returns whether the hub accepted it.
pub async fn create(api: &Api, transport: &Transport, sensor: &NewSensor) -> bool {
    let result = api.create_sensor(sensor).await;
    finish(transport, result.map(drop), "Sensor added successfully", "Failed to add sensor")
}

/// Patch a sensor over REST, then refresh.
pub async fn update(api: &Api, transport: &Transport, id: &SensorId, patch: &SensorPatch) -> bool {
    let result = api.update_sensor(id, patch).await;
    finish(transport, result.map(drop), &format!("Sensor {id} updated"), "Failed to update sensor")
}

/// Delete a sensor by config id, then refresh.
pub async fn delete(api: &Api, transport: &Transport, id: &SensorId) -> bool {
    if id.is_empty() || transport.store().get_sensor(id).is_none() {
        notice::panel_message(transport.store(), Panel::Sensors, "Sensor not found or missing config ID", true, now_ms());
        return false;
    }
    let result = api.delete_sensor(id).await;
    finish(transport, result, &format!("Sensor {id} deleted successfully"), "Failed to delete sensor")
}

fn finish(transport: &Transport, result: Result<(), ApiError>, ok_text: &str, fail_text: &str) -> bool {
    let store = transport.store();
    match result {
        Ok(()) => {
            notice::panel_message(store, Panel::Sensors, ok_text, false, now_ms());
            notice::notify(store, NoticeLevel::Success, ok_text, now_ms());
            transport.request_snapshot();
            true
        }
        Err(err) => {
            notice::report_failure(store, Panel::Sensors, format!("{fail_text}: {err}"), now_ms());
            false
        }
    }
}
