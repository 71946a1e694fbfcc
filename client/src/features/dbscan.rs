//! DBSCAN panel: form binding, range checks and `dbscan.update`.

#[cfg(test)]
#[path = "dbscan_test.rs"]
mod dbscan_test;

use std::rc::Rc;

use store::{Panel, StateKey, StateValue, Store, Subscription};
use wire::DbscanConfig;

use super::form::{FormFields, ValidationError, count, number};
use crate::net::transport::Transport;
use crate::util::notice;

#[must_use]
pub fn read_form(form: &impl FormFields, current: &DbscanConfig) -> DbscanConfig {
    DbscanConfig {
        eps_norm: number(form, "eps_norm", current.eps_norm),
        min_pts: count(form, "minPts", current.min_pts),
        k_scale: number(form, "k_scale", current.k_scale),
        h_min: number(form, "h_min", current.h_min),
        h_max: number(form, "h_max", current.h_max),
        r_max: count(form, "R_max", current.r_max),
        m_max: count(form, "M_max", current.m_max),
    }
}

pub fn write_form(form: &impl FormFields, c: &DbscanConfig) {
    form.set_text("eps_norm", &c.eps_norm.to_string());
    form.set_text("minPts", &c.min_pts.to_string());
    form.set_text("k_scale", &c.k_scale.to_string());
    form.set_text("h_min", &c.h_min.to_string());
    form.set_text("h_max", &c.h_max.to_string());
    form.set_text("R_max", &c.r_max.to_string());
    form.set_text("M_max", &c.m_max.to_string());
}

#[must_use]
pub fn validate(c: &DbscanConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if c.eps_norm <= 0.0 {
        errors.push(ValidationError::new("eps_norm", "must be > 0"));
    }
    if c.min_pts < 1 {
        errors.push(ValidationError::new("minPts", "must be >= 1"));
    }
    if c.k_scale <= 0.0 {
        errors.push(ValidationError::new("k_scale", "must be > 0"));
    }
    if c.h_min <= 0.0 {
        errors.push(ValidationError::new("h_min", "must be > 0"));
    }
    if c.h_max <= c.h_min {
        errors.push(ValidationError::new("h_max", "must be greater than h_min"));
    }
    if c.r_max < 1 {
        errors.push(ValidationError::new("R_max", "must be >= 1"));
    }
    if c.m_max < 1 {
        errors.push(ValidationError::new("M_max", "must be >= 1"));
    }
    errors
}

/// Read, check and publish the form.
pub fn submit(transport: &Transport, form: &impl FormFields, now_ms: f64) -> Option<DbscanConfig> {
    let store = transport.store();
    let config = read_form(form, &store.dbscan_config());
    publish(transport, config, now_ms)
}

/// Check and send an already-built config.
pub fn publish(transport: &Transport, config: DbscanConfig, now_ms: f64) -> Option<DbscanConfig> {
    let store = transport.store();
    if let Some(first) = validate(&config).first() {
        notice::panel_message(store, Panel::Dbscan, first.to_string(), true, now_ms);
        return None;
    }
    store.set(StateValue::DbscanConfig(config));
    if !transport.update_dbscan(config) {
        notice::report_failure(store, Panel::Dbscan, "Not connected; DBSCAN settings not sent", now_ms);
        return None;
    }
    notice::panel_message(store, Panel::Dbscan, "DBSCAN settings sent", false, now_ms);
    Some(config)
}

#[must_use]
pub fn mirror(store: &Store, form: Rc<impl FormFields + 'static>) -> Subscription {
    write_form(form.as_ref(), &store.dbscan_config());
    store.subscribe(StateKey::DbscanConfig, move |value, _, _| {
        if let StateValue::DbscanConfig(config) = value {
            write_form(form.as_ref(), config);
        }
        Ok(())
    })
}
