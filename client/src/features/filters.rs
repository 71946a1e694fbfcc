//! Filter pipeline panel: form binding, range checks and `filter.update`.
//!
//! Field names follow the JSON path of each parameter
//! (`prefilter.neighborhood.k`). Only enabled strategies are range-checked;
//! a disabled strategy may hold any value.

#[cfg(test)]
#[path = "filters_test.rs"]
mod filters_test;

use std::rc::Rc;

use store::{Panel, StateKey, StateValue, Store, Subscription};
use wire::FilterConfig;

use super::form::{FormFields, ValidationError, count, flag, number};
use crate::net::transport::Transport;
use crate::util::notice;

/// Read the form into a config, using `current` for anything missing or
/// unparsable.
#[must_use]
pub fn read_form(form: &impl FormFields, current: &FilterConfig) -> FilterConfig {
    let mut c = *current;

    let pre = &mut c.prefilter;
    pre.enabled = flag(form, "prefilter.enabled", pre.enabled);

    let nb = &mut pre.neighborhood;
    nb.enabled = flag(form, "prefilter.neighborhood.enabled", nb.enabled);
    nb.k = count(form, "prefilter.neighborhood.k", nb.k);
    nb.r_base = number(form, "prefilter.neighborhood.r_base", nb.r_base);
    nb.r_scale = number(form, "prefilter.neighborhood.r_scale", nb.r_scale);

    let spike = &mut pre.spike_removal;
    spike.enabled = flag(form, "prefilter.spike_removal.enabled", spike.enabled);
    spike.dr_threshold = number(form, "prefilter.spike_removal.dr_threshold", spike.dr_threshold);
    spike.window_size = count(form, "prefilter.spike_removal.window_size", spike.window_size);

    let outlier = &mut pre.outlier_removal;
    outlier.enabled = flag(form, "prefilter.outlier_removal.enabled", outlier.enabled);
    outlier.median_window = count(form, "prefilter.outlier_removal.median_window", outlier.median_window);
    outlier.outlier_threshold = number(form, "prefilter.outlier_removal.outlier_threshold", outlier.outlier_threshold);

    let intensity = &mut pre.intensity_filter;
    intensity.enabled = flag(form, "prefilter.intensity_filter.enabled", intensity.enabled);
    intensity.min_intensity = number(form, "prefilter.intensity_filter.min_intensity", intensity.min_intensity);
    intensity.min_reliability = number(form, "prefilter.intensity_filter.min_reliability", intensity.min_reliability);

    let iso = &mut pre.isolation_removal;
    iso.enabled = flag(form, "prefilter.isolation_removal.enabled", iso.enabled);
    iso.min_cluster_size = count(form, "prefilter.isolation_removal.min_cluster_size", iso.min_cluster_size);
    iso.isolation_radius = number(form, "prefilter.isolation_removal.isolation_radius", iso.isolation_radius);

    let post = &mut c.postfilter;
    post.enabled = flag(form, "postfilter.enabled", post.enabled);
    let piso = &mut post.isolation_removal;
    piso.enabled = flag(form, "postfilter.isolation_removal.enabled", piso.enabled);
    piso.min_points_size = count(form, "postfilter.isolation_removal.min_points_size", piso.min_points_size);
    piso.isolation_radius = number(form, "postfilter.isolation_removal.isolation_radius", piso.isolation_radius);
    piso.required_neighbors = count(form, "postfilter.isolation_removal.required_neighbors", piso.required_neighbors);

    c
}

/// Push a config into the form.
pub fn write_form(form: &impl FormFields, c: &FilterConfig) {
    let pre = &c.prefilter;
    form.set_checked("prefilter.enabled", pre.enabled);

    form.set_checked("prefilter.neighborhood.enabled", pre.neighborhood.enabled);
    form.set_text("prefilter.neighborhood.k", &pre.neighborhood.k.to_string());
    form.set_text("prefilter.neighborhood.r_base", &pre.neighborhood.r_base.to_string());
    form.set_text("prefilter.neighborhood.r_scale", &pre.neighborhood.r_scale.to_string());

    form.set_checked("prefilter.spike_removal.enabled", pre.spike_removal.enabled);
    form.set_text("prefilter.spike_removal.dr_threshold", &pre.spike_removal.dr_threshold.to_string());
    form.set_text("prefilter.spike_removal.window_size", &pre.spike_removal.window_size.to_string());

    form.set_checked("prefilter.outlier_removal.enabled", pre.outlier_removal.enabled);
    form.set_text("prefilter.outlier_removal.median_window", &pre.outlier_removal.median_window.to_string());
    form.set_text("prefilter.outlier_removal.outlier_threshold", &pre.outlier_removal.outlier_threshold.to_string());

    form.set_checked("prefilter.intensity_filter.enabled", pre.intensity_filter.enabled);
    form.set_text("prefilter.intensity_filter.min_intensity", &pre.intensity_filter.min_intensity.to_string());
    form.set_text("prefilter.intensity_filter.min_reliability", &pre.intensity_filter.min_reliability.to_string());

    form.set_checked("prefilter.isolation_removal.enabled", pre.isolation_removal.enabled);
    form.set_text("prefilter.isolation_removal.min_cluster_size", &pre.isolation_removal.min_cluster_size.to_string());
    form.set_text("prefilter.isolation_removal.isolation_radius", &pre.isolation_removal.isolation_radius.to_string());

    let post = &c.postfilter;
    form.set_checked("postfilter.enabled", post.enabled);
    let piso = &post.isolation_removal;
    form.set_checked("postfilter.isolation_removal.enabled", piso.enabled);
    form.set_text("postfilter.isolation_removal.min_points_size", &piso.min_points_size.to_string());
    form.set_text("postfilter.isolation_removal.isolation_radius", &piso.isolation_radius.to_string());
    form.set_text("postfilter.isolation_removal.required_neighbors", &piso.required_neighbors.to_string());
}

/// Range-check every enabled strategy.
#[must_use]
pub fn validate(c: &FilterConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut require = |ok: bool, field: &'static str, rule: &str| {
        if !ok {
            errors.push(ValidationError::new(field, rule));
        }
    };

    let pre = &c.prefilter;
    if pre.enabled {
        let nb = &pre.neighborhood;
        if nb.enabled {
            require(nb.k >= 1, "prefilter.neighborhood.k", "must be >= 1");
            require(nb.r_base > 0.0, "prefilter.neighborhood.r_base", "must be > 0");
            require(nb.r_scale > 0.0, "prefilter.neighborhood.r_scale", "must be > 0");
        }
        let spike = &pre.spike_removal;
        if spike.enabled {
            require(spike.dr_threshold > 0.0, "prefilter.spike_removal.dr_threshold", "must be > 0");
            require(spike.window_size >= 1, "prefilter.spike_removal.window_size", "must be >= 1");
        }
        let outlier = &pre.outlier_removal;
        if outlier.enabled {
            require(outlier.median_window >= 1, "prefilter.outlier_removal.median_window", "must be >= 1");
            require(outlier.outlier_threshold > 0.0, "prefilter.outlier_removal.outlier_threshold", "must be > 0");
        }
        let intensity = &pre.intensity_filter;
        if intensity.enabled {
            require(intensity.min_intensity >= 0.0, "prefilter.intensity_filter.min_intensity", "must be >= 0");
            require(
                (0.0..=1.0).contains(&intensity.min_reliability),
                "prefilter.intensity_filter.min_reliability",
                "must be within 0..1",
            );
        }
        let iso = &pre.isolation_removal;
        if iso.enabled {
            require(iso.min_cluster_size >= 1, "prefilter.isolation_removal.min_cluster_size", "must be >= 1");
            require(iso.isolation_radius > 0.0, "prefilter.isolation_removal.isolation_radius", "must be > 0");
        }
    }

    let post = &c.postfilter;
    if post.enabled && post.isolation_removal.enabled {
        let piso = &post.isolation_removal;
        require(piso.min_points_size >= 1, "postfilter.isolation_removal.min_points_size", "must be >= 1");
        require(piso.isolation_radius > 0.0, "postfilter.isolation_removal.isolation_radius", "must be > 0");
    }
    errors
}

/// Read, check and publish the form. Returns the sent config, or `None`
/// when validation failed or the link is down.
pub fn submit(transport: &Transport, form: &impl FormFields, now_ms: f64) -> Option<FilterConfig> {
    let store = transport.store();
    let config = read_form(form, &store.filter_config());
    if let Some(first) = validate(&config).first() {
        notice::panel_message(store, Panel::Filters, first.to_string(), true, now_ms);
        return None;
    }
    store.set(StateValue::FilterConfig(config));
    if !transport.update_filter(config) {
        notice::report_failure(store, Panel::Filters, "Not connected; filter settings not sent", now_ms);
        return None;
    }
    notice::panel_message(store, Panel::Filters, "Filter settings sent", false, now_ms);
    Some(config)
}

/// Keep the form in step with the store's filter config.
#[must_use]
pub fn mirror(store: &Store, form: Rc<impl FormFields + 'static>) -> Subscription {
    write_form(form.as_ref(), &store.filter_config());
    store.subscribe(StateKey::FilterConfig, move |value, _, _| {
        if let StateValue::FilterConfig(config) = value {
            write_form(form.as_ref(), config);
        }
        Ok(())
    })
}
