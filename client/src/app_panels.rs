//! Side-panel wiring: display toggles, ROI buttons, parameter forms, the
//! sensors and sinks lists, and the configs panel.
//!
//! Element ids: toggles `toggle-raw`, `toggle-filtered`,
//! `toggle-sensor-color`, `toggle-performance`; ROI `roi-include`,
//! `roi-exclude`, `roi-finish`, `roi-cancel`, `roi-clear`; parameter
//! containers `filters-panel` and `dbscan-panel` with fields prefixed
//! `filter-` and `dbscan-`; sensors `sensor-list`, `sensor-add` with fields
//! `sensor-new-*`, modal `sensor-modal` with fields `sensor-edit-*` and
//! buttons `sensor-save`, `sensor-cancel`; sinks `sink-list`, `sink-add`
//! with fields `sink-*`; configs `config-name`, `config-save`,
//! `config-save-default`, `config-backup`, `config-list`, `config-files`,
//! `config-choice`, `config-load`, `config-export`, `config-yaml`,
//! `config-import`.

use std::fmt::Write as _;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, HtmlInputElement, HtmlTextAreaElement};

use store::{StateKey, StateValue};
use wire::{RoiKind, SensorId};

use super::{App, apply_actions, element, listen, on_click, set_hidden, set_text};
use crate::features::form::DomForm;
use crate::features::sensors::{self, PoseField};
use crate::features::{configs, dbscan, filters, sinks};
use crate::util::clock::now_ms;

pub(super) fn wire(app: &Rc<App>) -> Result<(), JsValue> {
    wire_toggles(app)?;
    wire_roi(app)?;
    wire_parameter_forms(app)?;
    wire_sensors(app)?;
    wire_sinks(app)?;
    wire_configs(app)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn input_value(app: &App, id: &str) -> String {
    app.document
        .get_element_by_id(id)
        .and_then(|el| {
            if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
                return Some(input.value());
            }
            el.dyn_ref::<HtmlTextAreaElement>().map(HtmlTextAreaElement::value)
        })
        .unwrap_or_default()
}

fn event_element(ev: &Event) -> Option<Element> {
    ev.target().and_then(|t| t.dyn_into::<Element>().ok())
}

// =============================================================================
// TOGGLES / ROI
// =============================================================================

fn wire_toggles(app: &Rc<App>) -> Result<(), JsValue> {
    let toggles: [(&str, fn(bool) -> StateValue, bool); 4] = [
        ("toggle-raw", StateValue::ShowRaw, app.store.show_raw()),
        ("toggle-filtered", StateValue::ShowFiltered, app.store.show_filtered()),
        ("toggle-sensor-color", StateValue::PerSensorColor, app.store.per_sensor_color()),
        ("toggle-performance", StateValue::PerformanceMode, app.store.performance_mode()),
    ];
    for (id, make, initial) in toggles {
        let Some(input) = element(app, id).and_then(|el| el.dyn_into::<HtmlInputElement>().ok()) else {
            continue;
        };
        input.set_checked(initial);
        let a = Rc::clone(app);
        let source = input.clone();
        listen(&input, "change", move |_: Event| a.store.set(make(source.checked())))?;
    }

    // The `p` shortcut flips performance mode from the canvas side.
    if let Some(input) = element(app, "toggle-performance").and_then(|el| el.dyn_into::<HtmlInputElement>().ok()) {
        app.store
            .subscribe(StateKey::PerformanceMode, move |value, _, _| {
                if let StateValue::PerformanceMode(on) = value {
                    input.set_checked(*on);
                }
                Ok(())
            })
            .forget();
    }
    Ok(())
}

fn wire_roi(app: &Rc<App>) -> Result<(), JsValue> {
    on_click(app, "roi-include", |app| {
        let actions = app.engine.borrow_mut().core.begin_polygon(RoiKind::Include);
        apply_actions(app, actions);
    })?;
    on_click(app, "roi-exclude", |app| {
        let actions = app.engine.borrow_mut().core.begin_polygon(RoiKind::Exclude);
        apply_actions(app, actions);
    })?;
    on_click(app, "roi-finish", |app| {
        let actions = app.engine.borrow_mut().core.finish_polygon();
        apply_actions(app, actions);
    })?;
    on_click(app, "roi-cancel", |app| {
        let actions = app.engine.borrow_mut().core.cancel_polygon();
        apply_actions(app, actions);
    })?;
    on_click(app, "roi-clear", |app| {
        let actions = app.engine.borrow_mut().core.clear_world_mask();
        apply_actions(app, actions);
    })
}

// =============================================================================
// FILTERS / DBSCAN
// =============================================================================

fn wire_parameter_forms(app: &Rc<App>) -> Result<(), JsValue> {
    let filter_form = Rc::new(DomForm::new(app.document.clone(), "filter-"));
    filters::mirror(&app.store, Rc::clone(&filter_form)).forget();
    if let Some(panel) = element(app, "filters-panel") {
        for kind in ["input", "change"] {
            let a = Rc::clone(app);
            let form = Rc::clone(&filter_form);
            listen(&panel, kind, move |_: Event| {
                let transport = Rc::clone(&a.transport);
                let form = Rc::clone(&form);
                a.filters_debounce.schedule(a.config.form_debounce_ms, move || {
                    filters::submit(&transport, form.as_ref(), now_ms());
                });
            })?;
        }
    }

    let dbscan_form = Rc::new(DomForm::new(app.document.clone(), "dbscan-"));
    dbscan::mirror(&app.store, Rc::clone(&dbscan_form)).forget();
    if let Some(panel) = element(app, "dbscan-panel") {
        for kind in ["input", "change"] {
            let a = Rc::clone(app);
            let form = Rc::clone(&dbscan_form);
            listen(&panel, kind, move |_: Event| {
                let transport = Rc::clone(&a.transport);
                let form = Rc::clone(&form);
                a.dbscan_debounce.schedule(a.config.form_debounce_ms, move || {
                    dbscan::submit(&transport, form.as_ref(), now_ms());
                });
            })?;
        }
    }
    Ok(())
}

// =============================================================================
// SENSORS
// =============================================================================

fn render_sensor_list(app: &App) {
    let Some(list) = app.document.get_element_by_id("sensor-list") else {
        return;
    };
    // Rebuilding while an input in the list has focus would drop the caret.
    if app.document.active_element().is_some_and(|el| list.contains(Some(el.as_ref()))) {
        return;
    }
    let mut html = String::new();
    for row in sensors::rows(&app.store) {
        let id = escape(row.id.as_str());
        let checked = if row.enabled { " checked" } else { "" };
        let _ = write!(
            html,
            r#"<div class="sensor-row" data-sensor="{id}">
<input type="checkbox" data-field="enabled"{checked}>
<span class="sensor-label">{label}</span>
<input type="number" step="0.01" data-field="tx" value="{tx}">
<input type="number" step="0.01" data-field="ty" value="{ty}">
<input type="number" step="1" data-field="theta_deg" value="{theta}">
<span class="sensor-endpoint">{endpoint} {mode}</span>
<button data-action="edit">Edit</button>
<button data-action="delete">Delete</button>
</div>"#,
            label = escape(&row.label),
            tx = row.pose.tx,
            ty = row.pose.ty,
            theta = row.pose.theta_deg,
            endpoint = escape(&row.endpoint),
            mode = row.mode.as_str(),
        );
    }
    list.set_inner_html(&html);
}

fn row_sensor(target: &Element) -> Option<SensorId> {
    target
        .closest("[data-sensor]")
        .ok()
        .flatten()
        .and_then(|row| row.get_attribute("data-sensor"))
        .map(SensorId::from)
}

fn sync_modal(app: &App) {
    let modal = app.modal.borrow();
    set_hidden(app, "sensor-modal", !modal.is_open());
    set_text(app, "sensor-modal-title", &modal.sensor_id().map(ToString::to_string).unwrap_or_default());
}

fn wire_sensors(app: &Rc<App>) -> Result<(), JsValue> {
    sensors::register_handlers(&app.transport, &app.modal);
    for kind in ["ok", "sensor.updated"] {
        let a = Rc::clone(app);
        app.transport.register_handler(
            kind,
            Rc::new(move |_: &wire::ServerMessage| -> Result<(), String> {
                sync_modal(&a);
                Ok(())
            }),
        );
    }

    let edit_form = DomForm::new(app.document.clone(), "sensor-edit-");
    let a = Rc::clone(app);
    let refresh_form = edit_form.clone();
    app.store
        .subscribe(StateKey::Sensors, move |_, _, _| {
            render_sensor_list(&a);
            a.modal.try_borrow_mut().map_err(|e| e.to_string())?.refresh(&a.store, &refresh_form);
            sync_modal(&a);
            Ok(())
        })
        .forget();
    render_sensor_list(app);
    sync_modal(app);

    if let Some(list) = element(app, "sensor-list") {
        let a = Rc::clone(app);
        listen(&list, "input", move |ev: Event| {
            let Some(target) = event_element(&ev) else { return };
            let field = match target.get_attribute("data-field").as_deref() {
                Some("tx") => PoseField::Tx,
                Some("ty") => PoseField::Ty,
                Some("theta_deg") => PoseField::Theta,
                _ => return,
            };
            let (Some(id), Some(input)) = (row_sensor(&target), target.dyn_ref::<HtmlInputElement>()) else {
                return;
            };
            a.poses.edit(&a.transport, &id, field, &input.value());
        })?;

        let a = Rc::clone(app);
        listen(&list, "change", move |ev: Event| {
            let Some(target) = event_element(&ev) else { return };
            if target.get_attribute("data-field").as_deref() != Some("enabled") {
                return;
            }
            let (Some(id), Some(input)) = (row_sensor(&target), target.dyn_ref::<HtmlInputElement>()) else {
                return;
            };
            sensors::set_enabled(&a.transport, &id, input.checked());
        })?;

        let a = Rc::clone(app);
        let form = edit_form.clone();
        listen(&list, "click", move |ev: Event| {
            let Some(target) = event_element(&ev) else { return };
            let Some(id) = row_sensor(&target) else { return };
            match target.get_attribute("data-action").as_deref() {
                Some("edit") => {
                    if let Ok(mut modal) = a.modal.try_borrow_mut() {
                        modal.open(&a.store, &id, &form);
                    }
                    sync_modal(&a);
                }
                Some("delete") => {
                    let a = Rc::clone(&a);
                    wasm_bindgen_futures::spawn_local(async move {
                        sensors::delete(&a.api, &a.transport, &id).await;
                    });
                }
                _ => {}
            }
        })?;
    }

    let list_focus = Rc::clone(app);
    if let Some(list) = element(app, "sensor-list") {
        listen(&list, "focusout", move |_: Event| render_sensor_list(&list_focus))?;
    }

    let form = edit_form.clone();
    on_click(app, "sensor-save", move |app| {
        let saved = app.modal.try_borrow_mut().is_ok_and(|mut modal| modal.save(&app.transport, &form));
        if !saved && !app.transport.is_open() {
            // Offline: fall back to REST for the same patch.
            let Some((id, patch)) = app
                .modal
                .borrow()
                .sensor_id()
                .cloned()
                .zip(app.modal.borrow().editable().map(|e| e.patch_from_form(&form)))
            else {
                return;
            };
            let a = Rc::clone(app);
            wasm_bindgen_futures::spawn_local(async move {
                if sensors::update(&a.api, &a.transport, &id, &patch).await {
                    a.modal.borrow_mut().close();
                    sync_modal(&a);
                }
            });
        }
    })?;
    on_click(app, "sensor-cancel", |app| {
        app.modal.borrow_mut().close();
        sync_modal(app);
    })?;

    let add_form = DomForm::new(app.document.clone(), "sensor-new-");
    on_click(app, "sensor-add", move |app| {
        let body = sensors::new_sensor_from_form(&add_form);
        let a = Rc::clone(app);
        wasm_bindgen_futures::spawn_local(async move {
            sensors::create(&a.api, &a.transport, &body).await;
        });
    })
}

// =============================================================================
// SINKS
// =============================================================================

fn render_sink_list(app: &App) {
    let Some(list) = app.document.get_element_by_id("sink-list") else {
        return;
    };
    let mut html = String::new();
    for (position, row) in sinks::rows(&app.store).into_iter().enumerate() {
        let checked = if row.enabled { " checked" } else { "" };
        let _ = write!(
            html,
            r#"<div class="sink-row" data-position="{position}" title="{address}">
<input type="checkbox" data-action="toggle"{checked}>
<span class="sink-summary">{summary}</span>
<button data-action="edit">Edit</button>
<button data-action="apply">Apply</button>
<button data-action="delete">Delete</button>
</div>"#,
            address = escape(&row.address.0),
            summary = escape(&row.summary),
        );
    }
    list.set_inner_html(&html);
}

fn row_position(target: &Element) -> Option<usize> {
    target
        .closest("[data-position]")
        .ok()
        .flatten()
        .and_then(|row| row.get_attribute("data-position"))
        .and_then(|p| p.parse().ok())
}

fn wire_sinks(app: &Rc<App>) -> Result<(), JsValue> {
    let a = Rc::clone(app);
    app.store
        .subscribe(StateKey::Sinks, move |_, _, _| {
            render_sink_list(&a);
            Ok(())
        })
        .forget();
    render_sink_list(app);

    let form = DomForm::new(app.document.clone(), "sink-");
    sinks::write_form(&form, &wire::Sink::template(false));

    if let Some(list) = element(app, "sink-list") {
        let a = Rc::clone(app);
        let form = form.clone();
        listen(&list, "click", move |ev: Event| {
            let Some(target) = event_element(&ev) else { return };
            let Some(position) = row_position(&target) else { return };
            let a = Rc::clone(&a);
            match target.get_attribute("data-action").as_deref() {
                Some("toggle") => {
                    let enabled = target.dyn_ref::<HtmlInputElement>().is_some_and(HtmlInputElement::checked);
                    wasm_bindgen_futures::spawn_local(async move {
                        sinks::set_enabled(&a.api, &a.transport, position, enabled).await;
                    });
                }
                Some("edit") => {
                    if let Some(sink) = a.store.sinks().get(position) {
                        sinks::write_form(&form, sink);
                    }
                }
                Some("apply") => {
                    let form = form.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        sinks::update(&a.api, &a.transport, position, &form).await;
                    });
                }
                Some("delete") => {
                    wasm_bindgen_futures::spawn_local(async move {
                        sinks::delete(&a.api, &a.transport, position).await;
                    });
                }
                _ => {}
            }
        })?;
    }

    on_click(app, "sink-add", move |app| {
        let a = Rc::clone(app);
        let form = form.clone();
        wasm_bindgen_futures::spawn_local(async move {
            sinks::create(&a.api, &a.transport, &form).await;
        });
    })
}

// =============================================================================
// CONFIGS
// =============================================================================

fn show_yaml(app: &App, yaml: &str) {
    if let Some(area) = app.document.get_element_by_id("config-yaml").and_then(|el| el.dyn_into::<HtmlTextAreaElement>().ok()) {
        area.set_value(yaml);
    }
}

fn wire_configs(app: &Rc<App>) -> Result<(), JsValue> {
    on_click(app, "config-save", |app| {
        let a = Rc::clone(app);
        let name = input_value(app, "config-name");
        wasm_bindgen_futures::spawn_local(async move {
            configs::save(&a.api, &a.store, &name).await;
        });
    })?;
    on_click(app, "config-save-default", |app| {
        let a = Rc::clone(app);
        wasm_bindgen_futures::spawn_local(async move {
            configs::save(&a.api, &a.store, configs::DEFAULT_CONFIG_NAME).await;
        });
    })?;
    on_click(app, "config-backup", |app| {
        let a = Rc::clone(app);
        wasm_bindgen_futures::spawn_local(async move {
            configs::backup(&a.api, &a.store, js_sys::Date::now()).await;
        });
    })?;
    on_click(app, "config-list", |app| {
        let a = Rc::clone(app);
        wasm_bindgen_futures::spawn_local(async move {
            let files = configs::list(&a.api, &a.store).await;
            let text: Vec<String> = files.iter().enumerate().map(|(i, f)| format!("{}. {}", i + 1, f.name)).collect();
            set_text(&a, "config-files", &text.join("\n"));
        });
    })?;
    on_click(app, "config-load", |app| {
        let a = Rc::clone(app);
        let choice = input_value(app, "config-choice");
        wasm_bindgen_futures::spawn_local(async move {
            let files = a.api.list_configs().await.unwrap_or_default();
            if files.is_empty() {
                configs::load(&a.api, &a.transport, &choice).await;
            } else {
                configs::load_choice(&a.api, &a.transport, &files, &choice).await;
            }
        });
    })?;
    on_click(app, "config-export", |app| {
        let a = Rc::clone(app);
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(yaml) = configs::export(&a.api, &a.store).await {
                show_yaml(&a, &yaml);
            }
        });
    })?;
    on_click(app, "config-import", |app| {
        let a = Rc::clone(app);
        let yaml = input_value(app, "config-yaml");
        wasm_bindgen_futures::spawn_local(async move {
            configs::import(&a.api, &a.transport, &yaml, "editor").await;
        });
    })
}
