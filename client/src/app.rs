//! Browser entry point: boots the store, live channel and canvas, then wires
//! the page's DOM to them.
//!
//! SYSTEM CONTEXT
//! ==============
//! The page is static HTML. This module finds its elements by id, attaches
//! listeners and keeps them in sync with the store. Nothing here decides
//! behavior: input becomes engine or feature calls, and engine
//! [`Action`]s are delivered over the transport.
//!
//! Element ids used here: `view` (canvas), `stat-conn`, `stat-frame`,
//! `stat-age`, `stat-fps`, `stat-counters`, `notice`, `panel-msg-<panel>`,
//! `reconnect`, `disconnect`. Panel ids are listed in `app_panels`.
//!
//! ERROR HANDLING
//! ==============
//! Missing optional elements are logged and skipped. Only a missing window,
//! document or canvas aborts boot.

#[path = "app_panels.rs"]
mod app_panels;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, KeyboardEvent, PointerEvent, WheelEvent, Window};

use canvas::camera::Point;
use canvas::engine::{Action, Engine};
use canvas::input::{Button, Key, WheelDelta};
use store::{NoticeLevel, Panel, Store};

use crate::config::ClientConfig;
use crate::features::sensors::{PoseEditor, SensorModal};
use crate::net::api::Api;
use crate::net::socket::spawn_live_socket;
use crate::net::transport::Transport;
use crate::util::clock::now_ms;
use crate::util::debounce::Debounce;
use crate::util::{notice, stats};

/// Everything the page's listeners share.
pub(crate) struct App {
    pub(crate) window: Window,
    pub(crate) document: Document,
    pub(crate) config: ClientConfig,
    pub(crate) store: Rc<Store>,
    pub(crate) transport: Rc<Transport>,
    pub(crate) api: Rc<Api>,
    pub(crate) canvas: HtmlCanvasElement,
    pub(crate) engine: RefCell<Engine>,
    pub(crate) modal: Rc<RefCell<SensorModal>>,
    pub(crate) poses: PoseEditor,
    pub(crate) filters_debounce: Debounce,
    pub(crate) dbscan_debounce: Debounce,
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .get_element_by_id("view")
        .ok_or_else(|| JsValue::from_str("#view canvas missing"))?
        .dyn_into::<HtmlCanvasElement>()?;

    let config = ClientConfig::default();
    let store = Rc::new(Store::new());
    log::info!("client id {}", store.client_id());
    let transport = Rc::new(Transport::new(Rc::clone(&store), config.clone()));
    let api = Rc::new(Api::new(&config));
    let engine = Engine::new(canvas.clone(), Rc::clone(&store))?;

    let app = Rc::new(App {
        window,
        document,
        config,
        store,
        transport,
        api,
        canvas,
        engine: RefCell::new(engine),
        modal: Rc::new(RefCell::new(SensorModal::new())),
        poses: PoseEditor::new(),
        filters_debounce: Debounce::new(),
        dbscan_debounce: Debounce::new(),
    });

    resize(&app);
    wire_canvas(&app)?;
    wire_link_controls(&app)?;
    app_panels::wire(&app)?;
    start_render_loop(&app)?;
    start_status_timer(&app)?;

    let location = app.window.location();
    let url = app.config.live_url(&location.protocol()?, &location.host()?);
    log::info!("live channel {url}");
    spawn_live_socket(Rc::clone(&app.transport), url);
    Ok(())
}

// =============================================================================
// DOM HELPERS
// =============================================================================

/// Attach a listener for the life of the page.
pub(crate) fn listen<E>(target: &web_sys::EventTarget, kind: &str, handler: impl FnMut(E) + 'static) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
{
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
    callback.forget();
    Ok(())
}

pub(crate) fn element(app: &App, id: &str) -> Option<Element> {
    let found = app.document.get_element_by_id(id);
    if found.is_none() {
        log::debug!("#{id} not on page");
    }
    found
}

/// Run `handler` on clicks of `#id`, if present.
pub(crate) fn on_click(app: &Rc<App>, id: &str, handler: impl Fn(&Rc<App>) + 'static) -> Result<(), JsValue> {
    let Some(el) = element(app, id) else {
        return Ok(());
    };
    let app = Rc::clone(app);
    listen(&el, "click", move |_: web_sys::Event| handler(&app))
}

pub(crate) fn set_text(app: &App, id: &str, text: &str) {
    if let Some(el) = app.document.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

pub(crate) fn set_hidden(app: &App, id: &str, hidden: bool) {
    if let Some(el) = app.document.get_element_by_id(id).and_then(|el| el.dyn_into::<HtmlElement>().ok()) {
        el.set_hidden(hidden);
    }
}

/// Whether keyboard focus sits in a text-entry control.
fn text_focused(document: &Document) -> bool {
    document
        .active_element()
        .is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

/// Deliver engine actions.
pub(crate) fn apply_actions(app: &App, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::Send(message) => {
                if !app.transport.send(&message) {
                    notice::notify(&app.store, NoticeLevel::Warning, "Not connected; change kept locally", now_ms());
                }
            }
            Action::SetCursor(cursor) => {
                if let Err(e) = app.canvas.style().set_property("cursor", &cursor) {
                    log::debug!("cursor update failed: {e:?}");
                }
            }
            Action::Rejected(reason) => {
                notice::panel_message(&app.store, Panel::Roi, reason.to_string(), true, now_ms());
                notice::notify(&app.store, NoticeLevel::Warning, reason.to_string(), now_ms());
            }
        }
    }
}

// =============================================================================
// CANVAS
// =============================================================================

fn resize(app: &App) {
    let rect = app.canvas.get_bounding_client_rect();
    let dpr = app.window.device_pixel_ratio();
    app.engine.borrow_mut().set_viewport(rect.width(), rect.height(), dpr);
}

fn pointer_point(ev: &web_sys::MouseEvent) -> Point {
    Point::new(f64::from(ev.offset_x()), f64::from(ev.offset_y()))
}

fn wire_canvas(app: &Rc<App>) -> Result<(), JsValue> {
    let target: &web_sys::EventTarget = &app.canvas;

    let a = Rc::clone(app);
    listen(target, "pointerdown", move |ev: PointerEvent| {
        let actions = a.engine.borrow_mut().on_pointer_down(pointer_point(&ev), Button::from_dom(ev.button()));
        apply_actions(&a, actions);
    })?;

    let a = Rc::clone(app);
    listen(target, "pointermove", move |ev: PointerEvent| {
        let actions = a.engine.borrow_mut().on_pointer_move(pointer_point(&ev));
        apply_actions(&a, actions);
    })?;

    for kind in ["pointerup", "pointerleave"] {
        let a = Rc::clone(app);
        listen(target, kind, move |ev: PointerEvent| {
            let actions = a.engine.borrow_mut().on_pointer_up(pointer_point(&ev));
            apply_actions(&a, actions);
        })?;
    }

    let a = Rc::clone(app);
    let wheel = Closure::wrap(Box::new(move |ev: WheelEvent| {
        ev.prevent_default();
        let delta = WheelDelta { dx: ev.delta_x(), dy: ev.delta_y() };
        let actions = a.engine.borrow_mut().on_wheel(pointer_point(&ev), delta);
        apply_actions(&a, actions);
    }) as Box<dyn FnMut(WheelEvent)>);
    let options = web_sys::AddEventListenerOptions::new();
    options.set_passive(false);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        "wheel",
        wheel.as_ref().unchecked_ref(),
        &options,
    )?;
    wheel.forget();

    let a = Rc::clone(app);
    listen(target, "dblclick", move |_: web_sys::MouseEvent| {
        let actions = a.engine.borrow_mut().on_double_click();
        apply_actions(&a, actions);
    })?;

    let a = Rc::clone(app);
    listen(&app.window, "keydown", move |ev: KeyboardEvent| {
        let key = Key(ev.key());
        let actions = a.engine.borrow_mut().on_key_down(&key, text_focused(&a.document));
        apply_actions(&a, actions);
    })?;

    let a = Rc::clone(app);
    listen(&app.window, "resize", move |_: web_sys::Event| resize(&a))
}

/// One `requestAnimationFrame` chain for the page. The engine decides
/// whether each vsync actually paints.
fn start_render_loop(app: &Rc<App>) -> Result<(), JsValue> {
    let slot: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&slot);
    let a = Rc::clone(app);
    *slot.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
        if let Err(e) = a.engine.borrow_mut().tick(timestamp) {
            log::warn!("render failed: {e:?}");
        }
        if let Some(callback) = next.borrow().as_ref() {
            if a.window.request_animation_frame(callback.as_ref().unchecked_ref()).is_err() {
                log::error!("requestAnimationFrame refused; rendering stopped");
            }
        }
    }) as Box<dyn FnMut(f64)>));

    let first = slot.borrow();
    let callback = first.as_ref().ok_or_else(|| JsValue::from_str("render loop not built"))?;
    app.window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    Ok(())
}

// =============================================================================
// STATUS / LINK
// =============================================================================

fn panel_slug(panel: Panel) -> &'static str {
    match panel {
        Panel::Sensors => "sensors",
        Panel::Filters => "filters",
        Panel::Dbscan => "dbscan",
        Panel::Sinks => "sinks",
        Panel::Configs => "configs",
        Panel::Roi => "roi",
    }
}

const PANELS: [Panel; 6] = [Panel::Sensors, Panel::Filters, Panel::Dbscan, Panel::Sinks, Panel::Configs, Panel::Roi];

fn refresh_status(app: &App) {
    let now = now_ms();
    notice::expire(&app.store, now);

    let line = stats::status_line(&app.store, now);
    set_text(app, "stat-conn", &line.connection);
    set_text(app, "stat-frame", &line.frame);
    set_text(app, "stat-age", &line.age);
    if let Some(el) = app.document.get_element_by_id("stat-age") {
        el.set_class_name(line.age_class);
    }
    set_text(app, "stat-fps", &line.fps);
    set_text(app, "stat-counters", &line.counters);

    let toast = app.store.notice();
    set_text(app, "notice", toast.as_ref().map_or("", |n| n.text.as_str()));
    if let Some(el) = app.document.get_element_by_id("notice") {
        let class = match toast.map(|n| n.level) {
            Some(NoticeLevel::Info) => "notice info",
            Some(NoticeLevel::Success) => "notice success",
            Some(NoticeLevel::Warning) => "notice warning",
            Some(NoticeLevel::Error) => "notice error",
            None => "notice",
        };
        el.set_class_name(class);
    }

    let message = app.store.panel_message();
    for panel in PANELS {
        let id = format!("panel-msg-{}", panel_slug(panel));
        let text = message.as_ref().filter(|m| m.panel == panel).map_or("", |m| m.text.as_str());
        set_text(app, &id, text);
        if let Some(el) = app.document.get_element_by_id(&id) {
            let is_error = message.as_ref().is_some_and(|m| m.panel == panel && m.is_error);
            el.set_class_name(if is_error { "panel-msg error" } else { "panel-msg" });
        }
    }
}

fn start_status_timer(app: &Rc<App>) -> Result<(), JsValue> {
    let a = Rc::clone(app);
    let tick = Closure::wrap(Box::new(move || refresh_status(&a)) as Box<dyn FnMut()>);
    let millis = i32::try_from(app.config.stats_refresh_ms).unwrap_or(i32::MAX);
    app.window
        .set_interval_with_callback_and_timeout_and_arguments_0(tick.as_ref().unchecked_ref(), millis)?;
    tick.forget();
    refresh_status(app);
    Ok(())
}

fn wire_link_controls(app: &Rc<App>) -> Result<(), JsValue> {
    on_click(app, "reconnect", |app| {
        log::info!("manual reconnect");
        app.transport.reconnect();
    })?;
    on_click(app, "disconnect", |app| {
        log::info!("manual disconnect");
        app.transport.disconnect();
    })
}
