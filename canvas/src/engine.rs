use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use store::{RoiEditMode, Selection, StateKey, StateValue, Store, Subscription, Viewport};
use wire::{ClientMessage, RoiKind, SensorId, SensorPatch};

use crate::camera::{Camera, Point, wheel_zoom_factor};
use crate::consts::{KEY_PAN_STEP_PX, ROTATE_STEP_DEG, WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT};
use crate::hit::{Hit, hit_test};
use crate::input::{Button, InputState, Key, WheelDelta};
use crate::palette::SensorPalette;
use crate::render;
use crate::roi::{self, RoiEditError};
use crate::scene::frame_interval_ms;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Store keys whose change requires a repaint.
pub const REDRAW_KEYS: [StateKey; 14] = [
    StateKey::RawPoints,
    StateKey::FilteredPoints,
    StateKey::ClusterItems,
    StateKey::Sensors,
    StateKey::WorldMask,
    StateKey::Viewport,
    StateKey::ShowRaw,
    StateKey::ShowFiltered,
    StateKey::PerSensorColor,
    StateKey::PerformanceMode,
    StateKey::MaxPointsToRender,
    StateKey::Selection,
    StateKey::RoiPoints,
    StateKey::RoiEditMode,
];

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Deliver this message over the live channel.
    Send(ClientMessage),
    SetCursor(String),
    /// A geometry edit was refused; the store is unchanged.
    Rejected(RoiEditError),
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    store: Rc<Store>,
    pub input: InputState,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
    pub palette: SensorPalette,
    dirty: Rc<Cell<bool>>,
    last_paint: Option<f64>,
    _subscriptions: Vec<Subscription>,
}

impl EngineCore {
    #[must_use]
    pub fn new(store: Rc<Store>) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let subscriptions = REDRAW_KEYS
            .iter()
            .map(|key| {
                let dirty = Rc::clone(&dirty);
                store.subscribe(*key, move |_, _, _| {
                    dirty.set(true);
                    Ok(())
                })
            })
            .collect();
        Self {
            store,
            input: InputState::Idle,
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
            palette: SensorPalette::new(),
            dirty,
            last_paint: None,
            _subscriptions: subscriptions,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Rc<Store> {
        &self.store
    }

    /// Camera for the current viewport and canvas size.
    #[must_use]
    pub fn camera(&self) -> Camera {
        Camera::new(self.store.viewport(), self.viewport_width, self.viewport_height)
    }

    pub fn set_size(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = if dpr > 0.0 { dpr } else { 1.0 };
        self.request_redraw();
    }

    // --- Frame pacing ---

    pub fn request_redraw(&self) {
        self.dirty.set(true);
    }

    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.dirty.get()
    }

    /// Whether a vsync tick at `now_ms` should paint: something changed and
    /// at least one target frame interval has elapsed since the last paint.
    #[must_use]
    pub fn should_paint(&self, now_ms: f64) -> bool {
        if !self.dirty.get() {
            return false;
        }
        let interval = frame_interval_ms(self.store.target_fps());
        self.last_paint.is_none_or(|last| now_ms - last >= interval)
    }

    pub fn mark_painted(&mut self, now_ms: f64) {
        self.dirty.set(false);
        self.last_paint = Some(now_ms);
    }

    // --- Pointer ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button) -> Vec<Action> {
        match button {
            Button::Secondary => return Vec::new(),
            Button::Middle => {
                self.input = InputState::Panning { last_screen: screen };
                return vec![self.cursor_action()];
            }
            Button::Primary => {}
        }

        if let RoiEditMode::Create(_) = self.store.roi_edit_mode() {
            let world = self.camera().screen_to_world(screen);
            let mut points = self.store.roi_points();
            points.push(world.to_vertex());
            self.store.set(StateValue::RoiPoints(points));
            return Vec::new();
        }

        let camera = self.camera();
        let hit = hit_test(
            &camera,
            screen,
            &self.store.sensors(),
            &self.store.world_mask(),
            &self.store.selection(),
        );
        let (selection, input) = match hit {
            Hit::Sensor(id) => (
                Selection::Sensor(id.clone()),
                InputState::DraggingSensor { id, last_screen: screen, moved: false },
            ),
            Hit::Vertex { kind, roi, vertex } => (
                Selection::Vertex { kind, roi, vertex },
                InputState::DraggingVertex { kind, roi, vertex, moved: false },
            ),
            Hit::Roi { kind, index } => (
                Selection::Roi { kind, index },
                InputState::DraggingRoi { kind, index, last_screen: screen, moved: false },
            ),
            Hit::Empty => (Selection::None, InputState::Panning { last_screen: screen }),
        };
        self.store.set(StateValue::Selection(selection));
        self.input = input;
        vec![self.cursor_action()]
    }

    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<Action> {
        let camera = self.camera();
        match &mut self.input {
            InputState::Idle => {}
            InputState::Panning { last_screen } => {
                let (dx, dy) = (screen.x - last_screen.x, screen.y - last_screen.y);
                *last_screen = screen;
                self.store.set(StateValue::Viewport(self.store.viewport().panned(dx, dy)));
            }
            InputState::DraggingSensor { id, last_screen, moved } => {
                let delta = camera.screen_delta_to_world(screen.x - last_screen.x, screen.y - last_screen.y);
                *last_screen = screen;
                let [dx, dy] = delta.to_vertex();
                if self.store.update_sensor(id, |sensor| sensor.with_pose(sensor.pose.translated(dx, dy))) {
                    *moved = true;
                }
            }
            InputState::DraggingVertex { kind, roi, vertex, moved } => {
                let to = camera.screen_to_world(screen).to_vertex();
                let mut mask = self.store.world_mask();
                if roi::move_vertex(&mut mask, *kind, *roi, *vertex, to).is_ok() {
                    self.store.set(StateValue::WorldMask(mask));
                    *moved = true;
                }
            }
            InputState::DraggingRoi { kind, index, last_screen, moved } => {
                let delta = camera.screen_delta_to_world(screen.x - last_screen.x, screen.y - last_screen.y);
                *last_screen = screen;
                let [dx, dy] = delta.to_vertex();
                let mut mask = self.store.world_mask();
                if roi::translate_roi(&mut mask, *kind, *index, dx, dy).is_ok() {
                    self.store.set(StateValue::WorldMask(mask));
                    *moved = true;
                }
            }
        }
        Vec::new()
    }

    /// End the gesture. Moved sensors send one pose patch; moved polygons
    /// send the whole world mask.
    pub fn on_pointer_up(&mut self, _screen: Point) -> Vec<Action> {
        let finished = std::mem::take(&mut self.input);
        let mut actions = Vec::new();
        match finished {
            InputState::DraggingSensor { id, moved: true, .. } => {
                if let Some(action) = self.sensor_pose_patch(&id) {
                    actions.push(action);
                }
            }
            InputState::DraggingVertex { moved: true, .. } | InputState::DraggingRoi { moved: true, .. } => {
                actions.push(self.world_mask_send());
            }
            _ => {}
        }
        actions.push(self.cursor_action());
        actions
    }

    /// Zoom toward the cursor.
    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta) -> Vec<Action> {
        let viewport = self.camera().zoomed_at(screen, wheel_zoom_factor(delta.dy));
        self.store.set(StateValue::Viewport(viewport));
        Vec::new()
    }

    /// Restore the default view.
    pub fn on_double_click(&mut self) -> Vec<Action> {
        self.store.set(StateValue::Viewport(Viewport::reset()));
        Vec::new()
    }

    // --- Keyboard ---

    /// Handle a key press. Ignored while a text input has focus.
    pub fn on_key_down(&mut self, key: &Key, text_focused: bool) -> Vec<Action> {
        if text_focused {
            return Vec::new();
        }
        let viewport = self.store.viewport();
        match key.as_str() {
            "ArrowLeft" => self.set_viewport(viewport.panned(KEY_PAN_STEP_PX, 0.0)),
            "ArrowRight" => self.set_viewport(viewport.panned(-KEY_PAN_STEP_PX, 0.0)),
            "ArrowUp" => self.set_viewport(viewport.panned(0.0, KEY_PAN_STEP_PX)),
            "ArrowDown" => self.set_viewport(viewport.panned(0.0, -KEY_PAN_STEP_PX)),
            "+" | "=" => self.set_viewport(Viewport { scale: Viewport::clamp_scale(viewport.scale * WHEEL_ZOOM_IN), ..viewport }),
            "-" => self.set_viewport(Viewport { scale: Viewport::clamp_scale(viewport.scale * WHEEL_ZOOM_OUT), ..viewport }),
            "p" | "P" => {
                self.toggle_performance_mode();
                Vec::new()
            }
            "R" => self.rotate_selected_sensor(-ROTATE_STEP_DEG),
            "r" => self.rotate_selected_sensor(ROTATE_STEP_DEG),
            "Enter" => self.finish_polygon(),
            "Escape" => self.cancel_polygon(),
            "Delete" | "Backspace" => self.delete_selection(),
            "Insert" => self.insert_vertex(),
            _ => Vec::new(),
        }
    }

    // --- Commands ---

    pub fn toggle_performance_mode(&self) {
        let on = !self.store.performance_mode();
        log::info!("performance mode {}", if on { "on" } else { "off" });
        self.store.set(StateValue::PerformanceMode(on));
    }

    /// Rotate the selected sensor and send the new pose immediately.
    pub fn rotate_selected_sensor(&mut self, delta_deg: f32) -> Vec<Action> {
        let Selection::Sensor(id) = self.store.selection() else {
            return Vec::new();
        };
        if !self.store.update_sensor(&id, |sensor| sensor.with_pose(sensor.pose.rotated(delta_deg))) {
            return Vec::new();
        }
        self.sensor_pose_patch(&id).into_iter().collect()
    }

    /// Enter polygon-creation mode, discarding any selection.
    pub fn begin_polygon(&mut self, kind: RoiKind) -> Vec<Action> {
        self.input = InputState::Idle;
        self.store.update([
            StateValue::RoiEditMode(RoiEditMode::Create(kind)),
            StateValue::RoiPoints(Vec::new()),
            StateValue::Selection(Selection::None),
        ]);
        vec![self.cursor_action()]
    }

    /// Leave creation mode and clear every selection.
    pub fn cancel_polygon(&mut self) -> Vec<Action> {
        self.store.update([
            StateValue::RoiEditMode(RoiEditMode::None),
            StateValue::RoiPoints(Vec::new()),
            StateValue::Selection(Selection::None),
        ]);
        vec![self.cursor_action()]
    }

    /// Close the in-progress polygon and send the world mask.
    pub fn finish_polygon(&mut self) -> Vec<Action> {
        let RoiEditMode::Create(kind) = self.store.roi_edit_mode() else {
            return Vec::new();
        };
        let mut mask = self.store.world_mask();
        match roi::finish_polygon(&mut mask, kind, &self.store.roi_points()) {
            Ok(index) => {
                log::debug!("added {} polygon {index}", kind.as_str());
                self.store.update([
                    StateValue::WorldMask(mask),
                    StateValue::RoiPoints(Vec::new()),
                    StateValue::RoiEditMode(RoiEditMode::None),
                ]);
                vec![self.world_mask_send(), self.cursor_action()]
            }
            Err(err) => vec![Action::Rejected(err)],
        }
    }

    /// Remove every polygon and send the empty mask.
    pub fn clear_world_mask(&mut self) -> Vec<Action> {
        let selection = match self.store.selection() {
            Selection::Roi { .. } | Selection::Vertex { .. } => Selection::None,
            other => other,
        };
        self.store.update([StateValue::WorldMask(wire::WorldMask::default()), StateValue::Selection(selection)]);
        vec![self.world_mask_send()]
    }

    /// `Delete`: remove the selected vertex, or the selected polygon when no
    /// vertex is selected.
    pub fn delete_selection(&mut self) -> Vec<Action> {
        let mut mask = self.store.world_mask();
        let result = match self.store.selection() {
            Selection::Vertex { kind, roi, vertex } => {
                roi::delete_vertex(&mut mask, kind, roi, vertex).map(|()| Selection::Roi { kind, index: roi })
            }
            Selection::Roi { kind, index } => roi::delete_roi(&mut mask, kind, index).map(|_| Selection::None),
            Selection::None | Selection::Sensor(_) => return Vec::new(),
        };
        self.commit_mask_edit(mask, result)
    }

    /// `Insert`: add a vertex after the selected one and select it.
    pub fn insert_vertex(&mut self) -> Vec<Action> {
        let Selection::Vertex { kind, roi, vertex } = self.store.selection() else {
            return Vec::new();
        };
        let mut mask = self.store.world_mask();
        let result = roi::insert_midpoint(&mut mask, kind, roi, vertex).map(|vertex| Selection::Vertex { kind, roi, vertex });
        self.commit_mask_edit(mask, result)
    }

    // --- Helpers ---

    fn commit_mask_edit(&self, mask: wire::WorldMask, result: Result<Selection, RoiEditError>) -> Vec<Action> {
        match result {
            Ok(selection) => {
                self.store.update([StateValue::WorldMask(mask), StateValue::Selection(selection)]);
                vec![self.world_mask_send()]
            }
            Err(err) => {
                log::debug!("geometry edit refused: {err}");
                vec![Action::Rejected(err)]
            }
        }
    }

    fn set_viewport(&self, viewport: Viewport) -> Vec<Action> {
        self.store.set(StateValue::Viewport(viewport));
        Vec::new()
    }

    fn sensor_pose_patch(&self, id: &SensorId) -> Option<Action> {
        let sensor = self.store.get_sensor(id)?;
        Some(Action::Send(ClientMessage::SensorUpdate {
            id: id.clone(),
            patch: SensorPatch::pose(sensor.pose),
            client_id: Some(self.store.client_id().to_owned()),
        }))
    }

    fn world_mask_send(&self) -> Action {
        let mut mask = self.store.world_mask();
        let dropped = mask.retain_valid();
        if dropped > 0 {
            log::warn!("not sending {dropped} degenerate polygon(s)");
        }
        Action::Send(ClientMessage::world_update(mask))
    }

    fn cursor_action(&self) -> Action {
        let cursor = match (&self.input, self.store.roi_edit_mode()) {
            (InputState::Idle, RoiEditMode::Create(_)) => "crosshair",
            (input, _) => input.cursor(),
        };
        Action::SetCursor(cursor.to_owned())
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pub core: EngineCore,
}

impl Engine {
    /// Bind to a canvas element and its 2D context.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the element has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, store: Rc<Store>) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx, core: EngineCore::new(store) })
    }

    // --- Viewport ---

    /// Resize the backing store to CSS size times device pixel ratio.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_size(width_css, height_css, dpr);
        self.canvas.set_width((width_css * self.core.dpr).round().max(0.0) as u32);
        self.canvas.set_height((height_css * self.core.dpr).round().max(0.0) as u32);
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button) -> Vec<Action> {
        self.core.on_pointer_down(screen, button)
    }

    pub fn on_pointer_move(&mut self, screen: Point) -> Vec<Action> {
        self.core.on_pointer_move(screen)
    }

    pub fn on_pointer_up(&mut self, screen: Point) -> Vec<Action> {
        self.core.on_pointer_up(screen)
    }

    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta) -> Vec<Action> {
        self.core.on_wheel(screen, delta)
    }

    pub fn on_double_click(&mut self) -> Vec<Action> {
        self.core.on_double_click()
    }

    pub fn on_key_down(&mut self, key: &Key, text_focused: bool) -> Vec<Action> {
        self.core.on_key_down(key, text_focused)
    }

    // --- Render ---

    /// Paint if the frame gate allows it. Returns whether a paint happened.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a `Canvas2D` call fails.
    pub fn tick(&mut self, now_ms: f64) -> Result<bool, JsValue> {
        if !self.core.should_paint(now_ms) {
            return Ok(false);
        }
        self.render()?;
        self.core.mark_painted(now_ms);
        Ok(true)
    }

    /// Draw the current state to the canvas unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a `Canvas2D` call fails.
    pub fn render(&mut self) -> Result<(), JsValue> {
        let camera = self.core.camera();
        let store = Rc::clone(self.core.store());
        render::draw(&self.ctx, &store, &camera, &mut self.core.palette, self.core.dpr)
    }
}
