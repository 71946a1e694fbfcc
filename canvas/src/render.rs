//! Rendering: draws the full canvas scene to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It reads the store and the camera and produces pixels. The only state it
//! touches is the sensor palette, which assigns colours on first sight.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use store::{RoiEditMode, Selection, Store};
use wire::{ClusterItem, PointSet, Polygon, RoiKind, Sensor};

use crate::camera::{Camera, Point};
use crate::cull;
use crate::grid;
use crate::palette::{self, SensorPalette};
use crate::scene::{self, Layer};

const RAW_POINT_SIZE_PX: f64 = 2.0;
const FILTERED_POINT_RADIUS_PX: f64 = 2.0;
const CLUSTER_CENTER_RADIUS_PX: f64 = 4.0;
const SENSOR_RADIUS_PX: f64 = 8.0;
const SENSOR_ARROW_PX: f64 = 15.0;
const HANDLE_RADIUS_PX: f64 = 4.0;
const HANDLE_RADIUS_SELECTED_PX: f64 = 6.0;
const PREVIEW_DASH_PX: f64 = 5.0;

/// Draw the full scene.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    store: &Store,
    camera: &Camera,
    colors: &mut SensorPalette,
    dpr: f64,
) -> Result<(), JsValue> {
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, camera.width, camera.height);

    for layer in scene::layers(store) {
        match layer {
            Layer::Grid => draw_grid(ctx, camera)?,
            Layer::Rois => draw_rois(ctx, store, camera)?,
            Layer::RawPoints => draw_raw_points(ctx, store, camera, colors),
            Layer::FilteredPoints => draw_filtered_points(ctx, store, camera, colors)?,
            Layer::Clusters => draw_clusters(ctx, &store.cluster_items(), camera)?,
            Layer::Sensors => draw_sensors(ctx, store, camera)?,
            Layer::RoiPreview => draw_roi_preview(ctx, store, camera)?,
        }
    }
    Ok(())
}

// =============================================================
// Grid
// =============================================================

fn draw_grid(ctx: &CanvasRenderingContext2d, camera: &Camera) -> Result<(), JsValue> {
    let plan = grid::plan(camera);

    ctx.save();
    ctx.set_global_alpha(0.3);
    ctx.set_stroke_style_str(palette::GRID_LINE);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    for x in &plan.vertical {
        ctx.move_to(*x, 0.0);
        ctx.line_to(*x, camera.height);
    }
    for y in &plan.horizontal {
        ctx.move_to(0.0, *y);
        ctx.line_to(camera.width, *y);
    }
    ctx.stroke();
    ctx.restore();

    let origin = plan.origin;
    ctx.set_stroke_style_str(palette::GRID_ORIGIN);
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.move_to(origin.x, 0.0);
    ctx.line_to(origin.x, camera.height);
    ctx.move_to(0.0, origin.y);
    ctx.line_to(camera.width, origin.y);
    ctx.stroke();

    ctx.set_font("12px monospace");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    ctx.set_fill_style_str(palette::GRID_LABEL);
    for label in &plan.labels {
        ctx.fill_text(&label.text, label.at.x, label.at.y)?;
    }
    ctx.set_fill_style_str(palette::GRID_ORIGIN_LABEL);
    ctx.fill_text("0,0", origin.x + 15.0, origin.y - 15.0)?;
    Ok(())
}

// =============================================================
// Regions of interest
// =============================================================

fn draw_rois(ctx: &CanvasRenderingContext2d, store: &Store, camera: &Camera) -> Result<(), JsValue> {
    let mask = store.world_mask();
    let selection = store.selection();
    let selected = selection.roi();

    for kind in [RoiKind::Include, RoiKind::Exclude] {
        for (index, polygon) in mask.polygons(kind).iter().enumerate() {
            let is_selected = selected == Some((kind, index));
            draw_polygon(ctx, polygon, kind, is_selected, camera);
            if is_selected {
                let active_vertex = match &selection {
                    Selection::Vertex { vertex, .. } => Some(*vertex),
                    _ => None,
                };
                draw_handles(ctx, polygon, active_vertex, camera)?;
            }
        }
    }
    Ok(())
}

fn trace_path(ctx: &CanvasRenderingContext2d, vertices: &[[f32; 2]], camera: &Camera, close: bool) {
    ctx.begin_path();
    for (i, v) in vertices.iter().enumerate() {
        let p = camera.world_to_screen(Point::from_vertex(*v));
        if i == 0 {
            ctx.move_to(p.x, p.y);
        } else {
            ctx.line_to(p.x, p.y);
        }
    }
    if close {
        ctx.close_path();
    }
}

fn draw_polygon(ctx: &CanvasRenderingContext2d, polygon: &Polygon, kind: RoiKind, selected: bool, camera: &Camera) {
    if !polygon.is_valid() {
        return;
    }
    let style = palette::roi_style(kind, selected);
    trace_path(ctx, polygon.vertices(), camera, true);
    ctx.set_fill_style_str(style.fill);
    ctx.fill();
    ctx.set_stroke_style_str(style.stroke);
    ctx.set_line_width(if selected { 3.0 } else { 2.0 });
    ctx.stroke();
}

fn draw_handles(
    ctx: &CanvasRenderingContext2d,
    polygon: &Polygon,
    active: Option<usize>,
    camera: &Camera,
) -> Result<(), JsValue> {
    for (i, v) in polygon.vertices().iter().enumerate() {
        let p = camera.world_to_screen(Point::from_vertex(*v));
        let (radius, fill) = if active == Some(i) {
            (HANDLE_RADIUS_SELECTED_PX, palette::SENSOR_FILL_SELECTED)
        } else {
            (HANDLE_RADIUS_PX, palette::SENSOR_OUTLINE)
        };
        ctx.begin_path();
        ctx.arc(p.x, p.y, radius, 0.0, TAU)?;
        ctx.set_fill_style_str(fill);
        ctx.fill();
        ctx.set_stroke_style_str("#fff");
        ctx.set_line_width(1.0);
        ctx.stroke();
    }
    Ok(())
}

// =============================================================
// Points
// =============================================================

/// Colour for one point: the per-sensor palette when enabled and the frame
/// carries tags, else the layer colour.
fn point_color(
    points: &PointSet,
    index: usize,
    per_sensor: bool,
    colors: &mut SensorPalette,
    fallback: &'static str,
) -> &'static str {
    if per_sensor && !points.sid.is_empty() {
        colors.color(points.tag(index))
    } else {
        fallback
    }
}

fn draw_raw_points(ctx: &CanvasRenderingContext2d, store: &Store, camera: &Camera, colors: &mut SensorPalette) {
    let points = store.raw_points();
    let visible = cull::reduce(&points, camera, store.performance_mode(), store.max_points_to_render());
    let per_sensor = store.per_sensor_color();
    let half = RAW_POINT_SIZE_PX / 2.0;

    for index in 0..visible.len() {
        let (x, y) = visible.point(index);
        let p = camera.world_to_screen(Point::new(f64::from(x), f64::from(y)));
        ctx.set_fill_style_str(point_color(&visible, index, per_sensor, colors, palette::RAW_POINT));
        ctx.fill_rect(p.x - half, p.y - half, RAW_POINT_SIZE_PX, RAW_POINT_SIZE_PX);
    }
}

fn draw_filtered_points(
    ctx: &CanvasRenderingContext2d,
    store: &Store,
    camera: &Camera,
    colors: &mut SensorPalette,
) -> Result<(), JsValue> {
    let points = store.filtered_points();
    let visible = cull::reduce(&points, camera, store.performance_mode(), store.max_points_to_render());
    let per_sensor = store.per_sensor_color();

    for index in 0..visible.len() {
        let (x, y) = visible.point(index);
        let p = camera.world_to_screen(Point::new(f64::from(x), f64::from(y)));
        ctx.set_fill_style_str(point_color(&visible, index, per_sensor, colors, palette::FILTERED_POINT));
        ctx.begin_path();
        ctx.arc(p.x, p.y, FILTERED_POINT_RADIUS_PX, 0.0, TAU)?;
        ctx.fill();
    }
    Ok(())
}

// =============================================================
// Clusters
// =============================================================

fn draw_clusters(ctx: &CanvasRenderingContext2d, clusters: &[ClusterItem], camera: &Camera) -> Result<(), JsValue> {
    ctx.set_line_width(1.0);
    for cluster in clusters {
        let min = camera.world_to_screen(Point::new(f64::from(cluster.minx), f64::from(cluster.miny)));
        let max = camera.world_to_screen(Point::new(f64::from(cluster.maxx), f64::from(cluster.maxy)));
        ctx.set_stroke_style_str(palette::CLUSTER_STROKE);
        ctx.stroke_rect(min.x, max.y, max.x - min.x, min.y - max.y);

        let center = camera.world_to_screen(Point::new(f64::from(cluster.cx), f64::from(cluster.cy)));
        ctx.set_fill_style_str(palette::CLUSTER_FILL);
        ctx.begin_path();
        ctx.arc(center.x, center.y, CLUSTER_CENTER_RADIUS_PX, 0.0, TAU)?;
        ctx.fill();
    }
    Ok(())
}

// =============================================================
// Sensors
// =============================================================

fn draw_sensors(ctx: &CanvasRenderingContext2d, store: &Store, camera: &Camera) -> Result<(), JsValue> {
    let selection = store.selection();
    let selected = selection.sensor();
    for sensor in store.sensors().values() {
        draw_sensor(ctx, sensor, selected == Some(&sensor.id), camera)?;
    }
    Ok(())
}

fn draw_sensor(ctx: &CanvasRenderingContext2d, sensor: &Sensor, selected: bool, camera: &Camera) -> Result<(), JsValue> {
    let p = camera.world_to_screen(Point::new(f64::from(sensor.pose.tx), f64::from(sensor.pose.ty)));

    ctx.begin_path();
    ctx.arc(p.x, p.y, SENSOR_RADIUS_PX, 0.0, TAU)?;
    ctx.set_fill_style_str(if selected { palette::SENSOR_FILL_SELECTED } else { palette::SENSOR_FILL });
    ctx.fill();
    ctx.set_stroke_style_str(palette::SENSOR_OUTLINE);
    ctx.set_line_width(2.0);
    ctx.stroke();

    // Heading: world angle is counter-clockwise, screen y points down.
    let theta = f64::from(sensor.pose.theta_deg).to_radians();
    ctx.begin_path();
    ctx.move_to(p.x, p.y);
    ctx.line_to(p.x + SENSOR_ARROW_PX * theta.cos(), p.y - SENSOR_ARROW_PX * theta.sin());
    ctx.set_line_width(3.0);
    ctx.stroke();

    ctx.set_font("12px sans-serif");
    ctx.set_text_align("center");
    ctx.set_text_baseline("alphabetic");
    ctx.set_fill_style_str("#fff");
    ctx.fill_text(&sensor.label(), p.x, p.y - 15.0)?;
    Ok(())
}

// =============================================================
// Polygon creation preview
// =============================================================

fn draw_roi_preview(ctx: &CanvasRenderingContext2d, store: &Store, camera: &Camera) -> Result<(), JsValue> {
    let RoiEditMode::Create(kind) = store.roi_edit_mode() else {
        return Ok(());
    };
    let points = store.roi_points();
    let style = palette::roi_style(kind, false);
    let closed = points.len() >= Polygon::MIN_VERTICES;

    ctx.save();
    let dash = js_sys::Array::of2(&JsValue::from_f64(PREVIEW_DASH_PX), &JsValue::from_f64(PREVIEW_DASH_PX));
    ctx.set_line_dash(&dash)?;
    trace_path(ctx, &points, camera, closed);
    if closed {
        ctx.set_fill_style_str(style.preview_fill);
        ctx.fill();
    }
    ctx.set_stroke_style_str(style.stroke);
    ctx.set_line_width(2.0);
    ctx.stroke();
    ctx.restore();

    ctx.set_fill_style_str(style.stroke);
    for v in &points {
        let p = camera.world_to_screen(Point::from_vertex(*v));
        ctx.begin_path();
        ctx.arc(p.x, p.y, HANDLE_RADIUS_PX, 0.0, TAU)?;
        ctx.fill();
    }
    Ok(())
}
