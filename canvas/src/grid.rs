//! Background grid and axis labels.
//!
//! Lines are drawn every meter. Labels use a coarser spacing picked from a
//! fixed ladder so they stay at least [`MIN_LABEL_PITCH_PX`] apart at any
//! zoom level.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use crate::camera::{Camera, Point};
use crate::consts::{GRID_LINE_SPACING_M, GRID_STEPS_M, MIN_LABEL_PITCH_PX, ORIGIN_LABEL_EPSILON_M};

/// One positioned axis label.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLabel {
    pub text: String,
    pub at: Point,
}

/// Everything the renderer needs to draw the grid layer.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPlan {
    /// Screen x of each vertical line.
    pub vertical: Vec<f64>,
    /// Screen y of each horizontal line.
    pub horizontal: Vec<f64>,
    /// Label spacing in meters.
    pub label_step: f64,
    pub labels: Vec<GridLabel>,
    /// Screen position of the world origin marker.
    pub origin: Point,
}

/// Smallest ladder step whose on-screen pitch reaches the minimum.
#[must_use]
pub fn label_step(scale: f64) -> f64 {
    let largest = GRID_STEPS_M[GRID_STEPS_M.len() - 1];
    GRID_STEPS_M
        .iter()
        .copied()
        .find(|step| step * scale >= MIN_LABEL_PITCH_PX)
        .unwrap_or(largest)
}

/// Text of an axis label, or `None` for values hidden by the origin marker.
///
/// Sub-meter steps print one decimal; whole-meter steps print none.
#[must_use]
pub fn format_label(value: f64, step: f64) -> Option<String> {
    if value.abs() <= ORIGIN_LABEL_EPSILON_M {
        return None;
    }
    let decimals = usize::from(step < 1.0);
    Some(format!("{value:.decimals$}m"))
}

/// Multiples of `step` within `[lo, hi]`, computed from integer indices so
/// values do not accumulate rounding drift.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn multiples(lo: f64, hi: f64, step: f64) -> impl Iterator<Item = f64> {
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(move |k| k as f64 * step)
}

fn line_positions(start: f64, pitch: f64, extent: f64) -> Vec<f64> {
    if pitch <= 0.0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut at = start.rem_euclid(pitch);
    while at < extent {
        out.push(at);
        at += pitch;
    }
    out
}

/// Lay out grid lines and labels for the current camera.
#[must_use]
pub fn plan(camera: &Camera) -> GridPlan {
    let origin = camera.origin();
    let pitch = GRID_LINE_SPACING_M * camera.viewport.scale;
    let step = label_step(camera.viewport.scale);

    let top_left = camera.screen_to_world(Point::new(0.0, 0.0));
    let bottom_right = camera.screen_to_world(Point::new(camera.width, camera.height));

    let mut labels = Vec::new();

    let label_y = (origin.y + 15.0).max(15.0).min(camera.height - 5.0);
    for wx in multiples(top_left.x, bottom_right.x, step) {
        if let Some(text) = format_label(wx, step) {
            let x = camera.world_to_screen(Point::new(wx, 0.0)).x;
            labels.push(GridLabel { text, at: Point::new(x, label_y) });
        }
    }

    let label_x = (origin.x - 25.0).max(25.0).min(camera.width - 25.0);
    for wy in multiples(bottom_right.y, top_left.y, step) {
        if let Some(text) = format_label(wy, step) {
            let y = camera.world_to_screen(Point::new(0.0, wy)).y;
            labels.push(GridLabel { text, at: Point::new(label_x, y) });
        }
    }

    GridPlan {
        vertical: line_positions(origin.x, pitch, camera.width),
        horizontal: line_positions(origin.y, pitch, camera.height),
        label_step: step,
        labels,
        origin,
    }
}
