#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use store::Viewport;

use crate::consts::{ORIGIN_Y_FRACTION, WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// World point from an `[x, y]` vertex.
    #[must_use]
    pub fn from_vertex(v: [f32; 2]) -> Self {
        Self { x: f64::from(v[0]), y: f64::from(v[1]) }
    }

    /// `[x, y]` vertex in single precision, as the wire stores it.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn to_vertex(self) -> [f32; 2] {
        [self.x as f32, self.y as f32]
    }
}

/// Viewport plus canvas size: everything needed to map meters to pixels.
///
/// World Y points up; screen Y points down. The world origin sits at the
/// horizontal centre and 80% of the way down the canvas, shifted by the
/// viewport pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub viewport: Viewport,
    /// Canvas width in CSS pixels.
    pub width: f64,
    /// Canvas height in CSS pixels.
    pub height: f64,
}

impl Camera {
    #[must_use]
    pub fn new(viewport: Viewport, width: f64, height: f64) -> Self {
        Self { viewport, width, height }
    }

    /// Screen position of the world origin.
    #[must_use]
    pub fn origin(&self) -> Point {
        Point {
            x: self.width / 2.0 + self.viewport.pan_x,
            y: self.height * ORIGIN_Y_FRACTION + self.viewport.pan_y,
        }
    }

    /// Convert a world-space point (meters) to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        let origin = self.origin();
        Point {
            x: origin.x + world.x * self.viewport.scale,
            y: origin.y - world.y * self.viewport.scale,
        }
    }

    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        let origin = self.origin();
        Point {
            x: (screen.x - origin.x) / self.viewport.scale,
            y: (origin.y - screen.y) / self.viewport.scale,
        }
    }

    /// Convert a screen-space drag delta to a world-space delta.
    #[must_use]
    pub fn screen_delta_to_world(&self, dx: f64, dy: f64) -> Point {
        Point { x: dx / self.viewport.scale, y: -dy / self.viewport.scale }
    }

    /// Viewport after zooming by `factor` with `anchor` (screen) held fixed.
    ///
    /// The resulting scale is clamped, and the pan is corrected by the
    /// actual scale change so the anchored world point does not move.
    #[must_use]
    pub fn zoomed_at(&self, anchor: Point, factor: f64) -> Viewport {
        let world = self.screen_to_world(anchor);
        let old_scale = self.viewport.scale;
        let new_scale = Viewport::clamp_scale(old_scale * factor);
        let delta = new_scale - old_scale;
        Viewport {
            pan_x: self.viewport.pan_x - world.x * delta,
            pan_y: self.viewport.pan_y + world.y * delta,
            scale: new_scale,
        }
    }

    /// Whether a screen point lies within the canvas grown by `margin`.
    #[must_use]
    pub fn contains(&self, screen: Point, margin: f64) -> bool {
        screen.x >= -margin && screen.x <= self.width + margin && screen.y >= -margin && screen.y <= self.height + margin
    }
}

/// Zoom factor for a wheel event: scrolling down zooms out.
#[must_use]
pub fn wheel_zoom_factor(delta_y: f64) -> f64 {
    if delta_y > 0.0 { WHEEL_ZOOM_OUT } else { WHEEL_ZOOM_IN }
}
