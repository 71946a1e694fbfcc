//! Pointer hit-testing against sensors, ROI vertices and ROI polygons.
//!
//! Priority on pointer-down is fixed: sensor glyph, then a vertex of the
//! currently selected polygon, then polygon interiors (includes before
//! excludes). Polygon-creation mode bypasses all of this and is handled by
//! the engine before any hit test runs.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use store::{Selection, SensorMap};
use wire::{Polygon, RoiKind, SensorId, WorldMask};

use crate::camera::{Camera, Point};
use crate::consts::{SENSOR_HIT_RADIUS_PX, VERTEX_HIT_RADIUS_PX};

/// What a pointer-down landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    Sensor(SensorId),
    Vertex { kind: RoiKind, roi: usize, vertex: usize },
    Roi { kind: RoiKind, index: usize },
    Empty,
}

/// Even-odd (ray casting) containment test in world coordinates.
#[must_use]
pub fn point_in_polygon(world: Point, vertices: &[[f32; 2]]) -> bool {
    let n = vertices.len();
    if n < Polygon::MIN_VERTICES {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = Point::from_vertex(vertices[i]);
        let b = Point::from_vertex(vertices[j]);
        if (a.y > world.y) != (b.y > world.y) {
            let cross_x = (b.x - a.x) * (world.y - a.y) / (b.y - a.y) + a.x;
            if world.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// First sensor whose glyph is within the pick radius of `screen`.
#[must_use]
pub fn sensor_at(camera: &Camera, screen: Point, sensors: &SensorMap) -> Option<SensorId> {
    sensors
        .values()
        .find(|sensor| {
            let pose = sensor.pose;
            let at = camera.world_to_screen(Point::new(f64::from(pose.tx), f64::from(pose.ty)));
            at.distance(screen) <= SENSOR_HIT_RADIUS_PX
        })
        .map(|sensor| sensor.id.clone())
}

/// First vertex handle of `polygon` within the pick radius of `screen`.
#[must_use]
pub fn vertex_at(camera: &Camera, screen: Point, polygon: &Polygon) -> Option<usize> {
    polygon
        .vertices()
        .iter()
        .position(|v| camera.world_to_screen(Point::from_vertex(*v)).distance(screen) <= VERTEX_HIT_RADIUS_PX)
}

/// First polygon containing the world point; includes are checked first.
#[must_use]
pub fn roi_at(world: Point, mask: &WorldMask) -> Option<(RoiKind, usize)> {
    [RoiKind::Include, RoiKind::Exclude].into_iter().find_map(|kind| {
        mask.polygons(kind)
            .iter()
            .position(|polygon| point_in_polygon(world, polygon.vertices()))
            .map(|index| (kind, index))
    })
}

/// Resolve a pointer-down at `screen` using the fixed priority order.
#[must_use]
pub fn hit_test(camera: &Camera, screen: Point, sensors: &SensorMap, mask: &WorldMask, selection: &Selection) -> Hit {
    if let Some(id) = sensor_at(camera, screen, sensors) {
        return Hit::Sensor(id);
    }
    if let Some((kind, roi)) = selection.roi() {
        if let Some(vertex) = mask.polygon(kind, roi).and_then(|p| vertex_at(camera, screen, p)) {
            return Hit::Vertex { kind, roi, vertex };
        }
    }
    match roi_at(camera.screen_to_world(screen), mask) {
        Some((kind, index)) => Hit::Roi { kind, index },
        None => Hit::Empty,
    }
}
