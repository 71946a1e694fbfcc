//! Point-set reduction for performance mode.
//!
//! Both steps copy; the store's point sets are never modified.

#[cfg(test)]
#[path = "cull_test.rs"]
mod cull_test;

use std::borrow::Cow;

use wire::PointSet;

use crate::camera::{Camera, Point};
use crate::consts::CULL_MARGIN_PX;

/// Keep only points projecting inside the canvas plus the cull margin.
#[must_use]
pub fn cull_to_viewport(points: &PointSet, camera: &Camera) -> PointSet {
    points.filtered(|_, x, y| {
        let screen = camera.world_to_screen(Point::new(f64::from(x), f64::from(y)));
        camera.contains(screen, CULL_MARGIN_PX)
    })
}

/// Decimation stride for `count` points under `cap`: `ceil(count / cap)`.
#[must_use]
pub fn decimation_step(count: usize, cap: usize) -> usize {
    if cap == 0 { count.max(1) } else { count.div_ceil(cap).max(1) }
}

/// Keep every Nth point when the set exceeds `cap`.
#[must_use]
pub fn decimate(points: &PointSet, cap: usize) -> PointSet {
    if points.len() <= cap {
        return points.clone();
    }
    let step = decimation_step(points.len(), cap);
    points.filtered(|i, _, _| i % step == 0)
}

/// Points to draw for one layer: the stored set as-is, or culled then
/// decimated when performance mode is on.
#[must_use]
pub fn reduce<'a>(points: &'a PointSet, camera: &Camera, performance_mode: bool, cap: usize) -> Cow<'a, PointSet> {
    if !performance_mode {
        return Cow::Borrowed(points);
    }
    let culled = cull_to_viewport(points, camera);
    if culled.len() > cap {
        Cow::Owned(decimate(&culled, cap))
    } else {
        Cow::Owned(culled)
    }
}
