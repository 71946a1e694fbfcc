//! Region-of-interest geometry edits.
//!
//! Every function takes the world mask by `&mut` and either applies the edit
//! completely or leaves the mask untouched and returns an error. No edit can
//! leave a persisted polygon with fewer than three vertices.

#[cfg(test)]
#[path = "roi_test.rs"]
mod roi_test;

use thiserror::Error;
use wire::{Polygon, RoiKind, WorldMask};

/// Why a polygon edit was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoiEditError {
    #[error("a polygon must keep at least {} vertices", Polygon::MIN_VERTICES)]
    TooFewVertices,
    #[error("no {} polygon at index {index}", .kind.as_str())]
    NoSuchPolygon { kind: RoiKind, index: usize },
    #[error("polygon has no vertex {0}")]
    NoSuchVertex(usize),
    #[error("need at least {min} points to close a polygon, have {0}", min = Polygon::MIN_VERTICES)]
    NotEnoughPoints(usize),
}

fn polygon_mut(mask: &mut WorldMask, kind: RoiKind, index: usize) -> Result<&mut Polygon, RoiEditError> {
    mask.polygons_mut(kind)
        .get_mut(index)
        .ok_or(RoiEditError::NoSuchPolygon { kind, index })
}

/// Remove one vertex. Refused when the polygon has three or fewer.
///
/// # Errors
///
/// `NoSuchPolygon`, `NoSuchVertex` or `TooFewVertices`.
pub fn delete_vertex(mask: &mut WorldMask, kind: RoiKind, roi: usize, vertex: usize) -> Result<(), RoiEditError> {
    let polygon = polygon_mut(mask, kind, roi)?;
    if vertex >= polygon.len() {
        return Err(RoiEditError::NoSuchVertex(vertex));
    }
    if polygon.len() <= Polygon::MIN_VERTICES {
        return Err(RoiEditError::TooFewVertices);
    }
    polygon.0.remove(vertex);
    Ok(())
}

/// Insert the midpoint of `vertex` and its successor (wrapping to the first
/// vertex). Returns the index of the new vertex.
///
/// # Errors
///
/// `NoSuchPolygon` or `NoSuchVertex`.
pub fn insert_midpoint(mask: &mut WorldMask, kind: RoiKind, roi: usize, vertex: usize) -> Result<usize, RoiEditError> {
    let polygon = polygon_mut(mask, kind, roi)?;
    let n = polygon.len();
    if vertex >= n {
        return Err(RoiEditError::NoSuchVertex(vertex));
    }
    let a = polygon.0[vertex];
    let b = polygon.0[(vertex + 1) % n];
    let mid = [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0];
    polygon.0.insert(vertex + 1, mid);
    Ok(vertex + 1)
}

/// Move one vertex to an absolute world position.
///
/// # Errors
///
/// `NoSuchPolygon` or `NoSuchVertex`.
pub fn move_vertex(mask: &mut WorldMask, kind: RoiKind, roi: usize, vertex: usize, to: [f32; 2]) -> Result<(), RoiEditError> {
    let polygon = polygon_mut(mask, kind, roi)?;
    let slot = polygon.0.get_mut(vertex).ok_or(RoiEditError::NoSuchVertex(vertex))?;
    *slot = to;
    Ok(())
}

/// Shift every vertex of one polygon by the same world delta.
///
/// # Errors
///
/// `NoSuchPolygon`.
pub fn translate_roi(mask: &mut WorldMask, kind: RoiKind, roi: usize, dx: f32, dy: f32) -> Result<(), RoiEditError> {
    let polygon = polygon_mut(mask, kind, roi)?;
    for v in &mut polygon.0 {
        v[0] += dx;
        v[1] += dy;
    }
    Ok(())
}

/// Remove a whole polygon and return it.
///
/// # Errors
///
/// `NoSuchPolygon`.
pub fn delete_roi(mask: &mut WorldMask, kind: RoiKind, roi: usize) -> Result<Polygon, RoiEditError> {
    let list = mask.polygons_mut(kind);
    if roi >= list.len() {
        return Err(RoiEditError::NoSuchPolygon { kind, index: roi });
    }
    Ok(list.remove(roi))
}

/// Close the in-progress point list into a new polygon. Returns its index.
///
/// # Errors
///
/// `NotEnoughPoints` when fewer than three points were placed.
pub fn finish_polygon(mask: &mut WorldMask, kind: RoiKind, points: &[[f32; 2]]) -> Result<usize, RoiEditError> {
    if points.len() < Polygon::MIN_VERTICES {
        return Err(RoiEditError::NotEnoughPoints(points.len()));
    }
    let list = mask.polygons_mut(kind);
    list.push(Polygon(points.to_vec()));
    Ok(list.len() - 1)
}
