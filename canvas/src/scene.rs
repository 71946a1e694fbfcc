//! Which layers a frame draws, in which order.
//!
//! The z-order is fixed: grid, ROI polygons (with handles when selected),
//! raw points, filtered points, clusters, sensors, then the in-progress
//! polygon preview. Selection handles sit above filled polygons and sensor
//! glyphs sit above every point layer so they stay clickable.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use store::{RoiEditMode, Store};

/// One drawable layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Grid,
    Rois,
    RawPoints,
    FilteredPoints,
    Clusters,
    Sensors,
    RoiPreview,
}

/// Every layer in paint order.
pub const LAYER_ORDER: [Layer; 7] = [
    Layer::Grid,
    Layer::Rois,
    Layer::RawPoints,
    Layer::FilteredPoints,
    Layer::Clusters,
    Layer::Sensors,
    Layer::RoiPreview,
];

/// The layers with something to draw right now, in paint order.
#[must_use]
pub fn layers(store: &Store) -> Vec<Layer> {
    LAYER_ORDER
        .into_iter()
        .filter(|layer| match layer {
            Layer::Grid => true,
            Layer::Rois => !store.world_mask().is_empty(),
            Layer::RawPoints => store.show_raw() && !store.raw_points().is_empty(),
            Layer::FilteredPoints => store.show_filtered() && !store.filtered_points().is_empty(),
            Layer::Clusters => !store.cluster_items().is_empty(),
            Layer::Sensors => !store.sensors().is_empty(),
            Layer::RoiPreview => {
                matches!(store.roi_edit_mode(), RoiEditMode::Create(_)) && store.roi_points().len() >= 2
            }
        })
        .collect()
}

/// Minimum spacing between paints for a target frame rate.
#[must_use]
pub fn frame_interval_ms(target_fps: u32) -> f64 {
    1000.0 / f64::from(target_fps.max(1))
}
