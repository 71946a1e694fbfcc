//! Colours for points, clusters, sensors and ROI polygons.

#[cfg(test)]
#[path = "palette_test.rs"]
mod palette_test;

use wire::RoiKind;

/// Raw point colour when per-sensor colouring is off.
pub const RAW_POINT: &str = "#4fc3f7";
/// Filtered point colour when per-sensor colouring is off.
pub const FILTERED_POINT: &str = "#ff9800";

pub const CLUSTER_STROKE: &str = "#33c9";
pub const CLUSTER_FILL: &str = "#6cf9";

pub const SENSOR_FILL: &str = "#4ecdc4";
pub const SENSOR_FILL_SELECTED: &str = "#ff6b6b";
pub const SENSOR_OUTLINE: &str = "#2c3e50";

pub const GRID_LINE: &str = "#333";
pub const GRID_ORIGIN: &str = "#666";
pub const GRID_LABEL: &str = "#ddd";
pub const GRID_ORIGIN_LABEL: &str = "#fff";

/// Per-sensor colours, handed out in first-seen order and then reused.
pub const SENSOR_COLORS: [&str; 15] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c", "#e67e22", "#34495e", "#f1c40f", "#95a5a6",
    "#c0392b", "#2980b9", "#27ae60", "#d35400", "#8e44ad",
];

/// Fill and stroke of a ROI polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoiStyle {
    pub fill: &'static str,
    pub stroke: &'static str,
    /// Translucent fill used by the creation preview.
    pub preview_fill: &'static str,
}

#[must_use]
pub fn roi_style(kind: RoiKind, selected: bool) -> RoiStyle {
    match (kind, selected) {
        (RoiKind::Include, false) => RoiStyle {
            fill: "rgba(46, 204, 113, 0.2)",
            stroke: "#27ae60",
            preview_fill: "rgba(46, 204, 113, 0.1)",
        },
        (RoiKind::Include, true) => RoiStyle {
            fill: "rgba(46, 204, 113, 0.3)",
            stroke: "#1e8449",
            preview_fill: "rgba(46, 204, 113, 0.1)",
        },
        (RoiKind::Exclude, false) => RoiStyle {
            fill: "rgba(231, 76, 60, 0.2)",
            stroke: "#e74c3c",
            preview_fill: "rgba(231, 76, 60, 0.1)",
        },
        (RoiKind::Exclude, true) => RoiStyle {
            fill: "rgba(231, 76, 60, 0.3)",
            stroke: "#c0392b",
            preview_fill: "rgba(231, 76, 60, 0.1)",
        },
    }
}

/// Stable tag-to-colour assignment for the life of the page.
#[derive(Debug, Clone, Default)]
pub struct SensorPalette {
    seen: Vec<i32>,
}

impl SensorPalette {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Colour for a sensor tag, assigning the next free slot on first sight.
    pub fn color(&mut self, tag: i32) -> &'static str {
        let index = match self.seen.iter().position(|t| *t == tag) {
            Some(index) => index,
            None => {
                self.seen.push(tag);
                self.seen.len() - 1
            }
        };
        SENSOR_COLORS[index % SENSOR_COLORS.len()]
    }

    /// Number of distinct tags seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
