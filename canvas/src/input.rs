//! Input model: mouse buttons, keys, wheel deltas and the gesture state machine.
//!
//! `InputState` is the active gesture between pointer-down and pointer-up.
//! Each dragging variant carries what is needed to compute incremental
//! deltas on move and to decide on release whether anything must be sent.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use wire::{RoiKind, SensorId};

use crate::camera::Point;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button; always pans.
    Middle,
    /// Right mouse button; ignored by the canvas.
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// A keyboard key as reported by `KeyboardEvent.key` (e.g. `"Delete"`, `"r"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging empty space; screen deltas go straight into the pan offset.
    Panning {
        last_screen: Point,
    },
    /// Moving a sensor. The pose is updated in the store on every move and
    /// sent once on release.
    DraggingSensor {
        id: SensorId,
        last_screen: Point,
        moved: bool,
    },
    /// Moving one vertex of a polygon to the pointer position.
    DraggingVertex {
        kind: RoiKind,
        roi: usize,
        vertex: usize,
        moved: bool,
    },
    /// Translating a whole polygon.
    DraggingRoi {
        kind: RoiKind,
        index: usize,
        last_screen: Point,
        moved: bool,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// CSS cursor for this gesture.
    #[must_use]
    pub fn cursor(&self) -> &'static str {
        match self {
            Self::Idle => "default",
            Self::Panning { .. } => "grabbing",
            Self::DraggingSensor { .. } | Self::DraggingRoi { .. } => "move",
            Self::DraggingVertex { .. } => "pointer",
        }
    }
}
