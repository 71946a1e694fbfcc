//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Fraction of the canvas height at which the world origin sits.
pub const ORIGIN_Y_FRACTION: f64 = 0.8;

/// Wheel zoom factor when scrolling down (zoom out).
pub const WHEEL_ZOOM_OUT: f64 = 0.9;

/// Wheel zoom factor when scrolling up (zoom in).
pub const WHEEL_ZOOM_IN: f64 = 1.1;

/// Arrow-key pan step in screen pixels.
pub const KEY_PAN_STEP_PX: f64 = 20.0;

/// `R`/`r` rotation step in degrees.
pub const ROTATE_STEP_DEG: f32 = 15.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Pick radius around a sensor glyph, in screen pixels.
pub const SENSOR_HIT_RADIUS_PX: f64 = 12.0;

/// Pick radius around a ROI vertex handle, in screen pixels.
pub const VERTEX_HIT_RADIUS_PX: f64 = 8.0;

// ── Performance ─────────────────────────────────────────────────

/// Off-screen margin kept by viewport culling, in screen pixels.
pub const CULL_MARGIN_PX: f64 = 50.0;

// ── Grid ────────────────────────────────────────────────────────

/// Candidate label spacings in meters, smallest first.
pub const GRID_STEPS_M: [f64; 13] = [0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0];

/// Minimum on-screen distance between two grid labels.
pub const MIN_LABEL_PITCH_PX: f64 = 80.0;

/// Labels this close to zero are hidden behind the origin marker.
pub const ORIGIN_LABEL_EPSILON_M: f64 = 0.001;

/// Spacing of the background grid lines, in meters.
pub const GRID_LINE_SPACING_M: f64 = 1.0;
