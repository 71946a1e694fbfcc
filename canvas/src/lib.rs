//! Canvas rendering and interaction engine for the LIDAR hub viewer.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! world view: mapping meters to pixels for pan/zoom, hit-testing sensors and
//! region-of-interest polygons, running the drag/edit gesture machine, and
//! painting the scene from the shared [`store::Store`]. The host layer wires
//! DOM events to the engine and delivers the resulting [`engine::Action`]s
//! over the live channel.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`camera`] | World/screen transforms and anchored zoom |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing sensors, vertex handles and polygons |
//! | [`roi`] | Polygon edits that never leave fewer than three vertices |
//! | [`grid`] | Meter grid and adaptive axis labels |
//! | [`cull`] | Viewport culling and point decimation |
//! | [`scene`] | Layer order and frame pacing |
//! | [`palette`] | Point, cluster, sensor and polygon colours |
//! | [`render`] | Scene rendering to a `Canvas2D` context |
//! | [`consts`] | Shared numeric constants (zoom steps, hit radii, grid ladder) |

pub mod camera;
pub mod consts;
pub mod cull;
pub mod engine;
pub mod grid;
pub mod hit;
pub mod input;
pub mod palette;
pub mod render;
pub mod roi;
pub mod scene;
