//! Browser client for the LIDAR hub.
//!
//! Connects to the hub's live channel, keeps the shared [`store::Store`]
//! current, and drives the `canvas` engine and the side panels from it.
//! Everything except [`app`] and [`net::socket`] builds natively, so the
//! transport, feature modules and helpers are unit-tested without a browser.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Endpoints, reconnect policy, debounce and message lifetimes |
//! | [`net`] | Live-channel transport, socket driver, REST client, FPS tracker |
//! | [`features`] | Sensors, filters, DBSCAN, sinks and configs panels |
//! | [`util`] | Clock, debounce, notices and status-bar text |
//! | `app` | `hydrate` only: boot and DOM wiring |

pub mod config;
pub mod features;
pub mod net;
pub mod util;

#[cfg(feature = "hydrate")]
pub mod app;
