//! Networking: the live channel and the REST surface.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` owns connection state and dispatch, `socket` drives it from a
//! browser WebSocket, `api` wraps the REST endpoints and `fps` estimates the
//! incoming frame rate.

pub mod api;
pub mod fps;
#[cfg(feature = "hydrate")]
pub mod socket;
pub mod transport;
