//! Utility helpers shared across the client's feature modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Timers, user feedback and status formatting live here so feature modules
//! stay focused on their own records.

pub mod clock;
pub mod debounce;
pub mod notice;
pub mod stats;
