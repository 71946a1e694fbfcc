//! Side-panel features. Each module binds one panel's form to the store and
//! issues that panel's live messages or REST calls.

pub mod configs;
pub mod dbscan;
pub mod filters;
pub mod form;
pub mod sensors;
pub mod sinks;
