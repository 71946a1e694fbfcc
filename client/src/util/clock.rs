//! Wall-clock milliseconds, the time base for notices and frame ages.

/// Milliseconds since the Unix epoch.
#[cfg(feature = "hydrate")]
#[must_use]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch.
#[cfg(not(feature = "hydrate"))]
#[must_use]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}
