//! Frame-rate estimate over a sliding window of arrival times.

#[cfg(test)]
#[path = "fps_test.rs"]
mod fps_test;

use std::collections::VecDeque;

/// Arrivals kept for the estimate.
pub const FPS_WINDOW: usize = 30;

#[derive(Debug, Clone, Default)]
pub struct FpsTracker {
    arrivals: VecDeque<f64>,
}

impl FpsTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame arriving at `now_ms` and return the updated rate.
    pub fn record(&mut self, now_ms: f64) -> f64 {
        if self.arrivals.len() == FPS_WINDOW {
            self.arrivals.pop_front();
        }
        self.arrivals.push_back(now_ms);
        self.fps()
    }

    /// Frames per second across the window; zero until two frames with
    /// distinct timestamps have arrived.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.arrivals.front(), self.arrivals.back()) else {
            return 0.0;
        };
        let span = last - first;
        if span <= 0.0 {
            return 0.0;
        }
        (self.arrivals.len() - 1) as f64 * 1000.0 / span
    }

    pub fn reset(&mut self) {
        self.arrivals.clear();
    }
}
