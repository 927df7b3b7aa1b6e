//! Per-frame input
//!
//! Hosts fill a [`FrameInput`] from whatever they have (accelerometer,
//! mouse, touch) and pass it to [`crate::sim::tick`].

use glam::Vec2;

use crate::tuning::TiltTuning;

/// Input commands for a single frame (deterministic)
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Device tilt reading (accelerometer x, y), if the host has one
    pub tilt: Option<Vec2>,
    /// Tap/click positions in playfield pixels
    pub taps: Vec<Vec2>,
}

impl FrameInput {
    pub fn with_tap(mut self, at: Vec2) -> Self {
        self.taps.push(at);
        self
    }

    pub fn with_tilt(mut self, tilt: Vec2) -> Self {
        self.tilt = Some(tilt);
        self
    }
}

/// Map a tilt reading to world gravity.
///
/// Screen y grows downward while the sensor's y grows upward, hence the sign
/// flip. A missing or all-zero reading means "no sensor" and yields the
/// fallback gravity.
pub fn gravity_from_tilt(tilt: Option<Vec2>, tuning: &TiltTuning) -> Vec2 {
    match tilt {
        Some(t) if t != Vec2::ZERO => Vec2::new(t.x * tuning.scale, -t.y * tuning.scale),
        _ => tuning.fallback,
    }
}
