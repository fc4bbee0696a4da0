// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback speed factor.

use std::fmt;
use std::time::Duration;

/// Playback speed multiplier, always within `[MIN, MAX]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct PlaybackSpeed(f64);

impl PlaybackSpeed {
    /// Slowest allowed speed
    pub const MIN: f64 = 0.5;
    /// Fastest allowed speed
    pub const MAX: f64 = 2.0;
    /// Normal speed
    pub const NORMAL: PlaybackSpeed = PlaybackSpeed(1.0);

    /// Create a speed, clamping out-of-range input.
    ///
    /// Non-finite input falls back to normal speed.
    pub fn new(factor: f64) -> Self {
        if factor.is_nan() {
            return Self::NORMAL;
        }
        Self(factor.clamp(Self::MIN, Self::MAX))
    }

    /// Speed factor
    pub fn factor(self) -> f64 {
        self.0
    }

    /// Map a recorded offset onto the playback timeline
    pub fn scale(self, recorded: Duration) -> Duration {
        Duration::from_nanos((recorded.as_nanos() as f64 / self.0).round() as u64)
    }

    /// Adjust by a delta, clamping the result
    pub fn nudged(self, delta: f64) -> Self {
        // Round to avoid 0.1-step drift like 1.2000000000000002
        Self::new(((self.0 + delta) * 100.0).round() / 100.0)
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<f64> for PlaybackSpeed {
    fn from(factor: f64) -> Self {
        Self::new(factor)
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}x", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamping() {
        assert_eq!(PlaybackSpeed::new(3.0).factor(), 2.0);
        assert_eq!(PlaybackSpeed::new(0.1).factor(), 0.5);
        assert_eq!(PlaybackSpeed::new(1.25).factor(), 1.25);
        assert_eq!(PlaybackSpeed::new(f64::INFINITY).factor(), 2.0);
        assert_eq!(PlaybackSpeed::new(f64::NEG_INFINITY).factor(), 0.5);
        assert_eq!(PlaybackSpeed::new(f64::NAN).factor(), 1.0);
    }

    #[test]
    fn test_scale() {
        let offset = Duration::from_millis(600);
        assert_eq!(PlaybackSpeed::new(2.0).scale(offset), Duration::from_millis(300));
        assert_eq!(PlaybackSpeed::new(0.5).scale(offset), Duration::from_millis(1200));
        assert_eq!(PlaybackSpeed::NORMAL.scale(offset), offset);
    }

    #[test]
    fn test_nudged() {
        let speed = PlaybackSpeed::NORMAL.nudged(0.1).nudged(0.1);
        assert_eq!(speed.factor(), 1.2);
        assert_eq!(PlaybackSpeed::new(1.95).nudged(0.1).factor(), 2.0);
        assert_eq!(PlaybackSpeed::new(0.55).nudged(-0.1).factor(), 0.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(PlaybackSpeed::new(1.5).to_string(), "1.50x");
    }
}
