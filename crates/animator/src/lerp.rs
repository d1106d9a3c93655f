//! Linear interpolation and frame-rate handling.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest frame, in reference frames, that delta scaling accounts for.
/// Longer stalls (a backgrounded tab) are treated as this many frames.
const MAX_CATCH_UP_FRAMES: f32 = 10.0;

/// Linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Component-wise linear interpolation.
#[inline]
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Re-map `x` from range `[a1, a2]` to `[b1, b2]`.
#[inline]
pub fn map_linear(x: f32, a1: f32, a2: f32, b1: f32, b2: f32) -> f32 {
    b1 + (x - a1) * (b2 - b1) / (a2 - a1)
}

/// How per-frame lerp factors relate to elapsed time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FrameTiming {
    /// Apply each factor once per frame, whatever the frame duration.
    #[default]
    Fixed,
    /// Scale factors so a second of animation covers the same distance
    /// at any frame rate. `reference_hz` is the rate the factors were
    /// tuned at.
    DeltaScaled { reference_hz: f32 },
}

impl FrameTiming {
    pub const fn delta_scaled() -> Self {
        FrameTiming::DeltaScaled { reference_hz: 60.0 }
    }

    /// Whether the reference rate is usable. Delta-scaled timing needs a
    /// positive, finite rate.
    pub fn is_valid(&self) -> bool {
        match *self {
            FrameTiming::Fixed => true,
            FrameTiming::DeltaScaled { reference_hz } => reference_hz.is_finite() && reference_hz > 0.0,
        }
    }

    /// Effective factor for a frame lasting `dt`.
    pub fn factor(&self, factor: f32, dt: Duration) -> f32 {
        match *self {
            FrameTiming::Fixed => factor,
            FrameTiming::DeltaScaled { reference_hz } => {
                let frames = (dt.as_secs_f32() * reference_hz).clamp(0.0, MAX_CATCH_UP_FRAMES);
                1.0 - (1.0 - factor).powf(frames)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert!((lerp(0.0, 100.0, 0.5) - 50.0).abs() < 0.001);
        assert!((lerp(0.0, 100.0, 0.0) - 0.0).abs() < 0.001);
        assert!((lerp(0.0, 100.0, 1.0) - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_timing_validity() {
        assert!(FrameTiming::Fixed.is_valid());
        assert!(FrameTiming::delta_scaled().is_valid());
        for reference_hz in [0.0, -60.0, f32::NAN, f32::INFINITY] {
            assert!(!FrameTiming::DeltaScaled { reference_hz }.is_valid());
        }
    }

    #[test]
    fn test_repeated_lerp_converges() {
        let mut state = 0.0;
        for n in 1..=20 {
            state = lerp(state, 1.0, 0.2);
            let bound = 0.8f32.powi(n);
            assert!((1.0 - state) <= bound + 1e-6);
        }
        assert!(state > 0.98);
    }

    #[test]
    fn test_map_linear() {
        assert!((map_linear(0.05, -0.1, 0.1, -1.0, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_timing_ignores_dt() {
        let timing = FrameTiming::Fixed;
        assert_eq!(timing.factor(0.2, Duration::from_millis(5)), 0.2);
        assert_eq!(timing.factor(0.2, Duration::from_secs(1)), 0.2);
    }

    #[test]
    fn test_delta_scaled_matches_reference_rate() {
        let timing = FrameTiming::delta_scaled();
        let one_frame = timing.factor(0.2, Duration::from_secs_f32(1.0 / 60.0));
        assert!((one_frame - 0.2).abs() < 1e-4);

        // Two 120 Hz frames cover one 60 Hz frame.
        let half = timing.factor(0.2, Duration::from_secs_f32(1.0 / 120.0));
        let mut v = 0.0;
        v = lerp(v, 1.0, half);
        v = lerp(v, 1.0, half);
        assert!((v - 0.2).abs() < 1e-4);

        let stalled = timing.factor(0.2, Duration::from_secs(30));
        assert!(stalled < 1.0);
    }
}
