//! Idle floating motion.

use crate::lerp::map_linear;
use common::Transform3D;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Floating motion parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatParams {
    /// Oscillation speed multiplier.
    pub speed: f32,
    /// Rotation amplitude multiplier.
    pub rotation_intensity: f32,
    /// Vertical travel multiplier.
    pub float_intensity: f32,
    /// Output range of the vertical oscillation before scaling.
    pub floating_range: (f32, f32),
    /// Phase offset in seconds.
    pub offset: f32,
}

impl Default for FloatParams {
    fn default() -> Self {
        Self {
            speed: 1.0,
            rotation_intensity: 0.5,
            float_intensity: 100.0,
            floating_range: (-0.1, 0.1),
            offset: 0.0,
        }
    }
}

/// Slow bobbing and swaying of a group, driven by elapsed time only.
#[derive(Clone, Copy, Debug, Default)]
pub struct FloatMotion {
    params: FloatParams,
}

impl FloatMotion {
    pub fn new(params: FloatParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FloatParams {
        &self.params
    }

    /// Transform of the floating group after `elapsed`.
    pub fn sample(&self, elapsed: Duration) -> Transform3D {
        let p = &self.params;
        let t = p.offset + elapsed.as_secs_f32();
        let phase = t / 4.0 * p.speed;
        let (sin, cos) = phase.sin_cos();

        let rotation = Vec3::new(
            cos / 8.0 * p.rotation_intensity,
            sin / 8.0 * p.rotation_intensity,
            sin / 20.0 * p.rotation_intensity,
        );

        let y = map_linear(sin / 10.0, -0.1, 0.1, p.floating_range.0, p.floating_range.1);

        Transform3D::from_position(Vec3::new(0.0, y * p.float_intensity, 0.0)).with_rotation(rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_at_rest_phase() {
        let motion = FloatMotion::default();
        let t = motion.sample(Duration::ZERO);
        assert!(t.position.y.abs() < 1e-5);
        assert!((t.rotation.x - 0.5 / 8.0).abs() < 1e-6);
        assert!(t.rotation.y.abs() < 1e-6);
    }

    #[test]
    fn test_float_peak_height() {
        let motion = FloatMotion::default();
        // sin(t / 4) peaks at t = 2π.
        let t = motion.sample(Duration::from_secs_f32(2.0 * std::f32::consts::PI));
        assert!((t.position.y - 10.0).abs() < 1e-3);
        assert!((t.rotation.z - 0.5 / 20.0).abs() < 1e-5);
    }

    #[test]
    fn test_float_stays_in_range() {
        let motion = FloatMotion::default();
        for step in 0..200 {
            let t = motion.sample(Duration::from_millis(step * 137));
            assert!(t.position.y.abs() <= 10.0 + 1e-3);
        }
    }
}
