//! Animation state carried between frames.

use glam::Vec3;

/// Mutable per-session animation state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    /// Hand rotation about X, in radians.
    pub hand_rotation: f32,
    /// Hand group position.
    pub hand_position: Vec3,
    /// Camera zoom.
    pub zoom: f32,
    /// Whether the screen is pressed.
    pub pressed: bool,
    /// Scroll velocity sampled this frame.
    pub scroll_velocity: f32,
}

impl AnimationState {
    /// State at mount: hand at rest at the origin, camera unzoomed.
    pub fn new() -> Self {
        Self {
            hand_rotation: 0.0,
            hand_position: Vec3::ZERO,
            zoom: 1.0,
            pressed: false,
            scroll_velocity: 0.0,
        }
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new()
    }
}
