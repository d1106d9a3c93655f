//! The per-frame animator.

use crate::camera::OrthographicCamera;
use crate::lerp::{lerp, lerp_vec3, FrameTiming};
use crate::state::AnimationState;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// Targets and easing factors for every animated value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorTuning {
    /// Hand rotation while released.
    pub rest_rotation: f32,
    /// Hand rotation while pressed.
    pub pressed_rotation: f32,
    pub rotation_factor: f32,
    /// Offset from the unprojected pointer to the hand.
    pub hand_offset: Vec3,
    pub position_factor: f32,
    /// Zoom while released.
    pub rest_zoom: f32,
    /// Zoom while pressed.
    pub pressed_zoom: f32,
    /// Zoom factor while pressed; smaller than the release factor so
    /// zooming in eases slower than zooming out.
    pub zoom_factor_pressed: f32,
    pub zoom_factor_released: f32,
    /// Camera travel per unit of normalized pointer, on x and y.
    pub camera_sway: Vec2,
    /// Camera distance along z.
    pub camera_distance: f32,
    pub camera_factor: f32,
    /// Point the camera keeps aimed at.
    pub look_target: Vec3,
}

impl Default for AnimatorTuning {
    fn default() -> Self {
        Self {
            rest_rotation: -0.5,
            pressed_rotation: -0.7,
            rotation_factor: 0.2,
            hand_offset: Vec3::new(-100.0, 0.0, 0.0),
            position_factor: 0.4,
            rest_zoom: 0.7,
            pressed_zoom: 0.9,
            zoom_factor_pressed: 0.025,
            zoom_factor_released: 0.15,
            camera_sway: Vec2::new(400.0, 200.0),
            camera_distance: 1000.0,
            camera_factor: 0.1,
            look_target: Vec3::ZERO,
        }
    }
}

/// Input sampled for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Pointer in normalized device coordinates.
    pub pointer: Vec2,
    /// Whether the screen is pressed.
    pub pressed: bool,
    /// Current scroll velocity.
    pub scroll_velocity: f32,
}

/// Eases the hand and camera toward pointer-driven targets.
#[derive(Clone, Debug, Default)]
pub struct Animator {
    tuning: AnimatorTuning,
    timing: FrameTiming,
}

impl Animator {
    pub fn new(tuning: AnimatorTuning, timing: FrameTiming) -> Self {
        Self { tuning, timing }
    }

    pub fn tuning(&self) -> &AnimatorTuning {
        &self.tuning
    }

    pub fn timing(&self) -> FrameTiming {
        self.timing
    }

    /// Advance one frame, mutating the state and the camera in place.
    pub fn tick(
        &self,
        state: &mut AnimationState,
        camera: &mut OrthographicCamera,
        input: &FrameInput,
        dt: Duration,
    ) {
        let t = &self.tuning;
        let factor = |f: f32| self.timing.factor(f, dt);

        state.pressed = input.pressed;
        state.scroll_velocity = input.scroll_velocity;

        // The pointer is unprojected through last frame's camera.
        let pointer = camera.unproject(input.pointer.extend(0.0));

        let rotation_target = if state.pressed { t.pressed_rotation } else { t.rest_rotation };
        state.hand_rotation = lerp(state.hand_rotation, rotation_target, factor(t.rotation_factor));

        let hand_target = Vec3::new(
            pointer.x + t.hand_offset.x,
            state.scroll_velocity + pointer.y + t.hand_offset.y,
            pointer.z + t.hand_offset.z,
        );
        state.hand_position = lerp_vec3(state.hand_position, hand_target, factor(t.position_factor));

        let (zoom_target, zoom_factor) = if state.pressed {
            (t.pressed_zoom, t.zoom_factor_pressed)
        } else {
            (t.rest_zoom, t.zoom_factor_released)
        };
        state.zoom = lerp(state.zoom, zoom_target, factor(zoom_factor));

        let camera_target = Vec3::new(
            -input.pointer.x * t.camera_sway.x,
            -input.pointer.y * t.camera_sway.y,
            t.camera_distance,
        );
        camera.position = lerp_vec3(camera.position, camera_target, factor(t.camera_factor));
        camera.look_at(t.look_target);

        camera.zoom = state.zoom;
        camera.update_projection_matrix();

        trace!(
            "frame: rotation {:.4} hand {:?} zoom {:.4} camera {:?}",
            state.hand_rotation,
            state.hand_position,
            state.zoom,
            camera.position
        );
    }

    /// Pure variant of [`Animator::tick`].
    pub fn step(
        &self,
        state: &AnimationState,
        camera: &OrthographicCamera,
        input: &FrameInput,
        dt: Duration,
    ) -> (AnimationState, OrthographicCamera) {
        let mut state = *state;
        let mut camera = camera.clone();
        self.tick(&mut state, &mut camera, input, dt);
        (state, camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Size;

    const FRAME: Duration = Duration::from_millis(16);

    fn camera() -> OrthographicCamera {
        OrthographicCamera::new(Size::new(800.0, 600.0), -100_000.0, 100_000.0)
            .with_position(Vec3::new(0.0, 0.0, 1000.0))
    }

    fn run(animator: &Animator, input: FrameInput, frames: usize) -> (AnimationState, OrthographicCamera) {
        let mut state = AnimationState::new();
        let mut camera = camera();
        for _ in 0..frames {
            animator.tick(&mut state, &mut camera, &input, FRAME);
        }
        (state, camera)
    }

    #[test]
    fn test_pressed_converges_to_pressed_targets() {
        let animator = Animator::default();
        let input = FrameInput {
            pressed: true,
            ..FrameInput::default()
        };
        let (state, camera) = run(&animator, input, 600);

        assert!((state.hand_rotation - -0.7).abs() < 0.001);
        assert!((state.zoom - 0.9).abs() < 0.001);
        assert_eq!(camera.zoom, state.zoom);
    }

    #[test]
    fn test_released_converges_to_rest_targets() {
        let animator = Animator::default();
        let (state, _) = run(&animator, FrameInput::default(), 600);

        assert!((state.hand_rotation - -0.5).abs() < 0.001);
        assert!((state.zoom - 0.7).abs() < 0.001);
    }

    #[test]
    fn test_single_frame_is_fractional() {
        let animator = Animator::default();
        let input = FrameInput {
            pointer: Vec2::new(0.5, -0.5),
            pressed: true,
            scroll_velocity: -100.0,
        };
        let (state, camera) = animator.step(&AnimationState::new(), &camera(), &input, FRAME);

        assert!((state.hand_rotation - -0.14).abs() < 1e-5);
        assert!((state.zoom - (1.0 + (0.9 - 1.0) * 0.025)).abs() < 1e-5);
        assert!((camera.position.x - -20.0).abs() < 1e-3);
        assert!((camera.position.y - 10.0).abs() < 1e-3);
        assert!((camera.position.z - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_hand_follows_unprojected_pointer() {
        let animator = Animator::default();
        let input = FrameInput {
            pointer: Vec2::new(1.0, 0.0),
            pressed: false,
            scroll_velocity: 0.0,
        };
        let (state, _) = animator.step(&AnimationState::new(), &camera(), &input, FRAME);

        // Unprojected x is 400 at zoom 1; the hand sits 100 units left of it.
        assert!((state.hand_position.x - 0.4 * 300.0).abs() < 1e-2);
        assert!(state.hand_position.y.abs() < 1e-2);
    }

    #[test]
    fn test_scroll_velocity_lifts_hand() {
        let animator = Animator::default();
        let input = FrameInput {
            scroll_velocity: -100.0,
            ..FrameInput::default()
        };
        let (state, _) = animator.step(&AnimationState::new(), &camera(), &input, FRAME);
        assert!((state.hand_position.y - -40.0).abs() < 1e-2);
        assert_eq!(state.scroll_velocity, -100.0);
    }

    #[test]
    fn test_camera_faces_origin_after_every_frame() {
        let animator = Animator::default();
        let mut state = AnimationState::new();
        let mut camera = camera();

        for (x, y) in [(1.0, 1.0), (-1.0, 0.3), (0.2, -0.9), (0.0, 0.0)] {
            let input = FrameInput {
                pointer: Vec2::new(x, y),
                ..FrameInput::default()
            };
            animator.tick(&mut state, &mut camera, &input, FRAME);
            let expected = (Vec3::ZERO - camera.position).normalize();
            assert!(camera.forward().abs_diff_eq(expected, 1e-4));
        }
    }
}
