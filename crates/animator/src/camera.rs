//! Orthographic camera.
//!
//! The frustum spans the viewport in pixels (one world unit per pixel at
//! zoom 1), with clip-space depth in [-1, 1].

use common::Size;
use glam::{Mat3, Mat4, Quat, Vec3};
use tracing::trace;

/// Orthographic scene camera.
#[derive(Clone, Debug, PartialEq)]
pub struct OrthographicCamera {
    /// Frustum left edge.
    pub left: f32,
    /// Frustum right edge.
    pub right: f32,
    /// Frustum top edge.
    pub top: f32,
    /// Frustum bottom edge.
    pub bottom: f32,
    /// Near plane. May be negative for orthographic projection.
    pub near: f32,
    /// Far plane.
    pub far: f32,
    /// Zoom factor; larger values magnify.
    pub zoom: f32,
    /// World position.
    pub position: Vec3,
    /// World orientation.
    pub orientation: Quat,
    /// Up direction used when aiming.
    pub up: Vec3,
    /// Cached projection matrix.
    projection: Mat4,
}

impl OrthographicCamera {
    /// Camera whose frustum matches a viewport of `size` pixels.
    pub fn new(size: Size, near: f32, far: f32) -> Self {
        let mut camera = Self {
            left: -size.width / 2.0,
            right: size.width / 2.0,
            top: size.height / 2.0,
            bottom: -size.height / 2.0,
            near,
            far,
            zoom: 1.0,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            up: Vec3::Y,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Match a new viewport size.
    pub fn resize(&mut self, size: Size) {
        self.left = -size.width / 2.0;
        self.right = size.width / 2.0;
        self.top = size.height / 2.0;
        self.bottom = -size.height / 2.0;
        self.update_projection_matrix();
    }

    /// Recompute the projection from frustum and zoom.
    pub fn update_projection_matrix(&mut self) {
        let dx = (self.right - self.left) / (2.0 * self.zoom);
        let dy = (self.top - self.bottom) / (2.0 * self.zoom);
        let cx = (self.right + self.left) / 2.0;
        let cy = (self.top + self.bottom) / 2.0;

        self.projection =
            Mat4::orthographic_rh_gl(cx - dx, cx + dx, cy - dy, cy + dy, self.near, self.far);
        trace!("Projection updated at zoom {}", self.zoom);
    }

    /// Current projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Rotate so the camera's -Z axis points at `target`.
    pub fn look_at(&mut self, target: Vec3) {
        let mut z = self.position - target;
        if z.length_squared() == 0.0 {
            z.z = 1.0;
        }
        z = z.normalize();

        let mut x = self.up.cross(z);
        if x.length_squared() == 0.0 {
            // Up and view direction are parallel; nudge the view direction.
            if self.up.z.abs() == 1.0 {
                z.x += 0.0001;
            } else {
                z.z += 0.0001;
            }
            z = z.normalize();
            x = self.up.cross(z);
        }
        x = x.normalize();
        let y = z.cross(x);

        self.orientation = Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize();
    }

    /// Camera-to-world transform.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// World-to-camera transform.
    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    /// World-to-clip transform.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    /// Direction the camera faces.
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// Map a normalized device coordinate into world space.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        let inverse = self.world_matrix() * self.projection.inverse();
        inverse.project_point3(ndc)
    }

    /// Map a world point into normalized device coordinates.
    pub fn project(&self, world: Vec3) -> Vec3 {
        self.view_projection().project_point3(world)
    }
}
