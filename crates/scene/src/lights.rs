//! Scene lighting.

use common::Color;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Orthographic frustum of a shadow-casting light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl ShadowCamera {
    /// Symmetric frustum of half-extent `extent`.
    pub fn symmetric(extent: f32, near: f32, far: f32) -> Self {
        Self {
            left: -extent,
            right: extent,
            top: extent,
            bottom: -extent,
            near,
            far,
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }
}

/// Shadow settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    /// Shadow map size in texels.
    pub map_size: (u32, u32),
    /// Depth bias.
    pub bias: f32,
    pub camera: ShadowCamera,
}

/// Parallel light aimed at `target`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub intensity: f32,
    pub color: Color,
    pub position: Vec3,
    pub target: Vec3,
    /// Present when the light casts shadows.
    pub shadow: Option<Shadow>,
}

impl DirectionalLight {
    /// Direction the light travels.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// World-to-clip transform of the shadow camera.
    pub fn shadow_view_projection(&self) -> Option<Mat4> {
        let shadow = self.shadow.as_ref()?;
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        Some(shadow.camera.projection() * view)
    }
}

/// Sky/ground gradient light.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HemisphereLight {
    pub intensity: f32,
    pub sky_color: Color,
    pub ground_color: Color,
    pub position: Vec3,
}

/// Any light in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Light {
    Directional(DirectionalLight),
    Hemisphere(HemisphereLight),
}

impl Light {
    pub fn intensity(&self) -> f32 {
        match self {
            Light::Directional(light) => light.intensity,
            Light::Hemisphere(light) => light.intensity,
        }
    }

    pub fn casts_shadow(&self) -> bool {
        matches!(self, Light::Directional(DirectionalLight { shadow: Some(_), .. }))
    }
}

/// Key light plus ambient fill.
pub fn default_lights() -> Vec<Light> {
    vec![
        Light::Directional(DirectionalLight {
            intensity: 0.4,
            color: Color::WHITE,
            position: Vec3::new(-10.0, 50.0, 300.0),
            target: Vec3::ZERO,
            shadow: Some(Shadow {
                map_size: (512, 512),
                bias: -0.002,
                camera: ShadowCamera::symmetric(2000.0, -10_000.0, 10_000.0),
            }),
        }),
        Light::Hemisphere(HemisphereLight {
            intensity: 0.5,
            sky_color: Color::rgb(0xea, 0xea, 0xea),
            ground_color: Color::WHITE,
            position: Vec3::new(0.0, 1.0, 0.0),
        }),
    ]
}
