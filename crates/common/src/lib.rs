//! Common utilities and types shared by the scene crates.

pub mod color;
pub mod geometry;
pub mod error;

pub use color::Color;
pub use geometry::{Aabb, Point, Rect, Size, Transform3D};
pub use error::{SceneError, SceneResult};

pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};
