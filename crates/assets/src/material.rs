//! Materials and render state flags.

use bitflags::bitflags;
use common::Color;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use wgpu::{CompareFunction, StencilFaceState, StencilOperation};

/// Material identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub String);

impl MaterialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

bitflags! {
    /// Fixed-function render state of a material.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        const TRANSPARENT = 1 << 0;
        const COLOR_WRITE = 1 << 1;
        const DEPTH_WRITE = 1 << 2;
        const DEPTH_TEST = 1 << 3;
        const CAST_SHADOW = 1 << 4;
        const RECEIVE_SHADOW = 1 << 5;
    }
}

impl Default for RenderFlags {
    fn default() -> Self {
        RenderFlags::COLOR_WRITE | RenderFlags::DEPTH_WRITE | RenderFlags::DEPTH_TEST
    }
}

/// Stencil test configuration carried by a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StencilFlags {
    /// Whether the stencil test is enabled.
    pub write: bool,
    /// Reference value.
    pub reference: u32,
    /// Comparison against the stored value.
    pub compare: CompareFunction,
    /// Operation when the stencil test fails.
    pub fail_op: StencilOperation,
    /// Operation when the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// Operation when both tests pass.
    pub pass_op: StencilOperation,
}

impl Default for StencilFlags {
    fn default() -> Self {
        Self::disabled()
    }
}

impl StencilFlags {
    /// Stencil test off.
    pub const fn disabled() -> Self {
        Self {
            write: false,
            reference: 0,
            compare: CompareFunction::Always,
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
        }
    }

    /// Per-face state for a GPU pipeline.
    pub fn face_state(&self) -> StencilFaceState {
        if !self.write {
            return StencilFaceState::IGNORE;
        }
        StencilFaceState {
            compare: self.compare,
            fail_op: self.fail_op,
            depth_fail_op: self.depth_fail_op,
            pass_op: self.pass_op,
        }
    }
}

/// Shading model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    #[default]
    Standard,
    Basic,
    Physical,
}

/// A material value.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Material ID.
    pub id: MaterialId,
    /// Shading model.
    pub kind: MaterialKind,
    /// Base color.
    pub color: Color,
    /// Opacity (0.0 - 1.0).
    pub opacity: f32,
    /// Render state.
    pub flags: RenderFlags,
    /// Stencil test.
    pub stencil: StencilFlags,
}

impl Material {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: MaterialId::new(id),
            kind: MaterialKind::Standard,
            color: Color::WHITE,
            opacity: 1.0,
            flags: RenderFlags::default(),
            stencil: StencilFlags::disabled(),
        }
    }

    /// Transparent material with the given opacity.
    pub fn transparent(id: impl Into<String>, opacity: f32) -> Self {
        let mut material = Self::new(id);
        material.opacity = opacity.clamp(0.0, 1.0);
        material.flags |= RenderFlags::TRANSPARENT;
        material
    }

    /// Copy of this material with the stencil fields replaced.
    pub fn with_stencil(&self, stencil: StencilFlags) -> Material {
        Material {
            stencil,
            ..self.clone()
        }
    }

    pub fn with_flags(mut self, flags: RenderFlags) -> Material {
        self.flags = flags;
        self
    }

    /// Check if material needs blending.
    pub fn is_transparent(&self) -> bool {
        self.flags.contains(RenderFlags::TRANSPARENT) || self.opacity < 1.0
    }

    /// Base color with opacity folded into alpha, as shader input.
    pub fn base_color(&self) -> [f32; 4] {
        self.color.with_opacity(self.opacity).to_f32_array()
    }
}

/// Serialized material.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialExport {
    pub id: String,
    #[serde(default)]
    pub kind: MaterialKind,
    #[serde(default = "default_color")]
    pub color: Color,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub transparent: bool,
}

fn default_color() -> Color {
    Color::WHITE
}

fn default_opacity() -> f32 {
    1.0
}

impl MaterialExport {
    pub fn into_material(self) -> Material {
        let mut material = Material::new(self.id);
        material.kind = self.kind;
        material.color = self.color;
        material.opacity = self.opacity.clamp(0.0, 1.0);
        if self.transparent {
            material.flags |= RenderFlags::TRANSPARENT;
        }
        material
    }
}

/// Materials keyed by ID. Entries are replaced, never shared.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialLibrary {
    materials: IndexMap<MaterialId, Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a material.
    pub fn insert(&mut self, material: Material) -> Option<Material> {
        self.materials.insert(material.id.clone(), material)
    }

    pub fn get(&self, id: &MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn contains(&self, id: &MaterialId) -> bool {
        self.materials.contains_key(id)
    }

    /// Replace an entry with a stencil-tested copy. Returns whether the
    /// stored value changed.
    pub fn apply_stencil(&mut self, id: &MaterialId, stencil: StencilFlags) -> Option<bool> {
        let current = self.materials.get(id)?;
        if current.stencil == stencil {
            return Some(false);
        }
        let updated = current.with_stencil(stencil);
        self.materials.insert(id.clone(), updated);
        Some(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
