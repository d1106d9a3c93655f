//! Stencil masking.
//!
//! A mask pass draws the mask geometry with color and depth writes off,
//! stamping its id into the stencil buffer. Masked materials then test
//! against that id and only draw where the test passes.

use assets::{Material, MaterialLibrary, NodeGraph, RenderFlags, StencilFlags};
use common::{SceneError, SceneResult};
use tracing::{debug, trace};
use wgpu::{
    ColorWrites, CompareFunction, DepthBiasState, DepthStencilState, StencilOperation,
    StencilState, TextureFormat,
};

/// Depth/stencil format used by masked pipelines.
pub const DEPTH_STENCIL_FORMAT: TextureFormat = TextureFormat::Depth24PlusStencil8;

/// Shared stencil test for everything clipped by one mask region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StencilDescriptor {
    mask_id: u32,
    inverse: bool,
}

impl StencilDescriptor {
    /// Test against mask `mask_id`. With `inverse` the material draws
    /// everywhere except inside the mask.
    pub const fn new(mask_id: u32, inverse: bool) -> Self {
        Self { mask_id, inverse }
    }

    pub fn mask_id(&self) -> u32 {
        self.mask_id
    }

    pub fn inverse(&self) -> bool {
        self.inverse
    }

    /// Flag set copied onto each masked material.
    pub fn flags(&self) -> StencilFlags {
        StencilFlags {
            write: true,
            reference: self.mask_id,
            compare: if self.inverse {
                CompareFunction::NotEqual
            } else {
                CompareFunction::Equal
            },
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
        }
    }

    /// Apply to one material value.
    pub fn apply(&self, material: &Material) -> Material {
        material.with_stencil(self.flags())
    }
}

/// The pass that writes a mask region into the stencil buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskPass {
    /// Mask ID written into the stencil buffer.
    pub mask_id: u32,
    /// Geometry that defines the region.
    pub geometry: String,
    /// Whether the mask geometry casts shadows.
    pub cast_shadow: bool,
    /// Whether the mask geometry receives shadows.
    pub receive_shadow: bool,
}

impl MaskPass {
    pub fn new(mask_id: u32, geometry: impl Into<String>) -> Self {
        Self {
            mask_id,
            geometry: geometry.into(),
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    /// Stencil state stamping the mask id wherever the geometry covers.
    pub fn stencil_flags(&self) -> StencilFlags {
        StencilFlags {
            write: true,
            reference: self.mask_id,
            compare: CompareFunction::Always,
            fail_op: StencilOperation::Replace,
            depth_fail_op: StencilOperation::Replace,
            pass_op: StencilOperation::Replace,
        }
    }

    /// Material for the mask geometry. It never touches color or depth.
    pub fn material(&self) -> Material {
        let mut flags = RenderFlags::DEPTH_TEST;
        if self.cast_shadow {
            flags |= RenderFlags::CAST_SHADOW;
        }
        if self.receive_shadow {
            flags |= RenderFlags::RECEIVE_SHADOW;
        }
        Material::new(format!("mask-{}", self.mask_id))
            .with_flags(flags)
            .with_stencil(self.stencil_flags())
    }

    pub fn color_writes(&self) -> ColorWrites {
        ColorWrites::empty()
    }

    pub fn depth_stencil_state(&self) -> DepthStencilState {
        depth_stencil_state(&self.material())
    }
}

/// GPU depth/stencil state for a material.
pub fn depth_stencil_state(material: &Material) -> DepthStencilState {
    let face = material.stencil.face_state();
    let mask = if material.stencil.write { 0xff } else { 0 };

    DepthStencilState {
        format: DEPTH_STENCIL_FORMAT,
        depth_write_enabled: material.flags.contains(RenderFlags::DEPTH_WRITE),
        depth_compare: if material.flags.contains(RenderFlags::DEPTH_TEST) {
            CompareFunction::LessEqual
        } else {
            CompareFunction::Always
        },
        stencil: StencilState {
            front: face,
            back: face,
            read_mask: mask,
            write_mask: mask,
        },
        bias: DepthBiasState::default(),
    }
}

/// Apply `stencil` to the material of every child of every node that
/// has children, except `exclude` and its direct children.
///
/// Runs once after the graph loads and before the first frame. Applying
/// twice leaves the library unchanged. Returns how many materials changed.
pub fn propagate_stencil(
    graph: &NodeGraph,
    materials: &mut MaterialLibrary,
    stencil: &StencilDescriptor,
    exclude: &str,
) -> SceneResult<usize> {
    graph.get(exclude)?;

    let flags = stencil.flags();
    let mut changed = 0;

    for node in graph.iter() {
        if !node.has_children() || node.name == exclude {
            continue;
        }

        for child in graph.children(node.id) {
            let Some(material_id) = &child.material else {
                trace!("Skipping {}: no material", child.name);
                continue;
            };

            match materials.apply_stencil(material_id, flags) {
                Some(true) => changed += 1,
                Some(false) => {}
                None => {
                    return Err(SceneError::missing_material(format!(
                        "{} (referenced by {})",
                        material_id, child.name
                    )))
                }
            }
        }
    }

    debug!("Stencil mask {} applied to {} materials", stencil.mask_id(), changed);
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assets::{MaterialId, SceneExport};

    fn graph() -> NodeGraph {
        let export: SceneExport = serde_json::from_str(
            r#"{
                "materials": [
                    { "id": "skin" }, { "id": "body" }, { "id": "glass" }
                ],
                "nodes": [
                    { "name": "hand-r", "children": ["palm"] },
                    { "name": "palm", "material": "skin" },
                    { "name": "phone", "children": ["frame", "lens", "pivot"] },
                    { "name": "frame", "material": "body" },
                    { "name": "lens", "material": "glass" },
                    { "name": "pivot" },
                    { "name": "screen", "material": "glass" }
                ]
            }"#,
        )
        .unwrap();
        NodeGraph::from_export(export).unwrap()
    }

    #[test]
    fn test_inverse_descriptor_flags() {
        let flags = StencilDescriptor::new(1, true).flags();
        assert!(flags.write);
        assert_eq!(flags.reference, 1);
        assert_eq!(flags.compare, CompareFunction::NotEqual);

        let flags = StencilDescriptor::new(1, false).flags();
        assert_eq!(flags.compare, CompareFunction::Equal);
    }

    #[test]
    fn test_apply_twice_equals_once() {
        let stencil = StencilDescriptor::new(1, true);
        let material = Material::new("body");
        let once = stencil.apply(&material);
        let twice = stencil.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_propagation_skips_excluded_node() {
        let graph = graph();
        let mut materials = graph.materials().clone();
        let stencil = StencilDescriptor::new(1, true);

        let changed = propagate_stencil(&graph, &mut materials, &stencil, "hand-r").unwrap();
        assert_eq!(changed, 2);

        let skin = materials.get(&MaterialId::new("skin")).unwrap();
        assert!(!skin.stencil.write);
        let body = materials.get(&MaterialId::new("body")).unwrap();
        assert_eq!(body.stencil, stencil.flags());

        // The graph's own library is untouched.
        assert!(!graph.materials().get(&MaterialId::new("body")).unwrap().stencil.write);
    }

    #[test]
    fn test_propagation_is_idempotent() {
        let graph = graph();
        let mut materials = graph.materials().clone();
        let stencil = StencilDescriptor::new(1, true);

        propagate_stencil(&graph, &mut materials, &stencil, "hand-r").unwrap();
        let after_once = materials.clone();
        let changed = propagate_stencil(&graph, &mut materials, &stencil, "hand-r").unwrap();

        assert_eq!(changed, 0);
        assert_eq!(materials, after_once);
    }

    #[test]
    fn test_propagation_requires_excluded_node() {
        let graph = graph();
        let mut materials = graph.materials().clone();
        let err = propagate_stencil(&graph, &mut materials, &StencilDescriptor::new(1, true), "hand-x")
            .unwrap_err();
        assert!(err.is_missing_node());
        assert_eq!(materials, *graph.materials());
    }

    #[test]
    fn test_mask_pass_disables_color_and_depth_writes() {
        let pass = MaskPass::new(1, "screen").with_shadows(true, true);
        let material = pass.material();
        assert!(!material.flags.contains(RenderFlags::COLOR_WRITE));
        assert!(!material.flags.contains(RenderFlags::DEPTH_WRITE));
        assert!(material.flags.contains(RenderFlags::CAST_SHADOW));
        assert_eq!(pass.color_writes(), ColorWrites::empty());

        let state = pass.depth_stencil_state();
        assert!(!state.depth_write_enabled);
        assert_eq!(state.stencil.front.compare, CompareFunction::Always);
        assert_eq!(state.stencil.front.pass_op, StencilOperation::Replace);
        assert_eq!(state.stencil.write_mask, 0xff);
    }
}
