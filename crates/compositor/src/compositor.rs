//! Main compositor implementation.

use crate::overlay::{HtmlOverlay, OverlayId, OverlayPlacement};
use crate::stencil::MaskPass;
use animator::OrthographicCamera;
use common::{Aabb, SceneError, SceneResult, Size};
use glam::Mat4;
use ordered_float::OrderedFloat;
use slotmap::SlotMap;
use std::cmp::Reverse;
use tracing::{debug, trace};

/// The compositor places DOM overlays over the rendered scene and owns
/// the stencil mask passes they sit in.
pub struct Compositor {
    /// Registered overlays.
    overlays: SlotMap<OverlayId, OverlayEntry>,
    /// Mask passes, drawn before any masked material.
    masks: Vec<MaskPass>,
    /// Viewport size in CSS pixels.
    viewport: Size,
    /// Compositor settings.
    settings: CompositorSettings,
    /// Frame statistics.
    stats: CompositorStats,
}

struct OverlayEntry {
    overlay: HtmlOverlay,
    /// World matrix of the anchor, updated every frame.
    anchor: Mat4,
    /// Local bounds of the surface the overlay covers.
    surface: Aabb,
    /// Placement from the last composite.
    placement: Option<OverlayPlacement>,
}

/// Compositor settings.
#[derive(Clone, Debug, Default)]
pub struct CompositorSettings {
    /// Drop overlays that project entirely outside the viewport.
    pub cull_offscreen: bool,
}

/// Compositor statistics.
#[derive(Clone, Debug, Default)]
pub struct CompositorStats {
    /// Number of overlays placed.
    pub overlays_placed: u32,
    /// Number of overlays culled.
    pub overlays_culled: u32,
    /// Composition time in milliseconds.
    pub composition_time_ms: f32,
}

impl Compositor {
    /// Create a new compositor.
    pub fn new(viewport: Size) -> Self {
        Self {
            overlays: SlotMap::with_key(),
            masks: Vec::new(),
            viewport,
            settings: CompositorSettings::default(),
            stats: CompositorStats::default(),
        }
    }

    /// Resize the compositor. Cached placements are invalid afterwards.
    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        for entry in self.overlays.values_mut() {
            entry.placement = None;
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Register a mask pass. Mask IDs are unique.
    pub fn add_mask(&mut self, mask: MaskPass) -> SceneResult<()> {
        if self.masks.iter().any(|m| m.mask_id == mask.mask_id) {
            return Err(SceneError::invalid(format!("mask {} already registered", mask.mask_id)));
        }
        debug!("Registered mask {} on {}", mask.mask_id, mask.geometry);
        self.masks.push(mask);
        Ok(())
    }

    /// Mask passes in registration order.
    pub fn masks(&self) -> &[MaskPass] {
        &self.masks
    }

    /// Add an overlay anchored at `anchor`, covering `surface`.
    pub fn add_overlay(
        &mut self,
        overlay: HtmlOverlay,
        anchor: Mat4,
        surface: Aabb,
    ) -> SceneResult<OverlayId> {
        if let Some(mask) = overlay.mask {
            if !self.masks.iter().any(|m| m.mask_id == mask) {
                return Err(SceneError::invalid(format!("overlay references unknown mask {}", mask)));
            }
        }
        debug!("Overlay added into portal {}", overlay.portal.container);
        Ok(self.overlays.insert(OverlayEntry {
            overlay,
            anchor,
            surface,
            placement: None,
        }))
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&HtmlOverlay> {
        self.overlays.get(id).map(|entry| &entry.overlay)
    }

    /// Move an overlay's anchor.
    pub fn set_anchor(&mut self, id: OverlayId, anchor: Mat4) -> SceneResult<()> {
        let entry = self
            .overlays
            .get_mut(id)
            .ok_or_else(|| SceneError::invalid("unknown overlay"))?;
        entry.anchor = anchor;
        Ok(())
    }

    /// Placement from the most recent composite.
    pub fn placement(&self, id: OverlayId) -> Option<&OverlayPlacement> {
        self.overlays.get(id).and_then(|entry| entry.placement.as_ref())
    }

    /// Place every overlay for this frame. Results are in paint order:
    /// ascending z-index, farther overlays first within one z-index.
    pub fn composite(&mut self, camera: &OrthographicCamera) -> Vec<(OverlayId, OverlayPlacement)> {
        let start = std::time::Instant::now();
        self.stats = CompositorStats::default();

        let mut placed = Vec::with_capacity(self.overlays.len());
        for (id, entry) in self.overlays.iter_mut() {
            let placement = entry.overlay.place(&entry.anchor, &entry.surface, camera, self.viewport);
            entry.placement = Some(placement.clone());

            if self.settings.cull_offscreen && !placement.visible {
                self.stats.overlays_culled += 1;
                continue;
            }
            self.stats.overlays_placed += 1;
            placed.push((id, placement));
        }

        placed.sort_by_key(|(_, p)| (p.z_index, Reverse(OrderedFloat(p.depth))));

        self.stats.composition_time_ms = start.elapsed().as_secs_f32() * 1000.0;
        trace!(
            "Composited {} overlays ({} culled)",
            self.stats.overlays_placed,
            self.stats.overlays_culled
        );
        placed
    }

    /// Get compositor statistics.
    pub fn stats(&self) -> &CompositorStats {
        &self.stats
    }

    /// Get compositor settings.
    pub fn settings(&self) -> &CompositorSettings {
        &self.settings
    }

    /// Set compositor settings.
    pub fn set_settings(&mut self, settings: CompositorSettings) {
        self.settings = settings;
    }

    /// Drop all overlays and masks.
    pub fn clear(&mut self) {
        self.overlays.clear();
        self.masks.clear();
    }
}
