//! The mounted scene.

use crate::config::SceneConfig;
use crate::tree::{GroupContent, GroupId, SceneTree};
use animator::{AnimationState, Animator, FloatMotion, FrameInput, OrthographicCamera};
use assets::{GeometryRef, Material, MaterialId, MaterialLibrary, NodeGraph, NodeId, RenderFlags};
use common::{Aabb, Point, Rect, SceneError, SceneResult, Size, Transform3D};
use compositor::overlay::{project_bounds, surface_contains};
use compositor::{
    propagate_stencil, Compositor, EmbeddedContent, HtmlOverlay, MaskPass, OverlayId,
    OverlayPlacement, Portal, StencilDescriptor,
};
use glam::{Mat4, Vec3};
use input::{InputEvent, PointerCapture, PointerEvent, PointerSampler, ScrollSampler, WheelEvent};
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// ID of the material created for the interactive screen surface.
pub const SCREEN_MATERIAL: &str = "screen-surface";

/// Things pointer and wheel events can land on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    Screen,
}

/// Groups the scene updates every frame.
#[derive(Clone, Copy, Debug)]
struct Groups {
    hand: GroupId,
    float: GroupId,
    mask: GroupId,
    screen: GroupId,
}

/// What one frame produced.
#[derive(Clone, Debug)]
pub struct FrameOutput {
    /// Frame number, starting at 1.
    pub frame: u64,
    pub state: AnimationState,
    pub camera_position: Vec3,
    pub camera_zoom: f32,
    /// World matrix of the animated hand group.
    pub hand_world: Mat4,
    /// Projected screen mesh bounds in viewport pixels.
    pub screen_rect: Rect,
    /// Overlay placements in paint order.
    pub overlays: Vec<OverlayPlacement>,
}

/// A mounted hand-and-phone scene.
pub struct Scene {
    config: SceneConfig,
    graph: Arc<NodeGraph>,
    materials: MaterialLibrary,
    tree: SceneTree,
    groups: Groups,
    screen_bounds: Aabb,
    /// Screen world matrix as of the last frame.
    screen_world: Mat4,
    screen_rect: Rect,
    camera: OrthographicCamera,
    animator: Animator,
    float: FloatMotion,
    state: AnimationState,
    pointer: PointerSampler,
    capture: PointerCapture<HitTarget>,
    scroll: ScrollSampler,
    compositor: Compositor,
    overlay: OverlayId,
    frames: u64,
    running: bool,
}

impl Scene {
    /// Resolve named nodes, mask the phone parts and build the scene.
    ///
    /// Fails without rendering anything if a named node or a referenced
    /// material is missing.
    pub fn mount(graph: Arc<NodeGraph>, config: SceneConfig) -> SceneResult<Self> {
        config.validate()?;
        let names = &config.nodes;

        let hand_right = graph.get(&names.hand_right)?.id;
        let hand_left = graph.get(&names.hand_left)?.id;
        let parts = names
            .phone_parts
            .iter()
            .map(|name| graph.get(name).map(|node| node.id))
            .collect::<SceneResult<SmallVec<[NodeId; 4]>>>()?;
        let screen_node = graph.get(&names.screen)?;
        let screen_geometry = screen_node.geometry.clone().ok_or_else(|| {
            SceneError::invalid(format!("node {} has no geometry", screen_node.name))
        })?;

        let stencil = StencilDescriptor::new(config.mask.id, config.mask.inverse);
        let mut materials = graph.materials().clone();
        propagate_stencil(&graph, &mut materials, &stencil, &names.hand_right)?;

        let mut screen_material = Material::transparent(SCREEN_MATERIAL, config.screen_opacity);
        screen_material.flags |= RenderFlags::RECEIVE_SHADOW;
        materials.insert(screen_material);

        let (tree, groups) = build_tree(&config, hand_right, hand_left, parts, &screen_geometry);
        debug!(
            "Draw order: {}",
            tree.draw_order()
                .into_iter()
                .filter_map(|id| tree.get(id).map(|group| group.name.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut camera = OrthographicCamera::new(config.viewport, config.camera.near, config.camera.far)
            .with_position(config.camera.position);
        camera.look_at(config.tuning.look_target);

        let mut compositor = Compositor::new(config.viewport);
        compositor.add_mask(
            MaskPass::new(config.mask.id, screen_geometry.id.clone()).with_shadows(true, true),
        )?;

        let content_size = config.overlay.content_size.unwrap_or_else(|| {
            let size = screen_geometry.bounds.size();
            Size::new(size.x, size.y)
        });
        let overlay = HtmlOverlay::new(
            EmbeddedContent::new(config.overlay.class_name.clone(), content_size),
            Portal::new(config.overlay.portal.clone()),
        )
        .with_scale(config.overlay.scale)
        .with_z_index_range(config.overlay.z_index_range.0, config.overlay.z_index_range.1)
        .with_mask(config.mask.id);
        let overlay = compositor.add_overlay(overlay, tree.world_matrix(groups.mask), screen_geometry.bounds)?;

        let viewport = Rect::new(0.0, 0.0, config.viewport.width, config.viewport.height);
        let screen_world = tree.world_matrix(groups.screen);
        let screen_rect = project_bounds(&screen_geometry.bounds, &screen_world, &camera, config.viewport);

        info!(
            "Scene mounted: {} nodes, {} groups, {} lights",
            graph.len(),
            tree.len(),
            config.lights.len()
        );

        Ok(Self {
            animator: Animator::new(config.tuning, config.timing),
            float: FloatMotion::new(config.float),
            scroll: ScrollSampler::new(config.scroll_decay()),
            pointer: PointerSampler::new(viewport),
            capture: PointerCapture::new(),
            state: AnimationState::new(),
            screen_bounds: screen_geometry.bounds,
            screen_world,
            screen_rect,
            config,
            graph,
            materials,
            tree,
            groups,
            camera,
            compositor,
            overlay,
            frames: 0,
            running: true,
        })
    }

    /// What lies under a page position.
    pub fn hit_test(&self, page: Point) -> Option<HitTarget> {
        let hit = self.screen_rect.contains_point(page)
            && surface_contains(
                page,
                &self.screen_bounds,
                &self.screen_world,
                &self.camera,
                self.config.viewport,
            );
        hit.then_some(HitTarget::Screen)
    }

    /// Track the pointer. Returns the target the move routes to.
    pub fn on_pointer_move(&mut self, event: &PointerEvent) -> Option<HitTarget> {
        self.pointer.move_to(event.page);
        self.capture.route(event.pointer_id, self.hit_test(event.page))
    }

    /// Press the screen if the pointer is over it. Returns whether the
    /// screen took the event.
    pub fn on_pointer_down(&mut self, event: &PointerEvent) -> bool {
        if !self.running {
            return false;
        }
        self.pointer.move_to(event.page);

        match self.capture.route(event.pointer_id, self.hit_test(event.page)) {
            Some(target) => {
                self.capture.capture(event.pointer_id, target);
                self.pointer.set_pressed(true);
                debug!("Pointer {} pressed {:?}", event.pointer_id, target);
                true
            }
            None => false,
        }
    }

    /// Release the screen. Captured pointers release even when the
    /// pointer has left the screen.
    pub fn on_pointer_up(&mut self, event: &PointerEvent) -> bool {
        if !self.running {
            return false;
        }
        self.pointer.move_to(event.page);

        match self.capture.route(event.pointer_id, self.hit_test(event.page)) {
            Some(target) => {
                self.capture.release(event.pointer_id, target);
                self.pointer.set_pressed(false);
                debug!("Pointer {} released {:?}", event.pointer_id, target);
                true
            }
            None => false,
        }
    }

    /// Scroll over the screen. `now` is time since mount.
    pub fn on_wheel(&mut self, now: Duration, event: &WheelEvent) -> bool {
        if !self.running || self.hit_test(event.page).is_none() {
            return false;
        }
        self.scroll.on_wheel(now, event.delta_y);
        true
    }

    /// Dispatch any input event.
    pub fn handle_event(&mut self, now: Duration, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown(e) => self.on_pointer_down(e),
            InputEvent::PointerUp(e) => self.on_pointer_up(e),
            InputEvent::PointerMove(e) => self.on_pointer_move(e).is_some(),
            InputEvent::Wheel(e) => self.on_wheel(now, e),
        }
    }

    /// Advance one frame. `now` is time since mount, `dt` the time since
    /// the previous frame. Returns `None` once unmounted.
    pub fn frame(&mut self, now: Duration, dt: Duration) -> Option<FrameOutput> {
        if !self.running {
            return None;
        }

        self.scroll.poll(now);

        self.tree.set_transform(self.groups.float, self.float.sample(now));

        let input = FrameInput {
            pointer: self.pointer.ndc(),
            pressed: self.pointer.pressed(),
            scroll_velocity: self.scroll.velocity(),
        };
        self.animator.tick(&mut self.state, &mut self.camera, &input, dt);

        self.tree.set_transform(
            self.groups.hand,
            Transform3D::from_position(self.state.hand_position)
                .with_rotation(Vec3::new(self.state.hand_rotation, 0.0, 0.0)),
        );

        let mask_world = self.tree.world_matrix(self.groups.mask);
        if let Err(err) = self.compositor.set_anchor(self.overlay, mask_world) {
            warn!("Overlay anchor not updated: {}", err);
        }
        let overlays = self
            .compositor
            .composite(&self.camera)
            .into_iter()
            .map(|(_, placement)| placement)
            .collect();

        self.screen_world = self.tree.world_matrix(self.groups.screen);
        self.screen_rect = project_bounds(
            &self.screen_bounds,
            &self.screen_world,
            &self.camera,
            self.config.viewport,
        );

        self.frames += 1;
        trace!("Frame {} screen at {:?}", self.frames, self.screen_rect);
        Some(FrameOutput {
            frame: self.frames,
            state: self.state,
            camera_position: self.camera.position,
            camera_zoom: self.camera.zoom,
            hand_world: self.tree.world_matrix(self.groups.hand),
            screen_rect: self.screen_rect,
            overlays,
        })
    }

    /// Match a new viewport size.
    pub fn resize(&mut self, viewport: Size) {
        self.config.viewport = viewport;
        self.camera.resize(viewport);
        self.pointer
            .resize(Rect::new(0.0, 0.0, viewport.width, viewport.height));
        self.compositor.resize(viewport);
        debug!("Scene resized to {}x{}", viewport.width, viewport.height);
    }

    /// Stop the scene. Cancels the scroll decay timer and drops pointer
    /// captures; later frames return `None`.
    pub fn unmount(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.scroll.cancel();
        self.capture.clear();
        self.pointer.set_pressed(false);
        self.compositor.clear();
        info!("Scene unmounted after {} frames", self.frames);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// Materials after stencil propagation.
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    pub fn material(&self, id: &str) -> Option<&Material> {
        self.materials.get(&MaterialId::new(id))
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    pub fn camera(&self) -> &OrthographicCamera {
        &self.camera
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn pressed(&self) -> bool {
        self.pointer.pressed()
    }

    pub fn scroll_velocity(&self) -> f32 {
        self.scroll.velocity()
    }

    pub fn has_pending_decay(&self) -> bool {
        self.scroll.has_pending_decay()
    }

    /// Screen bounds in viewport pixels as of the last frame.
    pub fn screen_rect(&self) -> Rect {
        self.screen_rect
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn build_tree(
    config: &SceneConfig,
    hand_right: NodeId,
    hand_left: NodeId,
    parts: SmallVec<[NodeId; 4]>,
    screen: &GeometryRef,
) -> (SceneTree, Groups) {
    let layout = &config.layout;
    let mut tree = SceneTree::new();

    let root = tree.create_group("root", Transform3D::from_position(layout.root_position));
    tree.set_root(root);

    let hand = tree.create_group("hand", Transform3D::identity());
    tree.append_child(root, hand);
    let hand_clone = tree.create_with_content(
        "hand-r",
        Transform3D::identity().with_rotation(Vec3::new(0.0, layout.hand_right_rotation_y, 0.0)),
        GroupContent::Clone(SmallVec::from_slice(&[hand_right])),
    );
    tree.append_child(hand, hand_clone);

    let float = tree.create_group("float", Transform3D::identity());
    tree.append_child(root, float);

    let inner = tree.create_group(
        "inner",
        Transform3D::from_position(layout.inner_position)
            .with_rotation(Vec3::new(layout.inner_rotation_x, 0.0, 0.0)),
    );
    tree.append_child(float, inner);

    let left = tree.create_with_content(
        "hand-l",
        Transform3D::from_position(layout.hand_left_position),
        GroupContent::Clone(SmallVec::from_slice(&[hand_left])),
    );
    tree.append_child(inner, left);

    let phone = tree.create_group("phone", Transform3D::from_position(layout.phone_position));
    tree.append_child(inner, phone);

    let body = tree.create_with_content("phone-body", Transform3D::identity(), GroupContent::Clone(parts));
    tree.append_child(phone, body);

    let mask = tree.create_with_content(
        "mask",
        Transform3D::from_position(layout.mask_position),
        GroupContent::Mask {
            mask_id: config.mask.id,
            geometry: screen.clone(),
        },
    );
    tree.append_child(phone, mask);

    let screen_mesh = tree.create_with_content(
        "screen",
        Transform3D::identity(),
        GroupContent::Mesh {
            geometry: screen.clone(),
            material: MaterialId::new(SCREEN_MATERIAL),
        },
    );
    tree.append_child(phone, screen_mesh);

    (
        tree,
        Groups {
            hand,
            float,
            mask,
            screen: screen_mesh,
        },
    )
}
