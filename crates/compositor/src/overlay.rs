//! HTML overlays projected onto scene surfaces.
//!
//! An overlay is opaque DOM content rendered into a host container and
//! transformed with CSS so it appears glued to a mesh. Placement is
//! computed from the anchor's world matrix and the active camera.

use animator::OrthographicCamera;
use common::{Aabb, Point, Rect, Size};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for an overlay.
    pub struct OverlayId;
}

/// Distance factor used for transformed overlays. CSS pixels per world
/// unit are `400 / DISTANCE_FACTOR` before the overlay's own scale.
pub const DISTANCE_FACTOR: f32 = 10.0;

const CAMERA_MULTIPLIERS: [f32; 16] = [
    1.0, -1.0, 1.0, 1.0, //
    1.0, -1.0, 1.0, 1.0, //
    1.0, -1.0, 1.0, 1.0, //
    1.0, -1.0, 1.0, 1.0,
];

/// Host DOM container the overlay renders into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    pub container: String,
}

impl Portal {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
        }
    }
}

/// Embedded document content. The compositor never looks inside it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedContent {
    /// CSS class on the overlay element.
    pub class_name: String,
    /// Layout size of the content in CSS pixels.
    pub size: Size,
}

impl EmbeddedContent {
    pub fn new(class_name: impl Into<String>, size: Size) -> Self {
        Self {
            class_name: class_name.into(),
            size,
        }
    }
}

/// DOM content attached to a point in the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HtmlOverlay {
    pub content: EmbeddedContent,
    pub portal: Portal,
    /// Uniform scale of the overlay group.
    pub scale: f32,
    /// Inclusive z-index range mapped across the camera depth range.
    pub z_index_range: (i32, i32),
    /// Stencil mask the overlay sits inside, if any.
    pub mask: Option<u32>,
}

impl HtmlOverlay {
    pub fn new(content: EmbeddedContent, portal: Portal) -> Self {
        Self {
            content,
            portal,
            scale: 40.0,
            z_index_range: (-1, 0),
            mask: None,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_z_index_range(mut self, min: i32, max: i32) -> Self {
        self.z_index_range = (min, max);
        self
    }

    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Overlay group matrix for an anchor world matrix.
    pub fn object_matrix(&self, anchor: &Mat4) -> Mat4 {
        *anchor * Mat4::from_scale(Vec3::splat(self.scale))
    }

    /// Compute where the overlay lands this frame. `surface` is the local
    /// bounds of the mesh the overlay sits on.
    pub fn place(
        &self,
        anchor: &Mat4,
        surface: &Aabb,
        camera: &OrthographicCamera,
        viewport: Size,
    ) -> OverlayPlacement {
        let object = self.object_matrix(anchor);
        let origin = object.w_axis.truncate();
        let depth = origin.distance(camera.position);

        let screen_rect = project_bounds(surface, anchor, camera, viewport);
        let center_ndc = camera.project(origin);
        let on_screen = Rect::new(0.0, 0.0, viewport.width, viewport.height);
        let visible = (-1.0..=1.0).contains(&center_ndc.z)
            && screen_rect.intersection(&on_screen).is_some();

        OverlayPlacement {
            screen_rect,
            z_index: z_index(self.z_index_range, depth, camera.near, camera.far),
            depth,
            content_size: self.content.size,
            camera_css: camera_css(camera, viewport),
            object_css: object_css(&object, 400.0 / DISTANCE_FACTOR),
            mask: self.mask,
            visible,
        }
    }
}

/// Resolved per-frame placement of one overlay.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayPlacement {
    /// Projected bounds in viewport pixels.
    pub screen_rect: Rect,
    pub z_index: i32,
    /// Distance from the camera to the overlay origin.
    pub depth: f32,
    /// Layout size of the embedded content.
    pub content_size: Size,
    /// Transform for the outer (camera) element.
    pub camera_css: String,
    /// Transform for the inner (object) element.
    pub object_css: String,
    pub mask: Option<u32>,
    pub visible: bool,
}

impl OverlayPlacement {
    /// Inline style of the outer element.
    pub fn outer_style(&self, viewport: Size) -> String {
        format!(
            "position:absolute;top:0;left:0;width:{}px;height:{}px;transform-style:preserve-3d;pointer-events:none;z-index:{};transform:{}",
            viewport.width, viewport.height, self.z_index, self.camera_css
        )
    }

    /// Inline style of the inner element.
    pub fn inner_style(&self) -> String {
        format!(
            "position:absolute;width:{}px;height:{}px;transform:{};{}",
            self.content_size.width,
            self.content_size.height,
            self.object_css,
            if self.visible { "" } else { "display:none" }
        )
    }
}

/// Pixel rectangle enclosing `bounds` after `world` and the camera.
pub fn project_bounds(bounds: &Aabb, world: &Mat4, camera: &OrthographicCamera, viewport: Size) -> Rect {
    let corners = bounds
        .corners()
        .map(|corner| ndc_to_page(camera.project(world.transform_point3(corner)), viewport));
    Rect::from_points(corners).unwrap_or(Rect::ZERO)
}

/// Whether a page position lands on the z-mid plane of `bounds` inside
/// its x/y extent, after `world` and the camera. Unlike the projected
/// rectangle this follows the surface's rotation.
pub fn surface_contains(
    page: Point,
    bounds: &Aabb,
    world: &Mat4,
    camera: &OrthographicCamera,
    viewport: Size,
) -> bool {
    if viewport.is_empty() || world.determinant().abs() < f32::EPSILON {
        return false;
    }

    let ndc = page_to_ndc(page, viewport);
    let local = world.inverse();
    let near = local.transform_point3(camera.unproject(ndc.extend(-1.0)));
    let far = local.transform_point3(camera.unproject(ndc.extend(1.0)));

    let ray = far - near;
    if ray.z.abs() < f32::EPSILON {
        return false;
    }
    let plane = bounds.center().z;
    let hit = near + ray * ((plane - near.z) / ray.z);

    (bounds.min.x..=bounds.max.x).contains(&hit.x) && (bounds.min.y..=bounds.max.y).contains(&hit.y)
}

/// Map page pixels to NDC with y pointing up.
pub fn page_to_ndc(page: Point, viewport: Size) -> Vec2 {
    Vec2::new(
        page.x / viewport.width * 2.0 - 1.0,
        1.0 - page.y / viewport.height * 2.0,
    )
}

/// Map NDC to page pixels with y pointing down.
pub fn ndc_to_page(ndc: Vec3, viewport: Size) -> Point {
    Point::new(
        (ndc.x + 1.0) / 2.0 * viewport.width,
        (1.0 - ndc.y) / 2.0 * viewport.height,
    )
}

/// Linear map of camera distance onto the z-index range.
pub fn z_index(range: (i32, i32), distance: f32, near: f32, far: f32) -> i32 {
    let (min, max) = (range.0 as f32, range.1 as f32);
    if far == near {
        return range.1;
    }
    let a = (max - min) / (far - near);
    let b = max - a * far;
    (a * distance + b).round() as i32
}

/// CSS transform placing the camera for a transformed overlay.
pub fn camera_css(camera: &OrthographicCamera, viewport: Size) -> String {
    let half = viewport.half();
    let fov = camera.projection_matrix().y_axis.y * half.height;
    format!(
        "scale({})translate({}px,{}px){}translate({}px,{}px)",
        epsilon(fov),
        epsilon(-(camera.right + camera.left) / 2.0),
        epsilon((camera.top + camera.bottom) / 2.0),
        matrix3d(&camera.view_matrix(), &CAMERA_MULTIPLIERS),
        half.width,
        half.height
    )
}

/// CSS transform for the overlay element itself.
pub fn object_css(object: &Mat4, factor: f32) -> String {
    let f = 1.0 / factor;
    let multipliers = [
        f, f, f, 1.0, //
        -f, -f, -f, -1.0, //
        f, f, f, 1.0, //
        1.0, 1.0, 1.0, 1.0,
    ];
    format!("translate(-50%,-50%){}", matrix3d(object, &multipliers))
}

fn matrix3d(matrix: &Mat4, multipliers: &[f32; 16]) -> String {
    let values: Vec<String> = matrix
        .to_cols_array()
        .iter()
        .zip(multipliers)
        .map(|(v, m)| epsilon(v * m).to_string())
        .collect();
    format!("matrix3d({})", values.join(","))
}

fn epsilon(value: f32) -> f32 {
    if value.abs() < 1e-10 {
        0.0
    } else {
        value
    }
}
