//! Pointer position sampling and pointer capture.

use common::{Point, Rect};
use glam::Vec2;
use smallvec::SmallVec;
use tracing::warn;

/// Map a page position into normalized device coordinates relative to
/// `viewport`: x grows right, y grows up, both in [-1, 1] inside it.
pub fn normalize_pointer(page: Point, viewport: Rect) -> Vec2 {
    if viewport.is_empty() {
        return Vec2::ZERO;
    }
    let x = (page.x - viewport.x) / viewport.width * 2.0 - 1.0;
    let y = -((page.y - viewport.y) / viewport.height) * 2.0 + 1.0;
    Vec2::new(x, y)
}

/// Tracks the latest pointer position and the pressed flag.
#[derive(Clone, Debug)]
pub struct PointerSampler {
    /// Viewport the pointer is normalized against.
    viewport: Rect,
    /// Last page position.
    page: Point,
    /// Normalized position.
    ndc: Vec2,
    /// Whether the interactive surface is pressed.
    pressed: bool,
}

impl PointerSampler {
    pub fn new(viewport: Rect) -> Self {
        let page = viewport.center();
        Self {
            viewport,
            page,
            ndc: normalize_pointer(page, viewport),
            pressed: false,
        }
    }

    /// Record a new page position.
    pub fn move_to(&mut self, page: Point) {
        self.page = page;
        self.ndc = normalize_pointer(page, self.viewport);
    }

    /// Update the viewport, keeping the page position.
    pub fn resize(&mut self, viewport: Rect) {
        self.viewport = viewport;
        self.ndc = normalize_pointer(self.page, viewport);
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    pub fn pressed(&self) -> bool {
        self.pressed
    }

    /// Normalized pointer position.
    pub fn ndc(&self) -> Vec2 {
        self.ndc
    }

    pub fn page(&self) -> Point {
        self.page
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }
}

/// Pointer capture table.
///
/// While a pointer is captured, its events route to the capturing
/// target regardless of what lies under the pointer.
#[derive(Clone, Debug)]
pub struct PointerCapture<T> {
    captures: SmallVec<[(u32, T); 2]>,
}

impl<T: Copy + PartialEq> PointerCapture<T> {
    pub fn new() -> Self {
        Self {
            captures: SmallVec::new(),
        }
    }

    /// Bind `pointer_id` to `target`, replacing any earlier capture.
    pub fn capture(&mut self, pointer_id: u32, target: T) {
        self.captures.retain(|(id, _)| *id != pointer_id);
        self.captures.push((pointer_id, target));
    }

    /// Release a capture held by `target`. Returns whether one existed.
    pub fn release(&mut self, pointer_id: u32, target: T) -> bool {
        let before = self.captures.len();
        self.captures
            .retain(|(id, held)| !(*id == pointer_id && *held == target));
        let released = self.captures.len() != before;
        if !released {
            warn!("Pointer {} released without a matching capture", pointer_id);
        }
        released
    }

    /// Target capturing `pointer_id`.
    pub fn target_of(&self, pointer_id: u32) -> Option<T> {
        self.captures
            .iter()
            .find(|(id, _)| *id == pointer_id)
            .map(|(_, target)| *target)
    }

    pub fn is_captured(&self, pointer_id: u32) -> bool {
        self.target_of(pointer_id).is_some()
    }

    /// Resolve the target for an event: the capturing target if any,
    /// otherwise the hit-tested one.
    pub fn route(&self, pointer_id: u32, hit: Option<T>) -> Option<T> {
        self.target_of(pointer_id).or(hit)
    }

    /// Drop all captures.
    pub fn clear(&mut self) {
        self.captures.clear();
    }
}

impl<T: Copy + PartialEq> Default for PointerCapture<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pointer() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
        assert_eq!(normalize_pointer(Point::new(400.0, 300.0), viewport), Vec2::ZERO);
        assert_eq!(normalize_pointer(Point::new(0.0, 0.0), viewport), Vec2::new(-1.0, 1.0));
        assert_eq!(normalize_pointer(Point::new(800.0, 600.0), viewport), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_normalize_pointer_with_offset_viewport() {
        let viewport = Rect::new(100.0, 50.0, 200.0, 100.0);
        assert_eq!(normalize_pointer(Point::new(200.0, 100.0), viewport), Vec2::ZERO);
        assert_eq!(normalize_pointer(Point::new(1.0, 1.0), Rect::ZERO), Vec2::ZERO);
    }

    #[test]
    fn test_sampler_starts_centered() {
        let mut sampler = PointerSampler::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        assert_eq!(sampler.ndc(), Vec2::ZERO);
        assert!(!sampler.pressed());

        sampler.move_to(Point::new(800.0, 300.0));
        assert_eq!(sampler.ndc(), Vec2::new(1.0, 0.0));

        sampler.resize(Rect::new(0.0, 0.0, 1600.0, 600.0));
        assert_eq!(sampler.ndc(), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn test_capture_routes_to_holder() {
        let mut capture = PointerCapture::new();
        capture.capture(1, "screen");

        assert_eq!(capture.route(1, None), Some("screen"));
        assert_eq!(capture.route(1, Some("other")), Some("screen"));
        assert_eq!(capture.route(2, Some("other")), Some("other"));
        assert_eq!(capture.route(2, None), None);
    }

    #[test]
    fn test_release_requires_holder() {
        let mut capture = PointerCapture::new();
        capture.capture(1, "screen");

        assert!(!capture.release(1, "other"));
        assert!(capture.is_captured(1));
        assert!(capture.release(1, "screen"));
        assert!(!capture.is_captured(1));
    }
}
