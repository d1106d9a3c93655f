//! Compositor for DOM content embedded in the 3D scene.
//!
//! The compositor handles:
//! - the stencil mask that clips scene geometry around the screen
//! - projecting HTML overlays onto mesh surfaces every frame
//! - depth ordering of overlays against the 3D scene

pub mod stencil;
pub mod overlay;
pub mod compositor;

pub use self::compositor::{Compositor, CompositorSettings, CompositorStats};
pub use overlay::{EmbeddedContent, HtmlOverlay, OverlayId, OverlayPlacement, Portal};
pub use stencil::{propagate_stencil, MaskPass, StencilDescriptor};
