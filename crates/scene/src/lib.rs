//! Phone Scene - a hand holding a phone whose screen shows embedded HTML.
//!
//! This crate wires the scene crates together:
//! - asset graph loading and stencil propagation
//! - the group hierarchy and lights
//! - input routing with hit-testing and pointer capture
//! - the per-frame animator and the DOM overlay compositor

pub mod tree;
pub mod lights;
pub mod config;
pub mod scene;
pub mod frame_loop;

pub use config::SceneConfig;
pub use frame_loop::FrameLoop;
pub use scene::{FrameOutput, HitTarget, Scene};
pub use tree::{GroupContent, GroupId, SceneTree};

/// Scene version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
