//! Scene asset provider.
//!
//! This crate turns a design-tool export into a named node graph:
//! - node lookup by unique name
//! - materials stored by value in a library keyed by id
//! - async loading with a per-path cache

pub mod graph;
pub mod material;
pub mod loader;

pub use graph::{GeometryRef, NodeGraph, NodeId, SceneExport, SceneNode};
pub use loader::{AssetCache, AssetSource, FileAssetSource, StaticAssetSource};
pub use material::{Material, MaterialId, MaterialKind, MaterialLibrary, RenderFlags, StencilFlags};
