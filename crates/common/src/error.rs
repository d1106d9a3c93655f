//! Common error types.

use thiserror::Error;

/// Main error type for scene construction.
///
/// Only initialization can fail. Once a scene is mounted the per-frame
/// path is plain arithmetic and has no error channel.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Asset load error: {0}")]
    AssetLoad(String),

    #[error("Missing node: {0}")]
    MissingNode(String),

    #[error("Missing material: {0}")]
    MissingMaterial(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SceneResult<T> = Result<T, SceneError>;

impl SceneError {
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    pub fn missing_node(name: impl Into<String>) -> Self {
        Self::MissingNode(name.into())
    }

    pub fn missing_material(name: impl Into<String>) -> Self {
        Self::MissingMaterial(name.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error means a named part of the scene is absent.
    pub fn is_missing_node(&self) -> bool {
        matches!(self, Self::MissingNode(_))
    }
}
