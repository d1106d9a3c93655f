//! Asset loading and caching.

use crate::graph::{NodeGraph, SceneExport};
use async_trait::async_trait;
use common::{SceneError, SceneResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Source of scene exports.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Load and validate the graph at `path`.
    async fn load(&self, path: &str) -> SceneResult<NodeGraph>;
}

/// Parse an export from raw bytes.
pub fn parse_export(bytes: &[u8]) -> SceneResult<NodeGraph> {
    let export: SceneExport = serde_json::from_slice(bytes)?;
    NodeGraph::from_export(export)
}

/// Wrap read and decode failures as asset-load errors. Structural
/// errors (missing nodes, duplicates) pass through unchanged.
fn load_failure(path: &str, err: SceneError) -> SceneError {
    match err {
        SceneError::Io(e) => SceneError::asset_load(format!("{}: {}", path, e)),
        SceneError::Json(e) => SceneError::asset_load(format!("{}: malformed export: {}", path, e)),
        other => other,
    }
}

/// Loads exports from the filesystem relative to a root directory.
#[derive(Clone, Debug)]
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a path-like asset name. A leading `/` is relative to the
    /// root, not the filesystem root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let relative = path.trim_start_matches('/');
        self.root.join(Path::new(relative))
    }
}

#[async_trait]
impl AssetSource for FileAssetSource {
    async fn load(&self, path: &str) -> SceneResult<NodeGraph> {
        let resolved = self.resolve(path);
        debug!("Reading asset {}", resolved.display());

        let bytes = tokio::fs::read(&resolved)
            .await
            .map_err(|e| load_failure(path, e.into()))?;
        let graph = parse_export(&bytes).map_err(|e| load_failure(path, e))?;

        info!("Loaded {} ({} nodes, {} materials)", path, graph.len(), graph.materials().len());
        Ok(graph)
    }
}

/// In-memory source, keyed by asset path.
#[derive(Clone, Debug, Default)]
pub struct StaticAssetSource {
    entries: HashMap<String, Vec<u8>>,
}

impl StaticAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(path.into(), bytes.into());
        self
    }
}

#[async_trait]
impl AssetSource for StaticAssetSource {
    async fn load(&self, path: &str) -> SceneResult<NodeGraph> {
        let bytes = self
            .entries
            .get(path)
            .ok_or_else(|| SceneError::asset_load(format!("{}: not found", path)))?;
        parse_export(bytes).map_err(|e| load_failure(path, e))
    }
}

/// Cache of loaded graphs, one per asset path.
pub struct AssetCache<S: AssetSource> {
    source: S,
    graphs: RwLock<HashMap<String, Arc<NodeGraph>>>,
}

impl<S: AssetSource> AssetCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            graphs: RwLock::new(HashMap::new()),
        }
    }

    /// Load a graph, returning the cached copy when present.
    pub async fn load(&self, path: &str) -> SceneResult<Arc<NodeGraph>> {
        if let Some(graph) = self.graphs.read().get(path) {
            return Ok(graph.clone());
        }

        let graph = Arc::new(self.source.load(path).await?);

        // A concurrent load of the same path may have finished first.
        let mut graphs = self.graphs.write();
        let entry = graphs.entry(path.to_string()).or_insert(graph);
        Ok(entry.clone())
    }

    /// Drop a cached graph.
    pub fn invalidate(&self, path: &str) -> bool {
        self.graphs.write().remove(path).is_some()
    }

    /// Number of cached graphs.
    pub fn len(&self) -> usize {
        self.graphs.read().len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.graphs.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHONE: &str = r#"{ "nodes": [{ "name": "screen" }, { "name": "hand-r" }] }"#;

    #[test]
    fn test_resolve_strips_leading_slash() {
        let source = FileAssetSource::new("/srv/assets");
        assert_eq!(source.resolve("/scroll.json"), PathBuf::from("/srv/assets/scroll.json"));
        assert_eq!(source.resolve("scroll.json"), PathBuf::from("/srv/assets/scroll.json"));
    }

    #[tokio::test]
    async fn test_file_source_loads_export() {
        let dir = std::env::temp_dir().join(format!("phone-scene-assets-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("scroll.json"), PHONE).await.unwrap();

        let source = FileAssetSource::new(&dir);
        let graph = source.load("/scroll.json").await.unwrap();
        assert!(graph.contains("screen"));

        let missing = source.load("/absent.json").await.unwrap_err();
        assert!(matches!(missing, SceneError::AssetLoad(_)));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_export_is_asset_load_error() {
        let source = StaticAssetSource::new().with_entry("/bad.json", "{ not json");
        let err = source.load("/bad.json").await.unwrap_err();
        assert!(matches!(err, SceneError::AssetLoad(_)));
        assert!(err.to_string().contains("/bad.json"));
    }

    #[tokio::test]
    async fn test_cache_returns_same_graph() {
        let cache = AssetCache::new(StaticAssetSource::new().with_entry("/scroll.json", PHONE));

        let first = cache.load("/scroll.json").await.unwrap();
        let second = cache.load("/scroll.json").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate("/scroll.json"));
        assert!(cache.is_empty());
    }
}
