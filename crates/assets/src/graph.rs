//! Named scene node graph.

use crate::material::{MaterialExport, MaterialId, MaterialLibrary};
use common::geometry::{Aabb, Transform3D};
use common::{SceneError, SceneResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Unique identifier for a node.
    pub struct NodeId;
}

/// Geometry reference carried by a mesh node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryRef {
    /// Geometry ID.
    pub id: String,
    /// Local-space bounds.
    #[serde(default)]
    pub bounds: Aabb,
}

/// A node from the exported scene.
#[derive(Clone, Debug)]
pub struct SceneNode {
    /// Node ID.
    pub id: NodeId,
    /// Unique name.
    pub name: String,
    /// Parent node.
    pub parent: Option<NodeId>,
    /// Child nodes, in export order.
    pub children: SmallVec<[NodeId; 4]>,
    /// Material reference.
    pub material: Option<MaterialId>,
    /// Geometry reference.
    pub geometry: Option<GeometryRef>,
    /// Local transform.
    pub transform: Transform3D,
}

impl SceneNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Serialized scene as written by the design tool.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneExport {
    #[serde(default)]
    pub materials: Vec<MaterialExport>,
    pub nodes: Vec<NodeExport>,
}

/// Serialized node. Children are referenced by name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeExport {
    pub name: String,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub geometry: Option<GeometryRef>,
    #[serde(default)]
    pub transform: Transform3D,
}

/// Read-only node graph with lookup by name.
#[derive(Clone, Debug, Default)]
pub struct NodeGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    names: IndexMap<String, NodeId>,
    materials: MaterialLibrary,
}

impl NodeGraph {
    /// Build a graph from an export, validating names and references.
    pub fn from_export(export: SceneExport) -> SceneResult<Self> {
        let mut materials = MaterialLibrary::new();
        for material in export.materials {
            let id = MaterialId::new(material.id.clone());
            if materials.contains(&id) {
                return Err(SceneError::parse(format!("duplicate material id: {}", id)));
            }
            materials.insert(material.into_material());
        }

        let mut nodes: SlotMap<NodeId, SceneNode> = SlotMap::with_key();
        let mut names = IndexMap::new();
        let mut child_names = Vec::with_capacity(export.nodes.len());

        for node in export.nodes {
            if names.contains_key(&node.name) {
                return Err(SceneError::parse(format!("duplicate node name: {}", node.name)));
            }

            let material = match node.material {
                Some(id) => {
                    let id = MaterialId::new(id);
                    if !materials.contains(&id) {
                        return Err(SceneError::missing_material(format!(
                            "{} (referenced by {})",
                            id, node.name
                        )));
                    }
                    Some(id)
                }
                None => None,
            };

            let name = node.name;
            let id = nodes.insert_with_key(|id| SceneNode {
                id,
                name: name.clone(),
                parent: None,
                children: SmallVec::new(),
                material,
                geometry: node.geometry,
                transform: node.transform,
            });
            names.insert(name, id);
            child_names.push((id, node.children));
        }

        for (parent_id, children) in child_names {
            for child_name in children {
                let child_id = *names
                    .get(&child_name)
                    .ok_or_else(|| SceneError::missing_node(child_name.clone()))?;

                if child_id == parent_id {
                    return Err(SceneError::parse(format!("node {} lists itself as a child", child_name)));
                }
                if nodes[child_id].parent.is_some() {
                    return Err(SceneError::parse(format!("node {} has more than one parent", child_name)));
                }

                nodes[child_id].parent = Some(parent_id);
                nodes[parent_id].children.push(child_id);
            }
        }

        let graph = Self {
            nodes,
            names,
            materials,
        };
        graph.check_acyclic()?;
        Ok(graph)
    }

    fn check_acyclic(&self) -> SceneResult<()> {
        let limit = self.nodes.len();
        for node in self.nodes.values() {
            let mut steps = 0;
            let mut current = node.parent;
            while let Some(id) = current {
                steps += 1;
                if steps > limit {
                    return Err(SceneError::parse(format!("cycle through node {}", node.name)));
                }
                current = self.nodes.get(id).and_then(|n| n.parent);
            }
        }
        Ok(())
    }

    /// Look up a node by name.
    pub fn get(&self, name: &str) -> SceneResult<&SceneNode> {
        self.names
            .get(name)
            .and_then(|id| self.nodes.get(*id))
            .ok_or_else(|| SceneError::missing_node(name))
    }

    /// Look up a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Check whether a name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Iterate over every node in export order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.names.values().filter_map(|id| self.nodes.get(*id))
    }

    /// Nodes without a parent, in export order.
    pub fn roots(&self) -> impl Iterator<Item = &SceneNode> {
        self.iter().filter(|node| node.parent.is_none())
    }

    /// Direct children of a node.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &SceneNode> {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|node| node.children.iter())
            .filter_map(|child| self.nodes.get(*child))
    }

    /// Materials shipped with the export.
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export(json: &str) -> SceneExport {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_graph_lookup() {
        let graph = NodeGraph::from_export(export(
            r##"{
                "materials": [{ "id": "skin", "color": "#f0c8a0" }],
                "nodes": [
                    { "name": "hand-r", "children": ["palm"] },
                    { "name": "palm", "material": "skin",
                      "transform": { "position": [1.0, 2.0, 3.0] } }
                ]
            }"##,
        ))
        .unwrap();

        assert_eq!(graph.len(), 2);
        let skin = graph.materials().get(&MaterialId::new("skin")).unwrap();
        assert_eq!(skin.color, common::Color::rgb(0xf0, 0xc8, 0xa0));

        let hand = graph.get("hand-r").unwrap();
        assert!(hand.has_children());

        let children: Vec<_> = graph.children(hand.id).map(|n| n.name.as_str()).collect();
        assert_eq!(children, vec!["palm"]);

        let palm = graph.get("palm").unwrap();
        assert_eq!(palm.parent, Some(hand.id));
        assert_eq!(palm.transform.position.z, 3.0);
        assert_eq!(palm.transform.scale, common::Vec3::ONE);

        let roots: Vec<_> = graph.roots().map(|n| n.name.as_str()).collect();
        assert_eq!(roots, vec!["hand-r"]);
    }

    #[test]
    fn test_missing_node_lookup() {
        let graph = NodeGraph::from_export(export(r#"{ "nodes": [{ "name": "screen" }] }"#)).unwrap();
        let err = graph.get("hand-r").unwrap_err();
        assert!(err.is_missing_node());
        assert!(err.to_string().contains("hand-r"));
    }

    #[test]
    fn test_dangling_child_reference() {
        let err = NodeGraph::from_export(export(
            r#"{ "nodes": [{ "name": "phone", "children": ["ghost"] }] }"#,
        ))
        .unwrap_err();
        assert!(err.is_missing_node());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = NodeGraph::from_export(export(
            r#"{ "nodes": [{ "name": "a" }, { "name": "a" }] }"#,
        ))
        .unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }

    #[test]
    fn test_unknown_material_rejected() {
        let err = NodeGraph::from_export(export(
            r#"{ "nodes": [{ "name": "a", "material": "glass" }] }"#,
        ))
        .unwrap_err();
        assert!(matches!(err, SceneError::MissingMaterial(_)));
    }

    #[test]
    fn test_cycle_rejected() {
        let err = NodeGraph::from_export(export(
            r#"{ "nodes": [
                { "name": "a", "children": ["b"] },
                { "name": "b", "children": ["a"] }
            ] }"#,
        ))
        .unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }
}
