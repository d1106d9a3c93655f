//! Scene group hierarchy.

use assets::{GeometryRef, MaterialId, NodeId};
use common::Transform3D;
use glam::Mat4;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Unique identifier for a group.
    pub struct GroupId;
}

/// What a group draws besides its children.
#[derive(Clone, Debug, PartialEq)]
pub enum GroupContent {
    /// Transform only.
    Empty,
    /// Copies of asset graph nodes, each keeping its own transform.
    Clone(SmallVec<[NodeId; 4]>),
    /// A mesh built from asset geometry.
    Mesh {
        geometry: GeometryRef,
        material: MaterialId,
    },
    /// Geometry that only writes a stencil mask.
    Mask { mask_id: u32, geometry: GeometryRef },
}

/// A node in the scene tree.
#[derive(Clone, Debug)]
pub struct Group {
    /// Group ID.
    pub id: GroupId,
    /// Debug name.
    pub name: String,
    /// Parent group.
    pub parent: Option<GroupId>,
    /// Child groups.
    pub children: SmallVec<[GroupId; 4]>,
    /// Transform relative to parent.
    pub transform: Transform3D,
    pub content: GroupContent,
    pub visible: bool,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: SmallVec::new(),
            transform: Transform3D::identity(),
            content: GroupContent::Empty,
            visible: true,
        }
    }
}

/// Group tree.
pub struct SceneTree {
    groups: SlotMap<GroupId, Group>,
    root: Option<GroupId>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self {
            groups: SlotMap::with_key(),
            root: None,
        }
    }

    /// Create a detached group.
    pub fn create_group(&mut self, name: impl Into<String>, transform: Transform3D) -> GroupId {
        let name = name.into();
        self.groups.insert_with_key(|id| Group {
            transform,
            ..Group::new(id, name)
        })
    }

    /// Create a group with content.
    pub fn create_with_content(
        &mut self,
        name: impl Into<String>,
        transform: Transform3D,
        content: GroupContent,
    ) -> GroupId {
        let id = self.create_group(name, transform);
        if let Some(group) = self.groups.get_mut(id) {
            group.content = content;
        }
        id
    }

    pub fn root(&self) -> Option<GroupId> {
        self.root
    }

    pub fn set_root(&mut self, id: GroupId) {
        self.root = Some(id);
    }

    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id)
    }

    /// Append a child group.
    pub fn append_child(&mut self, parent_id: GroupId, child_id: GroupId) {
        if let Some(child) = self.groups.get_mut(child_id) {
            child.parent = Some(parent_id);
        }
        if let Some(parent) = self.groups.get_mut(parent_id) {
            parent.children.push(child_id);
        }
    }

    /// Replace a group's local transform.
    pub fn set_transform(&mut self, id: GroupId, transform: Transform3D) {
        if let Some(group) = self.groups.get_mut(id) {
            group.transform = transform;
        }
    }

    /// Accumulated transform from the root down to `id`.
    pub fn world_matrix(&self, id: GroupId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.groups.get(id);

        while let Some(group) = current {
            matrix = group.transform.matrix() * matrix;
            current = group.parent.and_then(|parent| self.groups.get(parent));
        }

        matrix
    }

    /// Groups in draw order: parents before children, siblings in order.
    pub fn draw_order(&self) -> Vec<GroupId> {
        let mut result = Vec::new();
        let mut stack: Vec<GroupId> = self.root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let Some(group) = self.groups.get(id) else {
                continue;
            };
            if !group.visible {
                continue;
            }
            result.push(id);
            stack.extend(group.children.iter().rev().copied());
        }

        result
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups.iter()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.root = None;
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_scene_tree() {
        let mut tree = SceneTree::new();

        let root = tree.create_group("root", Transform3D::identity());
        tree.set_root(root);

        let child1 = tree.create_group("a", Transform3D::identity());
        let child2 = tree.create_group("b", Transform3D::identity());

        tree.append_child(root, child1);
        tree.append_child(root, child2);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get(root).unwrap().children.len(), 2);
        assert_eq!(tree.draw_order(), vec![root, child1, child2]);
    }

    #[test]
    fn test_world_matrix_accumulates() {
        let mut tree = SceneTree::new();
        let root = tree.create_group("root", Transform3D::from_position(Vec3::new(0.0, -50.0, 0.0)));
        let inner = tree.create_group("inner", Transform3D::from_position(Vec3::new(10.0, 0.0, 0.0)));
        tree.set_root(root);
        tree.append_child(root, inner);

        let origin = tree.world_matrix(inner).transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(10.0, -50.0, 0.0), 1e-5));
    }

    #[test]
    fn test_rotation_applies_to_children() {
        let mut tree = SceneTree::new();
        let root = tree.create_group(
            "root",
            Transform3D::identity().with_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0)),
        );
        let child = tree.create_group("child", Transform3D::from_position(Vec3::new(0.0, 0.0, 10.0)));
        tree.append_child(root, child);

        let origin = tree.world_matrix(child).transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn test_hidden_groups_skip_subtree() {
        let mut tree = SceneTree::new();
        let root = tree.create_group("root", Transform3D::identity());
        let hidden = tree.create_group("hidden", Transform3D::identity());
        let leaf = tree.create_group("leaf", Transform3D::identity());
        tree.set_root(root);
        tree.append_child(root, hidden);
        tree.append_child(hidden, leaf);
        tree.get_mut(hidden).unwrap().visible = false;

        assert_eq!(tree.draw_order(), vec![root]);
    }
}
