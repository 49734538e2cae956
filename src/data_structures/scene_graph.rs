//! Scene graph and hierarchical scene organization.
//!
//! Objects are assembled as owned [`SceneObject`] trees (by the room builder or
//! the model loader) and then moved into a [`Scene`], which stores them in an
//! arena addressed by [`NodeId`]. A scene owns its nodes for its entire
//! lifetime; there is no removal.
//!
//! World matrices are resolved once at insertion, as nodes never move after
//! they have been added. Mutations that matter to the GPU mirror (insertions,
//! material colour, texture image) are recorded as [`SceneChange`]s and drained
//! by the renderer once per frame.

use std::sync::Arc;

use cgmath::SquareMatrix;

use crate::data_structures::{
    geometry::Geometry,
    material::{Material, Rgb, TextureImage},
    transform::Transform,
};

/// Geometry plus the material it is drawn with.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: Material,
}

/// A node tree that has not been inserted into a scene yet.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    pub cast_shadow: bool,
    pub children: Vec<SceneObject>,
}

impl SceneObject {
    /// An empty node that only groups its children.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            mesh: None,
            cast_shadow: false,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::group(name)
        }
    }

    pub fn add_child(&mut self, child: SceneObject) {
        self.children.push(child);
    }

    /// Visits this node and all descendants, parents first.
    pub fn traverse_mut(&mut self, visit: &mut dyn FnMut(&mut SceneObject)) {
        visit(self);
        for child in self.children.iter_mut() {
            child.traverse_mut(visit);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub local: Transform,
    pub world: cgmath::Matrix4<f32>,
    pub mesh: Option<Mesh>,
    pub cast_shadow: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneChange {
    Inserted(NodeId),
    MaterialChanged(NodeId),
    TextureChanged(NodeId),
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    changes: Vec<SceneChange>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `object` (and its subtree) into the scene, under `parent` or at the
    /// root. Returns the id of the inserted subtree's root.
    pub fn add(&mut self, object: SceneObject, parent: Option<NodeId>) -> NodeId {
        let parent_world = match parent.and_then(|id| self.nodes.get(id.0)) {
            Some(node) => node.world,
            None => {
                if let Some(id) = parent {
                    log::warn!("parent node {:?} does not exist, inserting at the root", id);
                }
                cgmath::Matrix4::identity()
            }
        };
        let parent = parent.filter(|id| id.0 < self.nodes.len());
        let id = self.insert(object, parent, parent_world);
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    fn insert(
        &mut self,
        object: SceneObject,
        parent: Option<NodeId>,
        parent_world: cgmath::Matrix4<f32>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let world = parent_world * object.transform.to_matrix();
        self.nodes.push(Node {
            name: object.name,
            local: object.transform,
            world,
            mesh: object.mesh,
            cast_shadow: object.cast_shadow,
            parent,
            children: Vec::with_capacity(object.children.len()),
        });
        self.changes.push(SceneChange::Inserted(id));
        for child in object.children {
            let child_id = self.insert(child, Some(id), world);
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node with the given name, in insertion order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx), node))
    }

    /// Nodes that carry a mesh, i.e. everything that is drawn and pickable.
    pub fn meshes(&self) -> impl Iterator<Item = (NodeId, &Node, &Mesh)> {
        self.iter()
            .filter_map(|(id, node)| node.mesh.as_ref().map(|mesh| (id, node, mesh)))
    }

    /// Ids of `id` and all of its descendants, parents first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get(next.0) {
                out.push(next);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    pub fn material(&self, id: NodeId) -> Option<&Material> {
        self.node(id)
            .and_then(|node| node.mesh.as_ref())
            .map(|mesh| &mesh.material)
    }

    /// Recolours the material of a mesh node. Returns `false` if `id` has no mesh.
    pub fn set_color(&mut self, id: NodeId, color: Rgb) -> bool {
        match self.nodes.get_mut(id.0).and_then(|node| node.mesh.as_mut()) {
            Some(mesh) => {
                mesh.material.color = color;
                self.changes.push(SceneChange::MaterialChanged(id));
                true
            }
            None => false,
        }
    }

    /// Swaps the image a mesh node samples from. Returns `false` if `id` has no mesh.
    pub fn set_texture(&mut self, id: NodeId, texture: TextureImage) -> bool {
        match self.nodes.get_mut(id.0).and_then(|node| node.mesh.as_mut()) {
            Some(mesh) => {
                mesh.material.texture = texture;
                self.changes.push(SceneChange::TextureChanged(id));
                true
            }
            None => false,
        }
    }

    /// Takes every change recorded since the previous call.
    pub fn drain_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.changes)
    }
}
