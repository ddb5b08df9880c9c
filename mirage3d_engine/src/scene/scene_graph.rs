/// SceneGraph - a transform hierarchy of nodes under a single root.
///
/// Nodes live in a SlotMap for O(1) insert/remove with stable keys.
/// A node's world transform is the product of its ancestors' local
/// transforms and its own.

use std::sync::Arc;
use glam::Mat4;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use super::{Material, Mesh};

new_key_type! {
    /// Stable key for a node within a SceneGraph.
    ///
    /// Keys remain valid even after other nodes are removed.
    pub struct NodeKey;
}

/// A node of the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Transform relative to the parent node
    pub transform: Mat4,
    pub mesh: Option<Arc<Mesh>>,
    /// Texture input of the mesh, vertex colors only when unset
    pub material: Option<Material>,
    /// Hidden nodes hide their whole subtree
    pub visible: bool,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            mesh: None,
            material: None,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: Arc<Mesh>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}

/// A mesh node resolved for drawing
#[derive(Debug, Clone)]
pub struct Drawable {
    pub key: NodeKey,
    pub mesh: Arc<Mesh>,
    pub material: Option<Material>,
    pub world: Mat4,
}

/// Scene graph with a single root node
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
    root: NodeKey,
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new("root"));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root is left
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Insert `node` as the last child of `parent`
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if `parent` is not in the graph.
    pub fn add_node(&mut self, parent: NodeKey, mut node: SceneNode) -> Result<NodeKey> {
        if !self.nodes.contains_key(parent) {
            return Err(Error::InvalidResource(format!("parent node {:?} not in scene graph", parent)));
        }
        node.parent = Some(parent);
        node.children.clear();
        let key = self.nodes.insert(node);
        self.nodes[parent].children.push(key);
        Ok(key)
    }

    /// Remove a node and its whole subtree
    ///
    /// Returns false if the key is invalid or is the root.
    pub fn remove_node(&mut self, key: NodeKey) -> bool {
        if key == self.root || !self.nodes.contains_key(key) {
            return false;
        }
        if let Some(parent) = self.nodes[key].parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|child| *child != key);
            }
        }
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
        }
        true
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    /// Set a node's local transform. Returns false if the key is invalid.
    pub fn set_transform(&mut self, key: NodeKey, transform: Mat4) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.transform = transform;
                true
            }
            None => false,
        }
    }

    /// World transform of a node (ancestors applied first)
    pub fn world_transform(&self, key: NodeKey) -> Option<Mat4> {
        let mut node = self.nodes.get(key)?;
        let mut world = node.transform;
        while let Some(parent) = node.parent {
            node = self.nodes.get(parent)?;
            world = node.transform * world;
        }
        Some(world)
    }

    /// Visible mesh nodes with their world transforms
    ///
    /// Parents come before their children, siblings in insertion order.
    /// A hidden node hides its subtree.
    pub fn drawables(&self) -> Vec<Drawable> {
        let mut drawables = Vec::new();
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((key, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform;
            if let Some(mesh) = &node.mesh {
                if !mesh.is_empty() {
                    drawables.push(Drawable {
                        key,
                        mesh: mesh.clone(),
                        material: node.material.clone(),
                        world,
                    });
                }
            }
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        drawables
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "scene_graph_tests.rs"]
mod tests;
