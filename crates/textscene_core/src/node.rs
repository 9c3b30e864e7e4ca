// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene nodes: identity, placement, kind, children and components.

use crate::components::HideFlags;
use crate::reflect::{Component, ComponentBase, Reflect, ReflectValue};
use crate::value::AssetId;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique runtime identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Local placement relative to the parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position
    pub position: Vec3,
    /// Rotation
    pub rotation: Quat,
    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity placement at a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Where a node's content comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// Content is stored inline
    #[default]
    Plain,
    /// Instance of a reusable asset template
    AssetLink {
        /// Template asset path
        asset_path: String,
        /// Template asset id
        asset_id: Option<AssetId>,
    },
    /// Subtree loaded from another document
    SubgraphLink {
        /// Document asset path
        asset_path: String,
        /// Document asset id
        asset_id: Option<AssetId>,
    },
}

impl NodeKind {
    /// Asset path of a linked node
    pub fn asset_path(&self) -> Option<&str> {
        match self {
            Self::Plain => None,
            Self::AssetLink { asset_path, .. } | Self::SubgraphLink { asset_path, .. } => {
                Some(asset_path)
            }
        }
    }
}

/// A positioned entity in the scene graph
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Display name, unique among siblings by convention
    pub name: String,
    /// Category tag
    pub tag: String,
    /// Layer index
    pub layer: i32,
    /// Local placement
    pub transform: Transform,
    /// Content source
    pub kind: NodeKind,
    /// Editor visibility and locking
    pub hide_flags: HideFlags,
    /// Owned children in order
    pub children: Vec<Node>,
    /// Owned components in order
    pub components: Vec<Box<dyn Component>>,
}

impl Node {
    /// Default tag of new nodes
    pub const DEFAULT_TAG: &'static str = "Untagged";

    /// Create an empty plain node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            tag: Self::DEFAULT_TAG.to_string(),
            layer: 0,
            transform: Transform::default(),
            kind: NodeKind::Plain,
            hide_flags: HideFlags::None,
            children: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Set the local position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Set the content source
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Append a child
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Append a component
    pub fn with_component(mut self, component: impl Component) -> Self {
        self.components.push(Box::new(component));
        self
    }

    /// First component of a concrete type
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<T>())
    }

    /// First component of a concrete type, mutably
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// First component with a type name
    pub fn component_by_name(&self, type_name: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.type_name() == type_name)
            .map(|c| &**c)
    }

    /// Visit this node and every descendant, parents first
    pub fn walk(&self, visit: &mut impl FnMut(&Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Mutably visit this node and every descendant, parents first
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Node)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Mark this subtree and its components as not editable
    pub fn lock(&mut self) {
        self.walk_mut(&mut |node| {
            node.hide_flags = HideFlags::NotEditable;
            for component in &mut node.components {
                if let Some(value) = HideFlags::NotEditable.to_value() {
                    if let Err(e) = component.set("hideFlags", value) {
                        tracing::debug!("Cannot lock {} on '{}': {}", component.type_name(), node.name, e);
                    }
                }
            }
        });
    }

    /// Deep copy with fresh node IDs
    pub fn instantiate(&self) -> Node {
        let mut copy = self.clone();
        copy.walk_mut(&mut |node| node.id = NodeId::new());
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BoxCollider, Light};

    #[test]
    fn test_new_node_defaults() {
        let node = Node::new("Root");
        assert_eq!(node.tag, "Untagged");
        assert_eq!(node.layer, 0);
        assert_eq!(node.transform, Transform::default());
        assert_eq!(node.kind, NodeKind::Plain);
    }

    #[test]
    fn test_component_lookup() {
        let node = Node::new("Lamp")
            .with_component(Light::default())
            .with_component(BoxCollider::default());

        assert!(node.component::<Light>().is_some());
        assert_eq!(node.component_by_name("BoxCollider").unwrap().type_name(), "BoxCollider");
        assert!(node.component_by_name("Camera").is_none());
    }

    #[test]
    fn test_lock_marks_subtree() {
        let mut node = Node::new("Root")
            .with_child(Node::new("Child").with_component(BoxCollider::default()));
        node.lock();

        assert_eq!(node.hide_flags, HideFlags::NotEditable);
        let child = &node.children[0];
        assert_eq!(child.hide_flags, HideFlags::NotEditable);
        assert_eq!(
            child.components[0].get("hideFlags"),
            HideFlags::NotEditable.to_value()
        );
    }

    #[test]
    fn test_instantiate_fresh_ids() {
        let template = Node::new("Crate").with_child(Node::new("Lid"));
        let instance = template.instantiate();
        assert_ne!(instance.id, template.id);
        assert_ne!(instance.children[0].id, template.children[0].id);
        assert_eq!(instance.children[0].name, "Lid");
    }
}
