// SPDX-License-Identifier: MIT OR Apache-2.0
//! The live scene forest and full-path addressing.
//!
//! Nodes reference each other across the document only by full path, the
//! `/`-joined chain of names from a root, e.g. `/Level/Door/Hinge`.

use crate::node::{Node, NodeId};
use crate::reflect::Reflect;
use crate::value::type_names;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Join a parent path and a child name
pub fn join_path(parent: &str, name: &str) -> String {
    format!("{parent}/{name}")
}

/// Lookups the codecs need from the node tree
pub trait NodeQuery {
    /// Full path of a node
    fn full_path(&self, id: NodeId) -> Option<&str>;

    /// Every node at a full path, in document order
    fn find_by_path(&self, path: &str) -> &[NodeId];

    /// Whether a node carries a component of the given type
    fn has_component(&self, id: NodeId, type_name: &str) -> bool;
}

/// Snapshot of node paths and component types over a forest
#[derive(Debug, Clone, Default)]
pub struct PathTable {
    by_id: IndexMap<NodeId, String>,
    by_path: IndexMap<String, Vec<NodeId>>,
    components: HashMap<NodeId, Vec<&'static str>>,
}

impl PathTable {
    /// Index every node of a forest
    pub fn build(roots: &[Node]) -> Self {
        let mut table = Self::default();
        for root in roots {
            table.index(root, "");
        }
        table
    }

    fn index(&mut self, node: &Node, parent: &str) {
        let path = join_path(parent, &node.name);
        self.by_path.entry(path.clone()).or_default().push(node.id);
        self.components.insert(
            node.id,
            node.components.iter().map(|c| c.type_name()).collect(),
        );
        for child in &node.children {
            self.index(child, &path);
        }
        self.by_id.insert(node.id, path);
    }

    /// Number of indexed nodes
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True when no node was indexed
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Paths shared by more than one node
    pub fn duplicate_paths(&self) -> impl Iterator<Item = &str> {
        self.by_path
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(path, _)| path.as_str())
    }
}

impl NodeQuery for PathTable {
    fn full_path(&self, id: NodeId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    fn find_by_path(&self, path: &str) -> &[NodeId] {
        self.by_path.get(path).map_or(&[][..], Vec::as_slice)
    }

    fn has_component(&self, id: NodeId, type_name: &str) -> bool {
        type_name == type_names::TRANSFORM
            || self
                .components
                .get(&id)
                .is_some_and(|types| types.iter().any(|t| *t == type_name))
    }
}

/// A forest of root nodes
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Root nodes in order
    pub roots: Vec<Node>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing roots
    pub fn from_roots(roots: Vec<Node>) -> Self {
        Self { roots }
    }

    /// Add a root node
    pub fn add_root(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.roots.push(node);
        id
    }

    /// Remove every node
    pub fn clear(&mut self) {
        self.roots.clear();
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        fn search(nodes: &[Node], id: NodeId) -> Option<&Node> {
            nodes
                .iter()
                .find_map(|n| if n.id == id { Some(n) } else { search(&n.children, id) })
        }
        search(&self.roots, id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        fn search(nodes: &mut [Node], id: NodeId) -> Option<&mut Node> {
            for node in nodes {
                if node.id == id {
                    return Some(node);
                }
                if let Some(found) = search(&mut node.children, id) {
                    return Some(found);
                }
            }
            None
        }
        search(&mut self.roots, id)
    }

    /// Remove a node and its subtree
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        fn remove(nodes: &mut Vec<Node>, id: NodeId) -> Option<Node> {
            if let Some(index) = nodes.iter().position(|n| n.id == id) {
                return Some(nodes.remove(index));
            }
            nodes.iter_mut().find_map(|n| remove(&mut n.children, id))
        }
        remove(&mut self.roots, id)
    }

    /// Full path of a node
    pub fn full_path(&self, id: NodeId) -> Option<String> {
        fn search(nodes: &[Node], id: NodeId, parent: &str) -> Option<String> {
            nodes.iter().find_map(|n| {
                let path = join_path(parent, &n.name);
                if n.id == id {
                    Some(path)
                } else {
                    search(&n.children, id, &path)
                }
            })
        }
        search(&self.roots, id, "")
    }

    /// IDs of every node at a full path
    pub fn find_by_path(&self, path: &str) -> Vec<NodeId> {
        self.path_table().find_by_path(path).to_vec()
    }

    /// Total number of nodes
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        for root in &self.roots {
            root.walk(&mut |_| count += 1);
        }
        count
    }

    /// Index the current forest
    pub fn path_table(&self) -> PathTable {
        PathTable::build(&self.roots)
    }

    /// Lock every node and component against editing
    pub fn lock_all(&mut self) {
        for root in &mut self.roots {
            root.lock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::BoxCollider;

    fn sample() -> Scene {
        let door = Node::new("Door")
            .with_child(Node::new("Hinge"))
            .with_component(BoxCollider::default());
        Scene::from_roots(vec![Node::new("Level").with_child(door), Node::new("Sky")])
    }

    #[test]
    fn test_full_paths() {
        let scene = sample();
        let hinge = scene.roots[0].children[0].children[0].id;
        assert_eq!(scene.full_path(hinge).as_deref(), Some("/Level/Door/Hinge"));

        let table = scene.path_table();
        assert_eq!(table.len(), 4);
        assert_eq!(table.full_path(hinge), Some("/Level/Door/Hinge"));
        assert_eq!(table.find_by_path("/Level/Door/Hinge"), &[hinge]);
        assert!(table.find_by_path("/Level/Window").is_empty());
    }

    #[test]
    fn test_component_query() {
        let scene = sample();
        let door = scene.roots[0].children[0].id;
        let table = scene.path_table();
        assert!(table.has_component(door, "BoxCollider"));
        assert!(table.has_component(door, "Transform"));
        assert!(!table.has_component(door, "Camera"));
    }

    #[test]
    fn test_duplicate_paths() {
        let scene = Scene::from_roots(vec![Node::new("Twin"), Node::new("Twin"), Node::new("Solo")]);
        let table = scene.path_table();
        assert_eq!(table.duplicate_paths().collect::<Vec<_>>(), vec!["/Twin"]);
        assert_eq!(scene.find_by_path("/Twin").len(), 2);
    }

    #[test]
    fn test_remove_and_lookup() {
        let mut scene = sample();
        let door = scene.roots[0].children[0].id;
        assert_eq!(scene.node_count(), 4);
        scene.node_mut(door).unwrap().name = "Gate".into();
        assert_eq!(scene.node(door).unwrap().name, "Gate");

        let removed = scene.remove_node(door).unwrap();
        assert_eq!(removed.children.len(), 1);
        assert_eq!(scene.node_count(), 2);
        assert!(scene.node(door).is_none());
    }
}
