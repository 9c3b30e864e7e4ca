// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text to scene.
//!
//! A load parses the document into [`NodeDecl`]s and then sweeps that tree
//! twice:
//! - [`Pass::CreateObjects`] creates node and component shells, instantiates
//!   templates and expands linked documents, annotating each declaration
//! - [`Pass::ValueAssignment`] finds every shell through its annotation and
//!   assigns names, placements and member values, resolving scene links
//!   against the finished forest
//!
//! Linked documents are loaded by the same deserializer, so the stack of
//! documents being loaded catches a document that includes itself.

use crate::asset::AssetResolver;
use crate::builtin::{BuiltinTable, PrimitiveFactory, StandardPrimitives};
use crate::component_codec::apply_component;
use crate::error::{LoadError, Warning, WarningLog};
use crate::node::{Node, NodeId, NodeKind};
use crate::node_codec::{parse_document, DeclKind, NodeDecl};
use crate::reflect::TypeRegistry;
use crate::scene::{join_path, NodeQuery, PathTable, Scene};
use crate::value::AssetId;
use crate::value_codec::{DecodeContext, Pass};
use std::path::Path;

/// Result of a successful load
#[derive(Debug, Clone, Default)]
pub struct LoadedScene {
    /// Loaded root nodes in document order
    pub roots: Vec<Node>,
    /// Recoverable problems met on the way
    pub warnings: Vec<Warning>,
}

impl LoadedScene {
    /// Turn the roots into a scene
    pub fn into_scene(self) -> Scene {
        Scene::from_roots(self.roots)
    }
}

/// Loads documents into node forests
pub struct SceneDeserializer<'a> {
    registry: &'a TypeRegistry,
    assets: &'a dyn AssetResolver,
    builtins: BuiltinTable,
    loading: Vec<String>,
    lock_subgraphs: bool,
}

impl<'a> SceneDeserializer<'a> {
    /// Create a deserializer using the standard primitives for builtin names
    pub fn new(registry: &'a TypeRegistry, assets: &'a dyn AssetResolver) -> Self {
        Self::with_factory(registry, assets, &StandardPrimitives)
    }

    /// Create a deserializer reading builtin names off a primitive factory
    pub fn with_factory(
        registry: &'a TypeRegistry,
        assets: &'a dyn AssetResolver,
        factory: &dyn PrimitiveFactory,
    ) -> Self {
        Self {
            registry,
            assets,
            builtins: BuiltinTable::from_factory(factory),
            loading: Vec::new(),
            lock_subgraphs: true,
        }
    }

    /// Whether content of linked documents is marked not editable
    pub fn lock_subgraphs(mut self, lock: bool) -> Self {
        self.lock_subgraphs = lock;
        self
    }

    /// Treat a document as already being loaded, so that linked documents
    /// including it are skipped
    pub fn inside(mut self, document: impl Into<String>) -> Self {
        self.loading.push(document.into());
        self
    }

    /// Load a document, `source` names it for self-inclusion checks
    pub fn load_str(&mut self, text: &str, source: Option<&str>) -> Result<LoadedScene, LoadError> {
        let mut decls = parse_document(text)?;

        if let Some(source) = source {
            self.loading.push(source.to_string());
        }
        let (roots, warnings) = self.build(&mut decls);
        if source.is_some() {
            self.loading.pop();
        }

        let name = source.unwrap_or("<text>");
        warnings.summarize(&format!("Load of {name}"));
        tracing::info!("Loaded {} ({} roots, {} warnings)", name, roots.len(), warnings.len());
        Ok(LoadedScene {
            roots,
            warnings: warnings.into_vec(),
        })
    }

    /// Read and load a document file
    pub fn load_file(&mut self, path: &Path) -> Result<LoadedScene, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            tracing::error!("Failed to read {}: {}", path.display(), source);
            LoadError::Io {
                path: path.display().to_string(),
                source,
            }
        })?;
        self.load_str(&text, Some(&path.to_string_lossy()))
    }

    /// Load the document a linked node points at into its children.
    /// `parent_path` is the full path the node sits under, empty for a root.
    pub fn expand_subgraph(&mut self, node: &mut Node, parent_path: &str) -> Vec<Warning> {
        let mut warnings = WarningLog::new();
        let location = join_path(parent_path, &node.name);
        let NodeKind::SubgraphLink { asset_path, asset_id } = node.kind.clone() else {
            warnings.push(location, "not a linked document");
            return warnings.into_vec();
        };
        if let Some(children) = self.load_subgraph(&asset_path, asset_id, &location, &mut warnings) {
            node.children = children;
        }
        warnings.summarize(&format!("Expansion of {asset_path}"));
        warnings.into_vec()
    }

    fn build(&mut self, decls: &mut [NodeDecl]) -> (Vec<Node>, WarningLog) {
        let mut warnings = WarningLog::new();
        let mut roots: Vec<Node> = decls
            .iter_mut()
            .map(|decl| self.create(decl, "", &mut warnings))
            .collect();

        let table = PathTable::build(&roots);
        let mut ctx = DecodeContext {
            pass: Pass::ValueAssignment,
            nodes: &table,
            assets: self.assets,
            builtins: &self.builtins,
            registry: self.registry,
            warnings: &mut warnings,
            location: String::new(),
        };
        for decl in decls.iter() {
            assign(decl, &mut roots, &mut ctx);
        }
        (roots, warnings)
    }

    fn resolve_path(&self, asset_path: &str, asset_id: Option<AssetId>) -> String {
        asset_id
            .and_then(|id| self.assets.guid_to_path(id))
            .unwrap_or_else(|| asset_path.to_string())
    }

    fn create(&mut self, decl: &mut NodeDecl, parent: &str, warnings: &mut WarningLog) -> Node {
        let path = join_path(parent, &decl.name);
        let node = match &mut decl.kind {
            DeclKind::Plain {
                children,
                components,
                ..
            } => {
                let mut node = Node::new(decl.name.clone());
                for component in components.iter_mut() {
                    let type_name = &component.record.type_name;
                    match self.registry.create(type_name) {
                        Some(shell) => {
                            component.slot = Some(node.components.len());
                            node.components.push(shell);
                        }
                        None => warnings.push(path.as_str(), format!("unknown component type '{type_name}'")),
                    }
                }
                for child in children.iter_mut() {
                    let child = self.create(child, &path, warnings);
                    node.children.push(child);
                }
                node
            }
            DeclKind::AssetLink { asset_path, asset_id } => {
                let resolved = self.resolve_path(asset_path, *asset_id);
                let link = NodeKind::AssetLink {
                    asset_id: asset_id.or_else(|| self.assets.path_to_guid(&resolved)),
                    asset_path: resolved,
                };
                let instance = link.asset_path().and_then(|p| self.assets.instantiate_prefab(p));
                match instance {
                    Some(mut instance) => {
                        instance.name.clone_from(&decl.name);
                        instance.with_kind(link)
                    }
                    None => {
                        warnings.push(
                            path.as_str(),
                            format!("template '{asset_path}' not found, keeping an empty placeholder"),
                        );
                        Node::new(decl.name.clone()).with_kind(link)
                    }
                }
            }
            DeclKind::SubgraphLink { asset_path, asset_id } => {
                let resolved = self.resolve_path(asset_path, *asset_id);
                let mut node = Node::new(decl.name.clone()).with_kind(NodeKind::SubgraphLink {
                    asset_id: asset_id.or_else(|| self.assets.path_to_guid(&resolved)),
                    asset_path: resolved.clone(),
                });
                if let Some(children) = self.load_subgraph(&resolved, None, &path, warnings) {
                    node.children = children;
                }
                node
            }
        };
        decl.shell = Some(node.id);
        node
    }

    fn load_subgraph(
        &mut self,
        asset_path: &str,
        asset_id: Option<AssetId>,
        location: &str,
        warnings: &mut WarningLog,
    ) -> Option<Vec<Node>> {
        let resolved = self.resolve_path(asset_path, asset_id);
        if self.loading.iter().any(|p| p.eq_ignore_ascii_case(&resolved)) {
            warnings.push(location, format!("'{resolved}' includes itself, branch skipped"));
            return None;
        }
        let Some(text) = self.assets.read_scene_text(&resolved) else {
            warnings.push(location, format!("document '{resolved}' not found, keeping an empty placeholder"));
            return None;
        };

        let mut decls = match parse_document(&text) {
            Ok(decls) => decls,
            Err(e) => {
                warnings.push(location, format!("failed to load '{resolved}': {e}"));
                return None;
            }
        };
        self.loading.push(resolved);
        let (mut roots, nested) = self.build(&mut decls);
        self.loading.pop();

        warnings.extend_prefixed(location, nested.into_vec());
        if self.lock_subgraphs {
            for root in &mut roots {
                root.lock();
            }
        }
        Some(roots)
    }
}

fn find_node_mut(nodes: &mut [Node], id: NodeId) -> Option<&mut Node> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn assign(decl: &NodeDecl, roots: &mut [Node], ctx: &mut DecodeContext<'_>) {
    let Some(id) = decl.shell else {
        return;
    };
    let Some(node) = find_node_mut(roots, id) else {
        tracing::debug!("Shell for '{}' (line {}) is gone", decl.name, decl.line);
        return;
    };
    node.name.clone_from(&decl.name);
    node.transform = decl.transform;

    let DeclKind::Plain {
        tag,
        layer,
        children,
        components,
    } = &decl.kind
    else {
        return;
    };
    node.tag.clone_from(tag);
    node.layer = *layer;

    ctx.location = ctx.nodes.full_path(id).unwrap_or_default().to_string();
    for component in components {
        let Some(shell) = component.slot.and_then(|slot| node.components.get_mut(slot)) else {
            continue;
        };
        apply_component(&component.record, &mut **shell, ctx);
    }

    for child in children {
        assign(child, roots, ctx);
    }
}
