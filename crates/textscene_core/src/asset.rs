// SPDX-License-Identifier: MIT OR Apache-2.0
//! Asset lookups the codecs depend on.
//!
//! An asset lives at a project-relative path and has a stable id. One path
//! may hold several named assets (a model file with many meshes, for
//! example); the first one is the main asset.

use crate::node::{Node, NodeKind};
use crate::value::{type_names, AssetId, AssetRef};
use indexmap::IndexMap;

/// Resolves asset references and linked documents
pub trait AssetResolver {
    /// Current path of an asset id
    fn guid_to_path(&self, id: AssetId) -> Option<String>;

    /// Id of the asset at a path
    fn path_to_guid(&self, path: &str) -> Option<AssetId>;

    /// Every asset stored at a path, main asset first
    fn assets_at_path(&self, path: &str) -> Vec<AssetRef>;

    /// Fresh copy of a template asset
    fn instantiate_prefab(&self, path: &str) -> Option<Node>;

    /// Text of a scene document asset
    fn read_scene_text(&self, path: &str) -> Option<String>;

    /// Main asset at a path if it has the requested type
    fn load_asset(&self, path: &str, type_name: &str) -> Option<AssetRef> {
        self.assets_at_path(path)
            .into_iter()
            .find(|asset| asset.type_name == type_name || type_name == "Object")
    }
}

#[derive(Debug, Clone)]
struct StoredAsset {
    id: AssetId,
    entries: Vec<AssetRef>,
    prefab: Option<Node>,
    scene_text: Option<String>,
}

/// Asset store held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    assets: IndexMap<String, StoredAsset>,
}

impl MemoryAssets {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, path: &str) -> &mut StoredAsset {
        self.assets.entry(path.to_string()).or_insert_with(|| StoredAsset {
            id: AssetId::new(),
            entries: Vec::new(),
            prefab: None,
            scene_text: None,
        })
    }

    /// Add a named asset at a path, returns the path's id
    pub fn add_asset(&mut self, path: &str, type_name: &str, name: &str) -> AssetId {
        let slot = self.slot(path);
        let id = slot.id;
        slot.entries
            .push(AssetRef::new(type_name, path, name).with_id(id));
        id
    }

    /// Store a template asset
    pub fn add_prefab(&mut self, path: &str, template: Node) -> AssetId {
        let name = template.name.clone();
        let id = self.add_asset(path, type_names::GAME_OBJECT, &name);
        self.slot(path).prefab = Some(template);
        id
    }

    /// Store a scene document asset
    pub fn add_scene(&mut self, path: &str, text: impl Into<String>) -> AssetId {
        let name = path
            .rsplit('/')
            .next()
            .and_then(|file| file.split('.').next())
            .unwrap_or(path)
            .to_string();
        let id = self.add_asset(path, type_names::TEXT_SCENE, &name);
        self.slot(path).scene_text = Some(text.into());
        id
    }

    /// Move an asset to a new path, keeping its id
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        let Some(mut stored) = self.assets.shift_remove(from) else {
            return false;
        };
        for entry in &mut stored.entries {
            entry.path = to.to_string();
        }
        self.assets.insert(to.to_string(), stored);
        true
    }
}

impl AssetResolver for MemoryAssets {
    fn guid_to_path(&self, id: AssetId) -> Option<String> {
        self.assets
            .iter()
            .find(|(_, stored)| stored.id == id)
            .map(|(path, _)| path.clone())
    }

    fn path_to_guid(&self, path: &str) -> Option<AssetId> {
        self.assets.get(path).map(|stored| stored.id)
    }

    fn assets_at_path(&self, path: &str) -> Vec<AssetRef> {
        self.assets
            .get(path)
            .map(|stored| stored.entries.clone())
            .unwrap_or_default()
    }

    fn instantiate_prefab(&self, path: &str) -> Option<Node> {
        let stored = self.assets.get(path)?;
        let mut instance = stored.prefab.as_ref()?.instantiate();
        instance.kind = NodeKind::AssetLink {
            asset_path: path.to_string(),
            asset_id: Some(stored.id),
        };
        Some(instance)
    }

    fn read_scene_text(&self, path: &str) -> Option<String> {
        self.assets.get(path)?.scene_text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_and_paths() {
        let mut assets = MemoryAssets::new();
        let id = assets.add_asset("Assets/Red.mat", "Material", "Red");
        assert_eq!(assets.path_to_guid("Assets/Red.mat"), Some(id));
        assert_eq!(assets.guid_to_path(id).as_deref(), Some("Assets/Red.mat"));

        assert!(assets.rename("Assets/Red.mat", "Assets/Materials/Red.mat"));
        assert_eq!(assets.guid_to_path(id).as_deref(), Some("Assets/Materials/Red.mat"));
        assert_eq!(assets.assets_at_path("Assets/Materials/Red.mat")[0].path, "Assets/Materials/Red.mat");
    }

    #[test]
    fn test_load_asset_checks_type() {
        let mut assets = MemoryAssets::new();
        assets.add_asset("Assets/Boat.obj", "Mesh", "Hull");
        assets.add_asset("Assets/Boat.obj", "Mesh", "Sail");

        assert_eq!(assets.load_asset("Assets/Boat.obj", "Mesh").unwrap().name, "Hull");
        assert!(assets.load_asset("Assets/Boat.obj", "Material").is_none());
        assert_eq!(assets.assets_at_path("Assets/Boat.obj").len(), 2);
    }

    #[test]
    fn test_prefab_instances_are_linked() {
        let mut assets = MemoryAssets::new();
        let id = assets.add_prefab("Assets/Crate.prefab", Node::new("Crate"));

        let a = assets.instantiate_prefab("Assets/Crate.prefab").unwrap();
        let b = assets.instantiate_prefab("Assets/Crate.prefab").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(
            a.kind,
            NodeKind::AssetLink {
                asset_path: "Assets/Crate.prefab".into(),
                asset_id: Some(id)
            }
        );
        assert!(assets.instantiate_prefab("Assets/Missing.prefab").is_none());
    }
}
