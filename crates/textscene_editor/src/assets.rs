// SPDX-License-Identifier: MIT OR Apache-2.0
//! File-backed asset database.
//!
//! Every file under the assets directory is an asset. Its id and type live in
//! a RON sidecar next to it (`Crate.prefab.meta`), created on first sight so
//! that ids survive renames and moves. Paths are project relative and always
//! use `/`.

use crate::project::ProjectSettings;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use textscene_core::node::{Node, NodeKind};
use textscene_core::value::type_names;
use textscene_core::{AssetId, AssetRef, AssetResolver, SceneDeserializer, TypeRegistry};
use thiserror::Error;

/// Errors from the asset database
#[derive(Debug, Error)]
pub enum AssetError {
    /// A file or sidecar could not be read or written
    #[error("asset I/O failed for '{path}': {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// A sidecar is not valid RON
    #[error("invalid asset metadata in '{path}': {message}")]
    Meta {
        /// Sidecar file
        path: PathBuf,
        /// Parser message
        message: String,
    },
    /// Directory traversal failed
    #[error("failed to scan assets: {0}")]
    Walk(#[from] walkdir::Error),
    /// No asset is known at a path
    #[error("no asset at '{0}'")]
    NotFound(String),
    /// A path lies outside the assets directory
    #[error("'{0}' is not inside the assets directory")]
    Outside(String),
}

/// A named asset stored inside another asset's file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAsset {
    /// Display name
    pub name: String,
    /// Asset type name
    pub type_name: String,
}

/// Sidecar contents of one asset file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMeta {
    /// Stable id
    pub guid: AssetId,
    /// Type of the main asset
    pub type_name: String,
    /// Further assets in the same file
    #[serde(default)]
    pub sub_assets: Vec<SubAsset>,
}

impl AssetMeta {
    /// Metadata with a fresh id
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            guid: AssetId::new(),
            type_name: type_name.into(),
            sub_assets: Vec::new(),
        }
    }

    fn load(path: &Path) -> Result<Self, AssetError> {
        let content = std::fs::read_to_string(path).map_err(io_error(path))?;
        ron::from_str(&content).map_err(|e| AssetError::Meta {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn save(&self, path: &Path) -> Result<(), AssetError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config).map_err(|e| AssetError::Meta {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(io_error(path))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> AssetError {
    let path = path.to_path_buf();
    move |source| AssetError::Io { path, source }
}

/// Asset type of a file extension
pub fn type_for_extension(settings: &ProjectSettings, extension: &str) -> &'static str {
    let extension = extension.to_ascii_lowercase();
    if extension == settings.scene_extension.to_ascii_lowercase() {
        return type_names::TEXT_SCENE;
    }
    if extension == settings.prefab_extension.to_ascii_lowercase() {
        return type_names::GAME_OBJECT;
    }
    match extension.as_str() {
        "mat" => type_names::MATERIAL,
        "png" | "jpg" | "jpeg" | "tga" => "Texture2D",
        "wav" | "ogg" | "mp3" => "AudioClip",
        "obj" | "fbx" => type_names::MESH,
        "physicmaterial" => "PhysicMaterial",
        "anim" => "AnimationClip",
        _ => "DefaultAsset",
    }
}

/// Asset database of one project directory
pub struct ProjectAssets {
    root: PathBuf,
    settings: ProjectSettings,
    registry: TypeRegistry,
    entries: IndexMap<String, AssetMeta>,
    instantiating: RefCell<Vec<String>>,
}

impl ProjectAssets {
    /// Open a project directory and index its assets
    pub fn open(root: impl Into<PathBuf>, settings: ProjectSettings, registry: TypeRegistry) -> Result<Self, AssetError> {
        let mut assets = Self {
            root: root.into(),
            settings,
            registry,
            entries: IndexMap::new(),
            instantiating: RefCell::new(Vec::new()),
        };
        assets.refresh()?;
        Ok(assets)
    }

    /// Project directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Settings the database was opened with
    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    /// Component types known to the project
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Indexed assets by path, in scan order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &AssetMeta)> {
        self.entries.iter().map(|(path, meta)| (path.as_str(), meta))
    }

    /// Metadata of the asset at a path
    pub fn meta(&self, path: &str) -> Option<&AssetMeta> {
        self.entries.get(path)
    }

    /// Number of indexed assets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no asset is indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File system path of a project-relative path
    pub fn absolute(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Project-relative path of a file system path inside the project
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rest = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<_> = rest
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        Some(parts.join("/"))
    }

    fn meta_path(&self, file: &Path) -> PathBuf {
        let mut name = file.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".");
        name.push(&self.settings.meta_extension);
        file.with_file_name(name)
    }

    fn is_meta(&self, file: &Path) -> bool {
        file.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.settings.meta_extension))
    }

    /// Rescan the assets directory, creating sidecars for new files.
    /// Returns the number of indexed assets.
    pub fn refresh(&mut self) -> Result<usize, AssetError> {
        let dir = self.root.join(&self.settings.assets_dir);
        self.entries.clear();
        if !dir.exists() {
            tracing::debug!("No assets directory at {}", dir.display());
            return Ok(0);
        }

        for entry in walkdir::WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() || self.is_meta(entry.path()) {
                continue;
            }
            let Some(path) = self.relative(entry.path()) else {
                continue;
            };
            match self.load_or_create_meta(entry.path()) {
                Ok(meta) => {
                    self.entries.insert(path, meta);
                }
                Err(e) => tracing::error!("Skipping asset {}: {}", path, e),
            }
        }

        tracing::info!("Indexed {} assets under {}", self.entries.len(), dir.display());
        Ok(self.entries.len())
    }

    fn load_or_create_meta(&self, file: &Path) -> Result<AssetMeta, AssetError> {
        let meta_path = self.meta_path(file);
        if meta_path.exists() {
            return AssetMeta::load(&meta_path);
        }
        let extension = file.extension().and_then(|e| e.to_str()).unwrap_or("");
        let meta = AssetMeta::new(type_for_extension(&self.settings, extension));
        meta.save(&meta_path)?;
        tracing::debug!("Created {}", meta_path.display());
        Ok(meta)
    }

    /// Index one file that was written after the last scan
    pub fn import(&mut self, path: &str) -> Result<AssetId, AssetError> {
        if !path.starts_with(&format!("{}/", self.settings.assets_dir)) {
            return Err(AssetError::Outside(path.to_string()));
        }
        let file = self.absolute(path);
        if !file.is_file() {
            return Err(AssetError::NotFound(path.to_string()));
        }
        let meta = self.load_or_create_meta(&file)?;
        let guid = meta.guid;
        self.entries.insert(path.to_string(), meta);
        Ok(guid)
    }

    /// Move an asset and its sidecar, keeping its id
    pub fn move_asset(&mut self, from: &str, to: &str) -> Result<(), AssetError> {
        if !to.starts_with(&format!("{}/", self.settings.assets_dir)) {
            return Err(AssetError::Outside(to.to_string()));
        }
        let Some(meta) = self.entries.shift_remove(from) else {
            return Err(AssetError::NotFound(from.to_string()));
        };

        let (src, dst) = (self.absolute(from), self.absolute(to));
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        std::fs::rename(&src, &dst).map_err(io_error(&src))?;
        let (src_meta, dst_meta) = (self.meta_path(&src), self.meta_path(&dst));
        std::fs::rename(&src_meta, &dst_meta).map_err(io_error(&src_meta))?;

        tracing::info!("Moved {} to {}", from, to);
        self.entries.insert(to.to_string(), meta);
        Ok(())
    }

    fn main_name(path: &str) -> &str {
        let file = path.rsplit('/').next().unwrap_or(path);
        file.split('.').next().unwrap_or(file)
    }

    fn load_template(&self, path: &str) -> Option<Node> {
        let file = self.absolute(path);
        let text = match std::fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to read template {}: {}", file.display(), e);
                return None;
            }
        };

        let mut deserializer = SceneDeserializer::new(&self.registry, self).lock_subgraphs(self.settings.lock_subgraphs);
        let loaded = match deserializer.load_str(&text, Some(path)) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!("Failed to load template {}: {}", path, e);
                return None;
            }
        };
        if loaded.roots.len() > 1 {
            tracing::warn!("Template {} has {} roots, using the first", path, loaded.roots.len());
        }
        loaded.roots.into_iter().next()
    }
}

impl AssetResolver for ProjectAssets {
    fn guid_to_path(&self, id: AssetId) -> Option<String> {
        self.entries
            .iter()
            .find(|(_, meta)| meta.guid == id)
            .map(|(path, _)| path.clone())
    }

    fn path_to_guid(&self, path: &str) -> Option<AssetId> {
        self.entries.get(path).map(|meta| meta.guid)
    }

    fn assets_at_path(&self, path: &str) -> Vec<AssetRef> {
        let Some(meta) = self.entries.get(path) else {
            return Vec::new();
        };
        let main = AssetRef::new(meta.type_name.clone(), path, Self::main_name(path)).with_id(meta.guid);
        std::iter::once(main)
            .chain(
                meta.sub_assets
                    .iter()
                    .map(|sub| AssetRef::new(sub.type_name.clone(), path, sub.name.clone()).with_id(meta.guid)),
            )
            .collect()
    }

    fn instantiate_prefab(&self, path: &str) -> Option<Node> {
        let meta = self.entries.get(path)?;
        if meta.type_name != type_names::GAME_OBJECT {
            tracing::debug!("{} is a {}, not a template", path, meta.type_name);
            return None;
        }
        if self
            .instantiating
            .borrow()
            .iter()
            .any(|p| p.eq_ignore_ascii_case(path))
        {
            tracing::warn!("Template {} contains itself", path);
            return None;
        }

        self.instantiating.borrow_mut().push(path.to_string());
        let template = self.load_template(path);
        self.instantiating.borrow_mut().pop();

        let mut instance = template?;
        instance.kind = NodeKind::AssetLink {
            asset_path: path.to_string(),
            asset_id: Some(meta.guid),
        };
        Some(instance)
    }

    fn read_scene_text(&self, path: &str) -> Option<String> {
        let meta = self.entries.get(path)?;
        if meta.type_name != type_names::TEXT_SCENE {
            return None;
        }
        let file = self.absolute(path);
        match std::fs::read_to_string(&file) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!("Failed to read {}: {}", file.display(), e);
                None
            }
        }
    }
}
