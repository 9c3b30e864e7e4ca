// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor session: the open scene and the project it belongs to.
//!
//! The session owns the live scene, the asset database and the path of the
//! scene document being edited. Every scene operation of the host goes
//! through it, including the stages of a staged save and reload.

use crate::assets::{AssetError, ProjectAssets};
use crate::project::{ProjectError, ProjectSettings};
use crate::staging::{StagingError, StagingHost};
use std::path::Path;
use textscene_core::node::{Node, NodeId, NodeKind};
use textscene_core::scene::join_path;
use textscene_core::{
    serialize_lenient, AssetResolver, LoadError, LoadedScene, Scene, SceneDeserializer, SerializeError, TypeRegistry,
    Warning,
};
use thiserror::Error;

/// Errors from session operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// Project settings could not be loaded
    #[error(transparent)]
    Project(#[from] ProjectError),
    /// Asset database failure
    #[error(transparent)]
    Assets(#[from] AssetError),
    /// A scene could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),
    /// A scene could not be saved
    #[error(transparent)]
    Save(#[from] SerializeError),
    /// The operation needs a scene document but the scene was never saved
    #[error("the open scene has no document path")]
    NoCurrentScene,
    /// The path is not a scene document of this project
    #[error("'{0}' is not a scene document")]
    NotAScene(String),
    /// A scene cannot be loaded into itself
    #[error("'{0}' is the open scene and cannot be loaded into itself")]
    Circular(String),
    /// More than one node has the parent's path
    #[error("parent path '{0}' is ambiguous")]
    AmbiguousParent(String),
    /// No node with that ID in the open scene
    #[error("node {0:?} is not in the open scene")]
    NodeNotFound(NodeId),
}

/// The open scene of one project
pub struct EditorSession {
    assets: ProjectAssets,
    scene: Scene,
    current_scene: Option<String>,
}

impl EditorSession {
    /// Open a project directory with the built-in component types
    pub fn open(root: &Path) -> Result<Self, SessionError> {
        let settings = ProjectSettings::load_or_default(root)?;
        Self::with_registry(root, settings, TypeRegistry::with_builtins())
    }

    /// Open a project directory with explicit settings and component types
    pub fn with_registry(root: &Path, settings: ProjectSettings, registry: TypeRegistry) -> Result<Self, SessionError> {
        let assets = ProjectAssets::open(root, settings, registry)?;
        tracing::info!("Opened project '{}' at {}", assets.settings().name, root.display());
        Ok(Self {
            assets,
            scene: Scene::new(),
            current_scene: None,
        })
    }

    /// Project settings
    pub fn settings(&self) -> &ProjectSettings {
        self.assets.settings()
    }

    /// Asset database
    pub fn assets(&self) -> &ProjectAssets {
        &self.assets
    }

    /// Asset database, mutably
    pub fn assets_mut(&mut self) -> &mut ProjectAssets {
        &mut self.assets
    }

    /// The live scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The live scene, mutably
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Path of the open scene document
    pub fn current_scene(&self) -> Option<&str> {
        self.current_scene.as_deref()
    }

    fn deserializer(&self) -> SceneDeserializer<'_> {
        SceneDeserializer::new(self.assets.registry(), &self.assets)
            .lock_subgraphs(self.assets.settings().lock_subgraphs)
    }

    fn read_document(&self, path: &str) -> Result<LoadedScene, LoadError> {
        let file = self.assets.absolute(path);
        let text = std::fs::read_to_string(&file).map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })?;
        self.deserializer().load_str(&text, Some(path))
    }

    /// Replace the open scene with an empty, unsaved one
    pub fn new_scene(&mut self) {
        self.scene.clear();
        self.current_scene = None;
        tracing::info!("New scene");
    }

    /// Load a scene document as the open scene
    pub fn load(&mut self, path: &str) -> Result<Vec<Warning>, SessionError> {
        if !self.settings().is_scene_path(path) {
            return Err(SessionError::NotAScene(path.to_string()));
        }
        let loaded = self.read_document(path)?;
        self.scene = Scene::from_roots(loaded.roots);
        self.current_scene = Some(path.to_string());
        Ok(loaded.warnings)
    }

    /// Save the open scene to its document
    pub fn save_current(&mut self) -> Result<(), SessionError> {
        let path = self.current_scene.clone().ok_or(SessionError::NoCurrentScene)?;
        self.save_as(&path)
    }

    /// Save the open scene to a new document and make it the current one
    pub fn save_as(&mut self, path: &str) -> Result<(), SessionError> {
        if !self.settings().is_scene_path(path) {
            return Err(SessionError::NotAScene(path.to_string()));
        }
        let file = self.assets.absolute(path);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).map_err(SerializeError::Io)?;
        }
        textscene_core::save(&self.scene, &self.assets, &file)?;

        if self.assets.path_to_guid(path).is_none() {
            self.assets.import(path)?;
        }
        self.current_scene = Some(path.to_string());
        Ok(())
    }

    /// Load another scene document under a parent node, or as a new root.
    ///
    /// The document lands in a linked node named after the file, at the
    /// parent's origin. The name gets a number appended when another node
    /// already has the resulting path.
    pub fn load_additive(&mut self, path: &str, parent: Option<NodeId>) -> Result<(NodeId, Vec<Warning>), SessionError> {
        if self
            .current_scene
            .as_deref()
            .is_some_and(|current| current.eq_ignore_ascii_case(path))
        {
            return Err(SessionError::Circular(path.to_string()));
        }
        if !self.settings().is_scene_path(path) {
            return Err(SessionError::NotAScene(path.to_string()));
        }
        let Some(asset_id) = self.assets.path_to_guid(path) else {
            return Err(AssetError::NotFound(path.to_string()).into());
        };

        let parent_path = match parent {
            Some(id) => {
                let full = self.scene.full_path(id).ok_or(SessionError::NodeNotFound(id))?;
                if self.scene.find_by_path(&full).len() > 1 {
                    return Err(SessionError::AmbiguousParent(full));
                }
                full
            }
            None => String::new(),
        };

        let stem = path
            .rsplit('/')
            .next()
            .and_then(|file| file.split('.').next())
            .unwrap_or(path);
        let mut name = stem.to_string();
        let mut suffix = 0;
        while !self.scene.find_by_path(&join_path(&parent_path, &name)).is_empty() {
            suffix += 1;
            name = format!("{stem}{suffix}");
        }
        let spawn_path = join_path(&parent_path, &name);

        let mut node = Node::new(name).with_kind(NodeKind::SubgraphLink {
            asset_path: path.to_string(),
            asset_id: Some(asset_id),
        });
        let mut deserializer = self.deserializer();
        if let Some(current) = &self.current_scene {
            deserializer = deserializer.inside(current.clone());
        }
        let warnings = deserializer.expand_subgraph(&mut node, &parent_path);

        let id = node.id;
        match parent {
            Some(parent) => self
                .scene
                .node_mut(parent)
                .ok_or(SessionError::NodeNotFound(parent))?
                .children
                .push(node),
            None => {
                self.scene.add_root(node);
            }
        }
        tracing::info!("Loaded {} additively as {}", path, spawn_path);
        Ok((id, warnings))
    }

    /// Mark a node's subtree as not editable
    pub fn lock_node(&mut self, id: NodeId) -> Result<(), SessionError> {
        self.scene.node_mut(id).ok_or(SessionError::NodeNotFound(id))?.lock();
        Ok(())
    }

    /// Project-relative path of the open scene's staging copy
    pub fn temp_path(&self) -> Option<String> {
        self.current_scene
            .as_deref()
            .map(|path| self.settings().temp_path_for(path))
    }

    /// Text of the open scene, with every warning raised while encoding it
    pub fn scene_text(&self) -> (String, Vec<Warning>) {
        serialize_lenient(&self.scene, &self.assets)
    }
}

impl StagingHost for EditorSession {
    fn save_temp(&mut self) -> Result<(), StagingError> {
        let temp = self
            .temp_path()
            .ok_or_else(|| StagingError::Fatal(SessionError::NoCurrentScene.to_string()))?;
        let file = self.assets.absolute(&temp);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StagingError::from_io(&temp, &e))?;
        }
        match textscene_core::save(&self.scene, &self.assets, &file) {
            Ok(()) => Ok(()),
            Err(SerializeError::Io(e)) => Err(StagingError::from_io(&temp, &e)),
            Err(e) => Err(StagingError::Fatal(e.to_string())),
        }
    }

    fn create_new(&mut self) -> Result<(), StagingError> {
        self.scene.clear();
        Ok(())
    }

    fn load_temp(&mut self) -> Result<(), StagingError> {
        let (Some(current), Some(temp)) = (self.current_scene.clone(), self.temp_path()) else {
            return Err(StagingError::Fatal(SessionError::NoCurrentScene.to_string()));
        };
        let file = self.assets.absolute(&temp);
        let text = std::fs::read_to_string(&file).map_err(|e| StagingError::from_io(&temp, &e))?;
        let loaded = self
            .deserializer()
            .load_str(&text, Some(&current))
            .map_err(|e| StagingError::Fatal(e.to_string()))?;
        for warning in &loaded.warnings {
            tracing::warn!("{}", warning);
        }
        self.scene = loaded.into_scene();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::{SaveReload, StepResult};
    use glam::Vec3;
    use std::fs;
    use textscene_core::components::BoxCollider;

    const ROOM: &str = "gameobject Chair
tag Untagged layer 0
0.00000 0.00000 0.00000
0.00000 0.00000 0.00000 1.00000
1.00000 1.00000 1.00000
children 0
components 0

";

    fn project() -> (tempfile::TempDir, EditorSession) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Assets/Rooms")).unwrap();
        fs::write(dir.path().join("Assets/Rooms/Room.txt"), ROOM).unwrap();
        let session = EditorSession::open(dir.path()).unwrap();
        (dir, session)
    }

    fn populate(session: &mut EditorSession) {
        session.scene_mut().add_root(
            Node::new("Box")
                .with_position(Vec3::new(1.0, 2.0, 3.0))
                .with_component(BoxCollider::default()),
        );
    }

    #[test]
    fn test_save_and_load() {
        let (dir, mut session) = project();
        populate(&mut session);
        assert!(matches!(session.save_current(), Err(SessionError::NoCurrentScene)));

        session.save_as("Assets/Main.txt").unwrap();
        assert_eq!(session.current_scene(), Some("Assets/Main.txt"));
        assert!(session.assets().path_to_guid("Assets/Main.txt").is_some());
        let saved = fs::read_to_string(dir.path().join("Assets/Main.txt")).unwrap();

        session.new_scene();
        assert_eq!(session.scene().node_count(), 0);
        assert_eq!(session.current_scene(), None);

        let warnings = session.load("Assets/Main.txt").unwrap();
        assert!(warnings.is_empty());
        assert_eq!(session.scene_text().0, saved);
        assert!(matches!(session.load("Assets/Main.prefab"), Err(SessionError::NotAScene(_))));
    }

    #[test]
    fn test_load_additive_names_unique() {
        let (_dir, mut session) = project();
        populate(&mut session);
        let parent = session.scene().roots[0].id;

        let (first, warnings) = session.load_additive("Assets/Rooms/Room.txt", Some(parent)).unwrap();
        assert!(warnings.is_empty());
        let (second, _) = session.load_additive("Assets/Rooms/Room.txt", Some(parent)).unwrap();

        assert_eq!(session.scene().full_path(first).as_deref(), Some("/Box/Room"));
        assert_eq!(session.scene().full_path(second).as_deref(), Some("/Box/Room1"));
        let room = session.scene().node(first).unwrap();
        assert_eq!(room.children[0].name, "Chair");
        assert_eq!(room.transform, Default::default());
    }

    #[test]
    fn test_load_additive_warnings_use_spawn_path() {
        let (dir, mut session) = project();
        let broken = "gameobject Thing\ntag Untagged layer 0\n0 0 0\n0 0 0 1\n1 1 1\nchildren 0\ncomponents 1\n  Teleporter 0\n\n";
        fs::write(dir.path().join("Assets/Rooms/Broken.txt"), broken).unwrap();
        session.assets_mut().import("Assets/Rooms/Broken.txt").unwrap();
        populate(&mut session);
        let parent = session.scene().roots[0].id;

        let (_, warnings) = session.load_additive("Assets/Rooms/Broken.txt", Some(parent)).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].location.starts_with("/Box/Broken"));
    }

    #[test]
    fn test_load_additive_refusals() {
        let (_dir, mut session) = project();
        session.load("Assets/Rooms/Room.txt").unwrap();
        assert!(matches!(
            session.load_additive("assets/rooms/room.TXT", None),
            Err(SessionError::Circular(_))
        ));

        session.new_scene();
        session.scene_mut().add_root(Node::new("Twin"));
        session.scene_mut().add_root(Node::new("Twin"));
        let twin = session.scene().roots[0].id;
        assert!(matches!(
            session.load_additive("Assets/Rooms/Room.txt", Some(twin)),
            Err(SessionError::AmbiguousParent(_))
        ));
        assert!(matches!(
            session.load_additive("Assets/Rooms/Missing.txt", None),
            Err(SessionError::Assets(AssetError::NotFound(_)))
        ));
    }

    #[test]
    fn test_lock_node() {
        let (_dir, mut session) = project();
        populate(&mut session);
        let id = session.scene().roots[0].id;
        session.lock_node(id).unwrap();
        let node = session.scene().node(id).unwrap();
        let collider = node.component::<BoxCollider>().unwrap();
        assert_eq!(collider.hide_flags, textscene_core::components::HideFlags::NotEditable);
        assert!(matches!(session.lock_node(NodeId::new()), Err(SessionError::NodeNotFound(_))));
    }

    #[test]
    fn test_staged_reload() {
        let (dir, mut session) = project();
        populate(&mut session);
        session.save_as("Assets/Levels/Main.txt").unwrap();
        let before = session.scene_text().0;
        assert_eq!(session.temp_path().as_deref(), Some("TempScenes/Levels/Main.txt"));

        let mut machine = SaveReload::new(session.settings().staging);
        assert_eq!(machine.run(&mut session), StepResult::Complete);
        assert!(dir.path().join("TempScenes/Levels/Main.txt").exists());
        assert_eq!(session.scene_text().0, before);
        assert_eq!(session.current_scene(), Some("Assets/Levels/Main.txt"));
    }

    #[test]
    fn test_staging_without_document_fails() {
        let (_dir, mut session) = project();
        let mut machine = SaveReload::new(session.settings().staging);
        assert_eq!(machine.run(&mut session), StepResult::Failed);
        assert!(!machine.error().unwrap().is_transient());
    }
}
