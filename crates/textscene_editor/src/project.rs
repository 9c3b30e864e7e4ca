// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project settings and configuration.
//!
//! This module manages project-level settings including:
//! - Project name and settings format version
//! - Asset and temp directory layout
//! - File extensions for scenes, templates and sidecars
//! - Staged save and reload tuning
//! - Default log filter


use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current project settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Project settings file name
pub const SETTINGS_FILE_NAME: &str = "textscene.ron";

/// Errors reading or writing project settings
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Settings file could not be read or written
    #[error("project settings I/O failed for '{path}': {source}")]
    Io {
        /// Settings file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// Settings file is not valid RON
    #[error("invalid project settings in '{path}': {message}")]
    Parse {
        /// Settings file
        path: PathBuf,
        /// Parser message
        message: String,
    },
    /// Settings were written by a newer version
    #[error("project version {found} is newer than supported version {supported}")]
    Version {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
}

/// Tuning of the staged save and reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingSettings {
    /// Frames to wait before the first step does any work
    pub delay_frames: u32,
    /// Attempts allowed per step on transient I/O failures
    pub max_retries: u32,
}

impl Default for StagingSettings {
    fn default() -> Self {
        Self {
            delay_frames: 5,
            max_retries: 3,
        }
    }
}

/// Complete project settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Settings format version
    pub version: u32,
    /// Project name
    pub name: String,
    /// Directory holding every asset, relative to the project root
    pub assets_dir: String,
    /// Directory for staged scene copies, relative to the project root
    pub temp_dir: String,
    /// Extension of scene documents
    pub scene_extension: String,
    /// Extension of template documents
    pub prefab_extension: String,
    /// Extension of asset sidecar files
    pub meta_extension: String,
    /// Staged save and reload
    pub staging: StagingSettings,
    /// Mark content of linked documents as not editable after load
    pub lock_subgraphs: bool,
    /// Default `tracing` filter directive, `RUST_LOG` adds to it
    pub log_filter: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            name: "Untitled".to_string(),
            assets_dir: "Assets".to_string(),
            temp_dir: "TempScenes".to_string(),
            scene_extension: "txt".to_string(),
            prefab_extension: "prefab".to_string(),
            meta_extension: "meta".to_string(),
            staging: StagingSettings::default(),
            lock_subgraphs: true,
            log_filter: "textscene_editor=info".to_string(),
        }
    }
}

impl ProjectSettings {
    /// Create settings with a project name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load project settings from a file
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: ProjectSettings = ron::from_str(&content).map_err(|e| ProjectError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(ProjectError::Version {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }

        Ok(settings)
    }

    /// Save project settings to a file
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| ProjectError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        std::fs::write(path, content).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the settings file path for a project directory
    pub fn file_path(project_dir: &Path) -> PathBuf {
        project_dir.join(SETTINGS_FILE_NAME)
    }

    /// Load the settings of a project directory, falling back to defaults
    /// when it has no settings file yet
    pub fn load_or_default(project_dir: &Path) -> Result<Self, ProjectError> {
        let path = Self::file_path(project_dir);
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::info!("No {} in {}, using defaults", SETTINGS_FILE_NAME, project_dir.display());
            Ok(Self::default())
        }
    }

    /// Whether a project-relative path names a scene document
    pub fn is_scene_path(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.scene_extension))
    }

    /// Staging copy of a scene: the temp directory followed by the scene
    /// path without its first directory
    pub fn temp_path_for(&self, scene_path: &str) -> String {
        let rest = scene_path.split_once('/').map_or(scene_path, |(_, rest)| rest);
        format!("{}/{}", self.temp_dir, rest)
    }

    /// Scene path a staging copy stands for, if the path is inside the temp directory
    pub fn scene_path_for_temp(&self, temp_path: &str) -> Option<String> {
        let rest = temp_path.strip_prefix(&self.temp_dir)?.strip_prefix('/')?;
        Some(format!("{}/{}", self.assets_dir, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ProjectSettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.assets_dir, "Assets");
        assert_eq!(settings.staging.delay_frames, 5);
        assert!(settings.lock_subgraphs);
    }

    #[test]
    fn test_serialization() {
        let settings = ProjectSettings::new("Test Project");
        let ron_str = ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default()).unwrap();
        let loaded: ProjectSettings = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let loaded: ProjectSettings = ron::from_str("(name: \"Island\", staging: (max_retries: 7))").unwrap();
        assert_eq!(loaded.name, "Island");
        assert_eq!(loaded.temp_dir, "TempScenes");
        assert_eq!(loaded.staging.max_retries, 7);
        assert_eq!(loaded.staging.delay_frames, 5);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = ProjectSettings::file_path(dir.path());

        let mut settings = ProjectSettings::new("Saved");
        settings.lock_subgraphs = false;
        settings.save(&path).unwrap();

        assert_eq!(ProjectSettings::load(&path).unwrap(), settings);
        assert_eq!(ProjectSettings::load_or_default(dir.path()).unwrap(), settings);
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "(version: 99)").unwrap();

        assert!(matches!(
            ProjectSettings::load(&path),
            Err(ProjectError::Version { found: 99, .. })
        ));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ProjectSettings::load_or_default(dir.path()).unwrap(), ProjectSettings::default());
    }

    #[test]
    fn test_temp_paths() {
        let settings = ProjectSettings::default();
        assert_eq!(settings.temp_path_for("Assets/Levels/One.txt"), "TempScenes/Levels/One.txt");
        assert_eq!(
            settings.scene_path_for_temp("TempScenes/Levels/One.txt").as_deref(),
            Some("Assets/Levels/One.txt")
        );
        assert_eq!(settings.scene_path_for_temp("Assets/One.txt"), None);
    }

    #[test]
    fn test_scene_paths() {
        let settings = ProjectSettings::default();
        assert!(settings.is_scene_path("Assets/One.txt"));
        assert!(settings.is_scene_path("Assets/One.TXT"));
        assert!(!settings.is_scene_path("Assets/Crate.prefab"));
    }
}
