// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host side of `TextScene`.
//!
//! Everything a project needs around the scene codecs:
//! - Project settings stored next to the assets
//! - A file-backed asset database with id sidecars
//! - The editor session owning the open scene
//! - Staged save and reload driven frame by frame

pub mod assets;
pub mod project;
pub mod session;
pub mod staging;

pub use assets::{AssetError, AssetMeta, ProjectAssets};
pub use project::{ProjectError, ProjectSettings, StagingSettings};
pub use session::{EditorSession, SessionError};
pub use staging::{SaveReload, Stage, StagingError, StagingHost, StepResult};
