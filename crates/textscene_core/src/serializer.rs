// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene to text.
//!
//! Roots and siblings are written in a content-derived order so that two
//! saves of the same scene produce the same text. A save only reaches disk
//! when encoding raised no warning at all.

use crate::asset::AssetResolver;
use crate::error::{SerializeError, Warning, WarningLog};
use crate::format::LineWriter;
use crate::node_codec::encode_sorted;
use crate::scene::Scene;
use crate::value_codec::EncodeContext;
use std::fs;
use std::path::{Path, PathBuf};

/// Encode a scene, returning the text together with every warning raised
pub fn serialize_lenient(scene: &Scene, assets: &dyn AssetResolver) -> (String, Vec<Warning>) {
    let table = scene.path_table();
    let mut warnings = WarningLog::new();
    let mut ctx = EncodeContext {
        nodes: &table,
        assets,
        warnings: &mut warnings,
        location: String::new(),
    };
    let blocks = encode_sorted(&scene.roots, 0, &mut ctx);

    let mut writer = LineWriter::new();
    for block in &blocks {
        writer.append(block);
        writer.blank();
    }
    warnings.summarize("Serialize");
    (writer.finish(), warnings.into_vec())
}

/// Encode a scene, rejecting it if any warning was raised
pub fn serialize(scene: &Scene, assets: &dyn AssetResolver) -> Result<String, SerializeError> {
    let (text, warnings) = serialize_lenient(scene, assets);
    if warnings.is_empty() {
        Ok(text)
    } else {
        Err(SerializeError::Rejected {
            count: warnings.len(),
            warnings,
        })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Encode a scene and write it to a file, leaving the file untouched on any warning
pub fn save(scene: &Scene, assets: &dyn AssetResolver, path: &Path) -> Result<(), SerializeError> {
    let text = match serialize(scene, assets) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Not saving {}: {}", path.display(), e);
            return Err(e);
        }
    };

    let staged = staging_path(path);
    fs::write(&staged, &text)?;
    if let Err(e) = fs::rename(&staged, path) {
        let _ = fs::remove_file(&staged);
        return Err(e.into());
    }

    tracing::info!("Saved {} ({} nodes)", path.display(), scene.node_count());
    Ok(())
}
