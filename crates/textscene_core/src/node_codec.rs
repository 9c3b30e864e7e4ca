// SPDX-License-Identifier: MIT OR Apache-2.0
//! Encoding of node blocks and the parsed document tree.
//!
//! Three node kinds share a header and placement layout:
//!
//! ```text
//! gameobject Door            prefab Crate                textscene Cellar
//! tag Untagged layer 0       assetpath Assets/Crate.prefab, 3f2a...
//! <position x y z>           <position x y z>
//! <rotation x y z w>         <rotation x y z w>
//! <scale x y z>              <scale x y z>
//! children N                 (no body, content comes from the asset)
//! components N
//! ```
//!
//! Loading parses the whole text into [`NodeDecl`]s first. The two load
//! passes then walk the same tree and meet through the `shell` and `slot`
//! annotations the first pass leaves behind.

use crate::component_codec::{encode_component, is_serializable, read_component, write_component, ComponentRecord};
use crate::error::FormatError;
use crate::format::{float_line, LineReader, LineWriter};
use crate::node::{Node, NodeId, NodeKind, Transform};
use crate::reflect::{Component, Reflect};
use crate::value::AssetId;
use crate::value_codec::EncodeContext;
use glam::{Quat, Vec3};
use std::cmp::Ordering;

/// Parsed component block
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDecl {
    /// The block as read
    pub record: ComponentRecord,
    /// Index of the created shell on its node
    pub slot: Option<usize>,
}

/// What a parsed node holds
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// Inline content
    Plain {
        /// Category tag
        tag: String,
        /// Layer index
        layer: i32,
        /// Child blocks
        children: Vec<NodeDecl>,
        /// Component blocks
        components: Vec<ComponentDecl>,
    },
    /// Template instance
    AssetLink {
        /// Template asset path
        asset_path: String,
        /// Template asset id, if written
        asset_id: Option<AssetId>,
    },
    /// Linked sub-document
    SubgraphLink {
        /// Document asset path
        asset_path: String,
        /// Document asset id, if written
        asset_id: Option<AssetId>,
    },
}

/// Parsed node block
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDecl {
    /// Line of the header
    pub line: usize,
    /// Node name
    pub name: String,
    /// Local placement
    pub transform: Transform,
    /// Kind and body
    pub kind: DeclKind,
    /// Node created for this block by the first pass
    pub shell: Option<NodeId>,
}

fn read_transform(reader: &mut LineReader<'_>) -> Result<Transform, FormatError> {
    let position = reader.expect_floats(3)?;
    let rotation = reader.expect_floats(4)?;
    let scale = reader.expect_floats(3)?;
    Ok(Transform {
        position: Vec3::from_slice(&position),
        rotation: Quat::from_xyzw(rotation[0], rotation[1], rotation[2], rotation[3]),
        scale: Vec3::from_slice(&scale),
    })
}

fn read_asset_path(reader: &mut LineReader<'_>) -> Result<(String, Option<AssetId>), FormatError> {
    let (_, rest) = reader.expect_keyword("assetpath")?;
    Ok(match rest.rsplit_once(',') {
        Some((path, id)) => (path.trim().to_string(), AssetId::parse(id)),
        None => (rest.trim().to_string(), None),
    })
}

/// Read one node block and everything nested in it
pub fn read_node(reader: &mut LineReader<'_>) -> Result<NodeDecl, FormatError> {
    let (line, text) = reader.next_line("node")?;
    let (keyword, name) = text.split_once(' ').unwrap_or((text, ""));

    let (transform, kind) = match keyword {
        "gameobject" => {
            let (tag_line, rest) = reader.expect_keyword("tag")?;
            let Some((tag, layer)) = rest.rsplit_once(" layer ") else {
                return Err(FormatError::Expected {
                    line: tag_line,
                    expected: "'tag <tag> layer <n>'".to_string(),
                    found: rest.to_string(),
                });
            };
            let layer = layer.trim().parse().map_err(|_| FormatError::InvalidNumber {
                line: tag_line,
                text: layer.trim().to_string(),
            })?;
            let transform = read_transform(reader)?;

            let child_count = reader.expect_count("children")?;
            let children = (0..child_count)
                .map(|_| read_node(reader))
                .collect::<Result<Vec<_>, _>>()?;

            let component_count = reader.expect_count("components")?;
            let components = (0..component_count)
                .map(|_| {
                    read_component(reader).map(|record| ComponentDecl { record, slot: None })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let kind = DeclKind::Plain {
                tag: tag.to_string(),
                layer,
                children,
                components,
            };
            (transform, kind)
        }
        "prefab" => {
            let (asset_path, asset_id) = read_asset_path(reader)?;
            (read_transform(reader)?, DeclKind::AssetLink { asset_path, asset_id })
        }
        "textscene" => {
            let (asset_path, asset_id) = read_asset_path(reader)?;
            (read_transform(reader)?, DeclKind::SubgraphLink { asset_path, asset_id })
        }
        _ => {
            return Err(FormatError::UnknownToken {
                line,
                what: "node kind",
                token: keyword.to_string(),
            })
        }
    };

    Ok(NodeDecl {
        line,
        name: name.to_string(),
        transform,
        kind,
        shell: None,
    })
}

/// Parse every root block of a document
pub fn parse_document(text: &str) -> Result<Vec<NodeDecl>, FormatError> {
    let mut reader = LineReader::new(text);
    let mut roots = Vec::new();
    while reader.skip_blank() {
        roots.push(read_node(&mut reader)?);
    }
    Ok(roots)
}

fn write_transform(writer: &mut LineWriter, depth: usize, transform: &Transform) {
    writer.line(depth, float_line(&transform.position.to_array()));
    writer.line(depth, float_line(&transform.rotation.to_array()));
    writer.line(depth, float_line(&transform.scale.to_array()));
}

/// Order of sibling blocks: name, placement, then the block text itself
pub fn compare_blocks(a: (&Node, &str), b: (&Node, &str)) -> Ordering {
    fn floats(ordering: Ordering, a: &[f32], b: &[f32]) -> Ordering {
        a.iter()
            .zip(b)
            .fold(ordering, |acc, (x, y)| acc.then_with(|| x.total_cmp(y)))
    }
    let (ta, tb) = (&a.0.transform, &b.0.transform);
    let ordering = a.0.name.cmp(&b.0.name);
    let ordering = floats(ordering, &ta.position.to_array(), &tb.position.to_array());
    let ordering = floats(ordering, &ta.rotation.to_array(), &tb.rotation.to_array());
    let ordering = floats(ordering, &ta.scale.to_array(), &tb.scale.to_array());
    ordering.then_with(|| a.1.cmp(b.1))
}

/// Encode nodes into blocks at a depth, sorted, omitted nodes dropped
pub fn encode_sorted(nodes: &[Node], depth: usize, ctx: &mut EncodeContext<'_>) -> Vec<String> {
    let mut blocks: Vec<(&Node, String)> = nodes
        .iter()
        .filter_map(|node| encode_node(node, depth, ctx).map(|block| (node, block)))
        .collect();
    blocks.sort_by(|a, b| compare_blocks((a.0, a.1.as_str()), (b.0, b.1.as_str())));
    blocks.into_iter().map(|(_, block)| block).collect()
}

fn asset_line(path: &str, id: Option<AssetId>, ctx: &EncodeContext<'_>) -> String {
    let id = id
        .or_else(|| ctx.assets.path_to_guid(path))
        .map(|id| id.to_string())
        .unwrap_or_default();
    format!("assetpath {path}, {id}")
}

/// Encode one node block, `None` when the node cannot be written
pub fn encode_node(node: &Node, depth: usize, ctx: &mut EncodeContext<'_>) -> Option<String> {
    let path = ctx
        .nodes
        .full_path(node.id)
        .map_or_else(|| node.name.clone(), str::to_string);
    let outer = std::mem::replace(&mut ctx.location, path.clone());
    let block = write_node(node, depth, &path, ctx);
    ctx.location = outer;
    block
}

fn write_node(node: &Node, depth: usize, path: &str, ctx: &mut EncodeContext<'_>) -> Option<String> {
    let mut writer = LineWriter::new();
    match &node.kind {
        NodeKind::Plain => {
            writer.line(depth, format_args!("gameobject {}", node.name));
            writer.line(depth, format_args!("tag {} layer {}", node.tag, node.layer));
            write_transform(&mut writer, depth, &node.transform);

            let children = encode_sorted(&node.children, depth + 1, ctx);
            writer.line(depth, format_args!("children {}", children.len()));
            for child in &children {
                writer.append(child);
            }

            let mut records = Vec::with_capacity(node.components.len());
            for component in &node.components {
                if is_serializable(component.class()) {
                    records.push(encode_component(&**component, ctx));
                } else {
                    ctx.warnings.push(
                        path,
                        format!("{} components cannot be saved", component.type_name()),
                    );
                }
            }
            writer.line(depth, format_args!("components {}", records.len()));
            for record in &records {
                write_component(&mut writer, depth + 1, record);
            }
        }
        NodeKind::AssetLink { asset_path, asset_id } => {
            if asset_path.is_empty() {
                ctx.warnings.push(path, "template instance has no asset path, not saved");
                return None;
            }
            writer.line(depth, format_args!("prefab {}", node.name));
            writer.line(depth, asset_line(asset_path, *asset_id, ctx));
            write_transform(&mut writer, depth, &node.transform);
        }
        NodeKind::SubgraphLink { asset_path, asset_id } => {
            if asset_path.is_empty() {
                ctx.warnings.push(path, "linked document has no asset path, not saved");
                return None;
            }
            let sharing = ctx.nodes.find_by_path(path).len();
            if sharing > 1 {
                ctx.warnings.push(
                    path,
                    format!("linked document shares its path with {} other nodes", sharing - 1),
                );
            }
            writer.line(depth, format_args!("textscene {}", node.name));
            writer.line(depth, asset_line(asset_path, *asset_id, ctx));
            write_transform(&mut writer, depth, &node.transform);
        }
    }
    Some(writer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryAssets;
    use crate::components::{BoxCollider, ParticleEmitter};
    use crate::error::WarningLog;
    use crate::scene::Scene;

    fn encode(scene: &Scene, node: &Node, depth: usize) -> (Option<String>, WarningLog) {
        let table = scene.path_table();
        let assets = MemoryAssets::new();
        let mut warnings = WarningLog::new();
        let mut ctx = EncodeContext {
            nodes: &table,
            assets: &assets,
            warnings: &mut warnings,
            location: String::new(),
        };
        let block = encode_node(node, depth, &mut ctx);
        (block, warnings)
    }

    #[test]
    fn test_plain_block() {
        let scene = Scene::from_roots(vec![Node::new("Box")
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_component(BoxCollider::default())]);
        let (block, warnings) = encode(&scene, &scene.roots[0], 0);
        assert!(warnings.is_empty());
        assert_eq!(
            block.unwrap(),
            "gameobject Box\n\
             tag Untagged layer 0\n\
             1.00000 2.00000 3.00000\n\
             0.00000 0.00000 0.00000 1.00000\n\
             1.00000 1.00000 1.00000\n\
             children 0\n\
             components 1\n  \
             BoxCollider 1\n    \
             field isTrigger primitive System.Boolean = False\n"
        );
    }

    #[test]
    fn test_children_sorted_and_indented() {
        let root = Node::new("Root")
            .with_child(Node::new("B"))
            .with_child(Node::new("A").with_position(Vec3::X))
            .with_child(Node::new("A"));
        let scene = Scene::from_roots(vec![root]);
        let (block, _) = encode(&scene, &scene.roots[0], 0);
        let block = block.unwrap();

        let headers: Vec<_> = block
            .lines()
            .filter(|l| l.trim_start().starts_with("gameobject"))
            .collect();
        assert_eq!(
            headers,
            ["gameobject Root", "  gameobject A", "  gameobject A", "  gameobject B"]
        );

        let decl = read_node(&mut LineReader::new(&block)).unwrap();
        let DeclKind::Plain { children, .. } = decl.kind else {
            panic!("expected a plain node");
        };
        assert_eq!(children[1].transform.position, Vec3::X);
    }

    #[test]
    fn test_particle_emitter_skipped() {
        let scene = Scene::from_roots(vec![Node::new("Smoke").with_component(ParticleEmitter::default())]);
        let (block, warnings) = encode(&scene, &scene.roots[0], 0);
        assert!(block.unwrap().contains("components 0"));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_linked_nodes() {
        let id = AssetId::new();
        let prefab = Node::new("Crate").with_kind(NodeKind::AssetLink {
            asset_path: "Assets/Crate.prefab".into(),
            asset_id: Some(id),
        });
        let scene = Scene::from_roots(vec![prefab]);
        let (block, _) = encode(&scene, &scene.roots[0], 0);
        let block = block.unwrap();
        assert!(block.starts_with(&format!("prefab Crate\nassetpath Assets/Crate.prefab, {id}\n")));

        let decl = read_node(&mut LineReader::new(&block)).unwrap();
        assert_eq!(
            decl.kind,
            DeclKind::AssetLink {
                asset_path: "Assets/Crate.prefab".into(),
                asset_id: Some(id)
            }
        );
    }

    #[test]
    fn test_subgraph_without_path_omitted() {
        let node = Node::new("Cellar").with_kind(NodeKind::SubgraphLink {
            asset_path: String::new(),
            asset_id: None,
        });
        let scene = Scene::from_roots(vec![node]);
        let (block, warnings) = encode(&scene, &scene.roots[0], 0);
        assert!(block.is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_subgraph_sharing_path_warns() {
        let link = || {
            Node::new("Cellar").with_kind(NodeKind::SubgraphLink {
                asset_path: "Assets/Cellar.txt".into(),
                asset_id: None,
            })
        };
        let scene = Scene::from_roots(vec![link(), link()]);
        let (block, warnings) = encode(&scene, &scene.roots[0], 0);
        assert!(block.unwrap().starts_with("textscene Cellar\nassetpath Assets/Cellar.txt, \n"));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_asset_path_without_id() {
        let text = "textscene Cellar\nassetpath Assets/Cellar.txt,\n0 0 0\n0 0 0 1\n1 1 1\n";
        let decl = read_node(&mut LineReader::new(text)).unwrap();
        assert_eq!(
            decl.kind,
            DeclKind::SubgraphLink {
                asset_path: "Assets/Cellar.txt".into(),
                asset_id: None
            }
        );
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            parse_document("mesh Box\n"),
            Err(FormatError::UnknownToken { what: "node kind", .. })
        ));
        assert!(matches!(
            parse_document("gameobject Box\ntag Untagged layer zero\n"),
            Err(FormatError::InvalidNumber { line: 2, .. })
        ));
        assert!(matches!(
            parse_document("gameobject Box\ntag Untagged layer 0\n1 2\n"),
            Err(FormatError::Arity { line: 3, .. })
        ));
        assert!(matches!(
            parse_document("gameobject Box\ntag Untagged layer 0\n0 0 0\n0 0 0 1\n1 1 1\nchildren 1\n"),
            Err(FormatError::UnexpectedEof { .. })
        ));
        assert_eq!(parse_document("\n\n"), Ok(Vec::new()));
    }

    #[test]
    fn test_tag_with_spaces() {
        let text = "gameobject Sign\ntag Road Sign layer 3\n0 0 0\n0 0 0 1\n1 1 1\nchildren 0\ncomponents 0\n";
        let decl = read_node(&mut LineReader::new(text)).unwrap();
        let DeclKind::Plain { tag, layer, .. } = decl.kind else {
            panic!("expected a plain node");
        };
        assert_eq!(tag, "Road Sign");
        assert_eq!(layer, 3);
    }
}
