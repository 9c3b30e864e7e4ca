// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text scene format for `OrdoPlay` scenes.
//!
//! This crate reads and writes scene graphs as line-oriented, diff-friendly
//! text so that scenes can be merged under version control:
//! - Nodes with placement, tags and layers
//! - Components and their members through reflection
//! - Template instances and linked sub-documents
//! - Cross references by full node path
//!
//! ## Architecture
//!
//! The codecs are layered bottom up:
//! - `value_codec` encodes one member value
//! - `component_codec` encodes one component block
//! - `node_codec` encodes node blocks and parses documents
//! - `serializer` and `deserializer` drive whole scenes
//!
//! Every load takes two passes over the parsed document so that references
//! to nodes appearing later in the text resolve.

pub mod asset;
pub mod builtin;
pub mod component_codec;
pub mod components;
pub mod deserializer;
pub mod error;
pub mod format;
pub mod node;
pub mod node_codec;
pub mod reflect;
pub mod scene;
pub mod serializer;
pub mod value;
pub mod value_codec;

pub use asset::{AssetResolver, MemoryAssets};
pub use builtin::{BuiltinTable, PrimitiveFactory, PrimitiveShape, StandardPrimitives};
pub use deserializer::{LoadedScene, SceneDeserializer};
pub use error::{LoadError, SerializeError, Warning, WarningLog};
pub use node::{Node, NodeId, NodeKind, Transform};
pub use reflect::{Component, Reflect, TypeRegistry};
pub use scene::{NodeQuery, PathTable, Scene};
pub use serializer::{save, serialize, serialize_lenient};
pub use value::{AssetId, AssetRef, Value};
pub use value_codec::Pass;
