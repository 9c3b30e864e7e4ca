// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime values carried by component members.
//!
//! A [`Value`] is what a component hands out through
//! [`Reflect::get`](crate::reflect::Reflect::get) and accepts through
//! [`Reflect::set`](crate::reflect::Reflect::set). The value codec turns it
//! into text and back.

use crate::node::NodeId;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declared type names as they appear in documents
pub mod type_names {
    /// 32-bit integer
    pub const INT: &str = "System.Int32";
    /// 32-bit float
    pub const FLOAT: &str = "System.Single";
    /// Boolean
    pub const BOOL: &str = "System.Boolean";
    /// String
    pub const STRING: &str = "System.String";
    /// 2D vector
    pub const VECTOR2: &str = "Vector2";
    /// 3D vector
    pub const VECTOR3: &str = "Vector3";
    /// 4D vector
    pub const VECTOR4: &str = "Vector4";
    /// Rotation quaternion
    pub const QUATERNION: &str = "Quaternion";
    /// RGBA color
    pub const COLOR: &str = "Color";
    /// Rectangle
    pub const RECT: &str = "Rect";
    /// 4x4 matrix, never written
    pub const MATRIX4X4: &str = "Matrix4x4";
    /// A scene node
    pub const GAME_OBJECT: &str = "GameObject";
    /// The placement of a scene node
    pub const TRANSFORM: &str = "Transform";
    /// Mesh asset
    pub const MESH: &str = "Mesh";
    /// Material asset
    pub const MATERIAL: &str = "Material";
    /// Sub-scene document asset
    pub const TEXT_SCENE: &str = "TextScene";
}

/// How a member is stored on its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Plain data field
    Field,
    /// Accessor pair
    Property,
}

impl StorageKind {
    /// Wire token
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Property => "property",
        }
    }
}

impl FromStr for StorageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "field" => Ok(Self::Field),
            "property" => Ok(Self::Property),
            _ => Err(()),
        }
    }
}

/// Encoding family of a value on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Scalars, strings, enums and vector-likes
    Primitive,
    /// Length-prefixed list of self-describing entries
    Array,
    /// Member-count-prefixed nested record
    Complex,
    /// Reference to an asset by path, name and id
    Asset,
    /// Reference to a node or component by full path
    SceneLink,
    /// Builtin primitive mesh by name
    BuiltinMesh,
    /// Builtin default material by name
    BuiltinMaterial,
}

impl ValueKind {
    /// Wire token
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Array => "array",
            Self::Complex => "complex",
            Self::Asset => "asset",
            Self::SceneLink => "scenelink",
            Self::BuiltinMesh => "builtinmesh",
            Self::BuiltinMaterial => "builtinmaterial",
        }
    }
}

impl FromStr for ValueKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primitive" => Ok(Self::Primitive),
            "array" => Ok(Self::Array),
            "complex" => Ok(Self::Complex),
            "asset" => Ok(Self::Asset),
            "scenelink" => Ok(Self::SceneLink),
            "builtinmesh" => Ok(Self::BuiltinMesh),
            "builtinmaterial" => Ok(Self::BuiltinMaterial),
            _ => Err(()),
        }
    }
}

/// Opaque asset identifier, written as 32 hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub Uuid);

impl AssetId {
    /// Create a new random asset ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the hex form, with or without hyphens
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::try_parse(text.trim()).ok().map(Self)
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Reference to an asset stored outside the scene
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetRef {
    /// Asset type name (`Material`, `AudioClip`, ...)
    pub type_name: String,
    /// Project-relative asset path
    pub path: String,
    /// Display name, used to pick a sub-asset at the path
    pub name: String,
    /// Stable id, preferred over the path when resolving
    pub id: Option<AssetId>,
}

impl AssetRef {
    /// Reference the main asset at a path
    pub fn new(type_name: impl Into<String>, path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            path: path.into(),
            name: name.into(),
            id: None,
        }
    }

    /// Attach an id
    pub fn with_id(mut self, id: AssetId) -> Self {
        self.id = Some(id);
        self
    }
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    /// Build from components
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Build from origin and size
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Reference to a component on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentLink {
    /// Owning node
    pub node: NodeId,
    /// Component type name, or `Transform` for the node's placement
    pub type_name: String,
}

impl ComponentLink {
    /// Build a link
    pub fn new(node: NodeId, type_name: impl Into<String>) -> Self {
        Self {
            node,
            type_name: type_name.into(),
        }
    }
}

/// One member of a [`Record`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMember {
    /// Storage kind on the owner
    pub storage: StorageKind,
    /// Member name
    pub name: String,
    /// Member value
    pub value: Value,
}

/// Struct-like aggregate value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Aggregate type name
    pub type_name: String,
    /// Members in declared order
    pub members: Vec<RecordMember>,
}

impl Record {
    /// Create an empty record
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: Vec::new(),
        }
    }

    /// Append a member
    pub fn push(&mut self, storage: StorageKind, name: impl Into<String>, value: Value) {
        self.members.push(RecordMember {
            storage,
            name: name.into(),
            value,
        });
    }

    /// Look up a member value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.iter().find(|m| m.name == name).map(|m| &m.value)
    }
}

/// Ordered list value, entries may be null
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayValue {
    /// Declared element type
    pub element_type: String,
    /// Entries in order
    pub items: Vec<Option<Value>>,
}

/// A typed runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// Boolean
    Bool(bool),
    /// String
    String(String),
    /// Enum member by name
    Enum {
        /// Enum type name
        type_name: String,
        /// Member name
        member: String,
    },
    /// 2D vector
    Vector2(Vec2),
    /// 3D vector
    Vector3(Vec3),
    /// 4D vector
    Vector4(Vec4),
    /// Rotation
    Quaternion(Quat),
    /// Color
    Color(Color),
    /// Rectangle
    Rect(Rect),
    /// Matrix, skipped when writing
    Matrix(Mat4),
    /// List of values
    Array(ArrayValue),
    /// Nested aggregate
    Complex(Record),
    /// Asset reference
    Asset(AssetRef),
    /// Scene node reference
    Node(NodeId),
    /// Component reference
    Component(ComponentLink),
    /// Builtin primitive mesh
    BuiltinMesh(String),
    /// Builtin default material
    BuiltinMaterial(String),
    /// Live object with no asset path and no scene identity
    Opaque {
        /// Runtime type name
        type_name: String,
        /// Display name
        name: String,
    },
}

impl Value {
    /// Declared type name written for this value
    pub fn type_name(&self) -> String {
        match self {
            Self::Int(_) => type_names::INT.into(),
            Self::Float(_) => type_names::FLOAT.into(),
            Self::Bool(_) => type_names::BOOL.into(),
            Self::String(_) => type_names::STRING.into(),
            Self::Vector2(_) => type_names::VECTOR2.into(),
            Self::Vector3(_) => type_names::VECTOR3.into(),
            Self::Vector4(_) => type_names::VECTOR4.into(),
            Self::Quaternion(_) => type_names::QUATERNION.into(),
            Self::Color(_) => type_names::COLOR.into(),
            Self::Rect(_) => type_names::RECT.into(),
            Self::Matrix(_) => type_names::MATRIX4X4.into(),
            Self::Node(_) => type_names::GAME_OBJECT.into(),
            Self::BuiltinMesh(_) => type_names::MESH.into(),
            Self::BuiltinMaterial(_) => type_names::MATERIAL.into(),
            Self::Array(array) => format!("{}[]", array.element_type),
            Self::Complex(record) => record.type_name.clone(),
            Self::Asset(asset) => asset.type_name.clone(),
            Self::Component(link) => link.type_name.clone(),
            Self::Enum { type_name, .. } | Self::Opaque { type_name, .. } => type_name.clone(),
        }
    }

    /// Wire kind, `None` for values that are never written
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Int(_)
            | Self::Float(_)
            | Self::Bool(_)
            | Self::String(_)
            | Self::Enum { .. }
            | Self::Vector2(_)
            | Self::Vector3(_)
            | Self::Vector4(_)
            | Self::Quaternion(_)
            | Self::Color(_)
            | Self::Rect(_) => Some(ValueKind::Primitive),
            Self::Array(_) => Some(ValueKind::Array),
            Self::Complex(_) => Some(ValueKind::Complex),
            Self::Asset(_) => Some(ValueKind::Asset),
            Self::Node(_) | Self::Component(_) => Some(ValueKind::SceneLink),
            Self::BuiltinMesh(_) => Some(ValueKind::BuiltinMesh),
            Self::BuiltinMaterial(_) => Some(ValueKind::BuiltinMaterial),
            Self::Matrix(_) | Self::Opaque { .. } => None,
        }
    }
}

/// Mesh reference held by mesh filters and mesh colliders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshRef {
    /// Mesh asset
    Asset(AssetRef),
    /// Builtin primitive mesh
    Builtin(String),
}

/// Material reference held by renderers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialRef {
    /// Material asset
    Asset(AssetRef),
    /// Builtin default material
    Builtin(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tokens_parse_back() {
        for kind in [
            ValueKind::Primitive,
            ValueKind::Array,
            ValueKind::Complex,
            ValueKind::Asset,
            ValueKind::SceneLink,
            ValueKind::BuiltinMesh,
            ValueKind::BuiltinMaterial,
        ] {
            assert_eq!(kind.as_str().parse::<ValueKind>(), Ok(kind));
        }
        assert!("vector".parse::<ValueKind>().is_err());
        assert_eq!("property".parse::<StorageKind>(), Ok(StorageKind::Property));
    }

    #[test]
    fn test_type_names() {
        let array = Value::Array(ArrayValue {
            element_type: type_names::MATERIAL.into(),
            items: Vec::new(),
        });
        assert_eq!(array.type_name(), "Material[]");
        assert_eq!(Value::Bool(true).type_name(), "System.Boolean");
        assert_eq!(Value::Node(NodeId::new()).kind(), Some(ValueKind::SceneLink));
        assert_eq!(Value::Matrix(Mat4::IDENTITY).kind(), None);
    }

    #[test]
    fn test_asset_id_hex() {
        let id = AssetId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 32);
        assert_eq!(AssetId::parse(&text), Some(id));
        assert_eq!(AssetId::parse("not-an-id"), None);
    }
}
