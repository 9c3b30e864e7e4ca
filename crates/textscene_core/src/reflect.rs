// SPDX-License-Identifier: MIT OR Apache-2.0
//! Member introspection for components and nested aggregates.
//!
//! Types expose their members through [`Reflect`]:
//! - [`Reflect::members`] lists members in declared order, fields before properties
//! - [`Reflect::get`] reads a member as a [`Value`]
//! - [`Reflect::set`] writes a member from a [`Value`]
//!
//! Components are created by name through the [`TypeRegistry`], which also
//! holds the member lists of every enum a document may mention.

use crate::error::ReflectError;
use crate::node::NodeId;
use crate::value::{
    type_names, ArrayValue, AssetRef, Color, ComponentLink, MaterialRef, MeshRef, Record, Rect,
    StorageKind, Value,
};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;

/// Description of one reflected member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    /// Member name as written in documents
    pub name: &'static str,
    /// Field or property
    pub storage: StorageKind,
    /// False for properties without a setter
    pub writable: bool,
}

impl Member {
    /// A plain field
    pub const fn field(name: &'static str) -> Self {
        Self {
            name,
            storage: StorageKind::Field,
            writable: true,
        }
    }

    /// A property with getter and setter
    pub const fn property(name: &'static str) -> Self {
        Self {
            name,
            storage: StorageKind::Property,
            writable: true,
        }
    }

    /// A property with only a getter
    pub const fn read_only(name: &'static str) -> Self {
        Self {
            name,
            storage: StorageKind::Property,
            writable: false,
        }
    }
}

/// Runtime access to named members
pub trait Reflect {
    /// Type name as written in documents
    fn type_name(&self) -> &'static str;

    /// All members in declared order
    fn members(&self) -> &'static [Member];

    /// Read a member, `None` when unset or unknown
    fn get(&self, name: &str) -> Option<Value>;

    /// Write a member
    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError>;

    /// Look up a member description
    fn member(&self, name: &str) -> Option<Member> {
        self.members().iter().find(|m| m.name == name).copied()
    }
}

/// Categories the serializer treats specially
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentClass {
    /// Scripts and everything else
    Behaviour,
    /// Physics colliders
    Collider,
    /// Mesh and material renderers
    Renderer,
    /// Mesh holders
    MeshFilter,
    /// Physics bodies
    Rigidbody,
    /// Cameras
    Camera,
    /// Legacy particle emitters, cannot be saved
    ParticleEmitter,
}

/// Object-safe cloning and downcasting for components
pub trait ComponentBase: Any {
    /// Clone into a new box
    fn clone_box(&self) -> Box<dyn Component>;
    /// Borrow as `Any` for downcasting
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `Any` for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component + Clone> ComponentBase for T {
    fn clone_box(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A typed data block attached to a node
pub trait Component: Reflect + ComponentBase + fmt::Debug {
    /// Serializer category
    fn class(&self) -> ComponentClass {
        ComponentClass::Behaviour
    }
}

impl Clone for Box<dyn Component> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Conversion between a member's Rust type and [`Value`]
pub trait ReflectValue: Sized {
    /// Declared type name used in errors and array headers
    fn declared_type() -> String;

    /// Convert to a value, `None` when unset
    fn to_value(&self) -> Option<Value>;

    /// Convert from a value, `None` on type mismatch
    fn from_value(value: Value) -> Option<Self>;

    /// Representation of a null array entry
    fn from_null() -> Option<Self> {
        None
    }
}

macro_rules! impl_reflect_value {
    ($ty:ty, $name:expr, $variant:ident) => {
        impl ReflectValue for $ty {
            fn declared_type() -> String {
                $name.to_string()
            }

            fn to_value(&self) -> Option<Value> {
                Some(Value::$variant(self.clone()))
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_reflect_value!(i32, type_names::INT, Int);
impl_reflect_value!(bool, type_names::BOOL, Bool);
impl_reflect_value!(String, type_names::STRING, String);
impl_reflect_value!(Vec2, type_names::VECTOR2, Vector2);
impl_reflect_value!(Vec3, type_names::VECTOR3, Vector3);
impl_reflect_value!(Vec4, type_names::VECTOR4, Vector4);
impl_reflect_value!(Quat, type_names::QUATERNION, Quaternion);
impl_reflect_value!(Color, type_names::COLOR, Color);
impl_reflect_value!(Rect, type_names::RECT, Rect);
impl_reflect_value!(Mat4, type_names::MATRIX4X4, Matrix);
impl_reflect_value!(AssetRef, "Object", Asset);
impl_reflect_value!(NodeId, type_names::GAME_OBJECT, Node);
impl_reflect_value!(ComponentLink, "Component", Component);

impl ReflectValue for f32 {
    fn declared_type() -> String {
        type_names::FLOAT.to_string()
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Float(*self))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v),
            Value::Int(v) => Some(v as f32),
            _ => None,
        }
    }
}

impl ReflectValue for MeshRef {
    fn declared_type() -> String {
        type_names::MESH.to_string()
    }

    fn to_value(&self) -> Option<Value> {
        Some(match self {
            Self::Asset(asset) => Value::Asset(asset.clone()),
            Self::Builtin(name) => Value::BuiltinMesh(name.clone()),
        })
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Asset(asset) => Some(Self::Asset(asset)),
            Value::BuiltinMesh(name) => Some(Self::Builtin(name)),
            _ => None,
        }
    }
}

impl ReflectValue for MaterialRef {
    fn declared_type() -> String {
        type_names::MATERIAL.to_string()
    }

    fn to_value(&self) -> Option<Value> {
        Some(match self {
            Self::Asset(asset) => Value::Asset(asset.clone()),
            Self::Builtin(name) => Value::BuiltinMaterial(name.clone()),
        })
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Asset(asset) => Some(Self::Asset(asset)),
            Value::BuiltinMaterial(name) => Some(Self::Builtin(name)),
            _ => None,
        }
    }
}

impl<T: ReflectValue> ReflectValue for Option<T> {
    fn declared_type() -> String {
        T::declared_type()
    }

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(T::to_value)
    }

    fn from_value(value: Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }

    fn from_null() -> Option<Self> {
        Some(None)
    }
}

impl<T: ReflectValue> ReflectValue for Vec<T> {
    fn declared_type() -> String {
        format!("{}[]", T::declared_type())
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Array(ArrayValue {
            element_type: T::declared_type(),
            items: self.iter().map(T::to_value).collect(),
        }))
    }

    fn from_value(value: Value) -> Option<Self> {
        let Value::Array(array) = value else {
            return None;
        };
        array
            .items
            .into_iter()
            .map(|item| match item {
                Some(v) => T::from_value(v),
                None => T::from_null(),
            })
            .collect()
    }
}

/// Store a value into a typed slot
pub fn assign<T: ReflectValue>(slot: &mut T, member: &str, value: Value) -> Result<(), ReflectError> {
    let found = value.type_name();
    match T::from_value(value) {
        Some(v) => {
            *slot = v;
            Ok(())
        }
        None => Err(ReflectError::TypeMismatch {
            member: member.to_string(),
            expected: T::declared_type(),
            found,
        }),
    }
}

/// Store a component link after checking its target type
pub fn assign_link(
    slot: &mut Option<ComponentLink>,
    member: &str,
    expected: &str,
    value: Value,
) -> Result<(), ReflectError> {
    match value {
        Value::Component(link) if link.type_name == expected => {
            *slot = Some(link);
            Ok(())
        }
        other => Err(ReflectError::TypeMismatch {
            member: member.to_string(),
            expected: expected.to_string(),
            found: other.type_name(),
        }),
    }
}

/// Read every readable member of an aggregate into a record
pub fn capture(target: &dyn Reflect) -> Record {
    let mut record = Record::new(target.type_name());
    for member in target.members() {
        if let Some(value) = target.get(member.name) {
            record.push(member.storage, member.name, value);
        }
    }
    record
}

/// Write every member of a record into an aggregate
pub fn apply(record: &Record, target: &mut dyn Reflect) -> Result<(), ReflectError> {
    for member in &record.members {
        target.set(&member.name, member.value.clone())?;
    }
    Ok(())
}

/// Enum whose members are addressed by name
pub trait ReflectEnum: Sized + Copy + 'static {
    /// Enum type name as written in documents
    const TYPE_NAME: &'static str;
    /// Member names in declaration order
    const MEMBERS: &'static [&'static str];
    /// Name of this member
    fn member_name(&self) -> &'static str;
    /// Member by name
    fn from_member_name(name: &str) -> Option<Self>;
}

/// Declare an enum usable as a reflected member.
///
/// ```
/// textscene_core::reflect_enum! {
///     /// Blend modes
///     #[derive(Default)]
///     pub enum BlendMode as "BlendMode" {
///         #[default]
///         Opaque,
///         Additive,
///     }
/// }
/// ```
#[macro_export]
macro_rules! reflect_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $wire:literal {
            $( $(#[$vmeta:meta])* $variant:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::reflect::ReflectEnum for $name {
            const TYPE_NAME: &'static str = $wire;
            const MEMBERS: &'static [&'static str] = &[$(stringify!($variant)),+];

            fn member_name(&self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant) ),+
                }
            }

            fn from_member_name(name: &str) -> Option<Self> {
                match name {
                    $( stringify!($variant) => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl $crate::reflect::ReflectValue for $name {
            fn declared_type() -> String {
                $wire.to_string()
            }

            fn to_value(&self) -> Option<$crate::value::Value> {
                Some($crate::value::Value::Enum {
                    type_name: $wire.to_string(),
                    member: $crate::reflect::ReflectEnum::member_name(self).to_string(),
                })
            }

            fn from_value(value: $crate::value::Value) -> Option<Self> {
                match value {
                    $crate::value::Value::Enum { type_name, member } if type_name == $wire => {
                        <Self as $crate::reflect::ReflectEnum>::from_member_name(&member)
                    }
                    _ => None,
                }
            }
        }
    };
}

/// Registration record for a component type
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// Type name as written in documents
    pub type_name: &'static str,
    /// Serializer category
    pub class: ComponentClass,
    /// Factory for a default instance
    pub create_default: fn() -> Box<dyn Component>,
}

/// Component factories and enum member tables, keyed by type name
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    components: IndexMap<&'static str, ComponentInfo>,
    enums: IndexMap<&'static str, &'static [&'static str]>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in component and enum types
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::components::register_builtins(&mut registry);
        registry
    }

    /// Register a component factory
    pub fn register_component(&mut self, create_default: fn() -> Box<dyn Component>) {
        let sample = create_default();
        let info = ComponentInfo {
            type_name: sample.type_name(),
            class: sample.class(),
            create_default,
        };
        self.components.insert(info.type_name, info);
    }

    /// Register the member list of an enum
    pub fn register_enum<E: ReflectEnum>(&mut self) {
        self.enums.insert(E::TYPE_NAME, E::MEMBERS);
    }

    /// Look up a component registration
    pub fn component(&self, type_name: &str) -> Option<&ComponentInfo> {
        self.components.get(type_name)
    }

    /// Create a default component by type name
    pub fn create(&self, type_name: &str) -> Option<Box<dyn Component>> {
        self.components.get(type_name).map(|info| (info.create_default)())
    }

    /// Member names of a registered enum
    pub fn enum_members(&self, type_name: &str) -> Option<&'static [&'static str]> {
        self.enums.get(type_name).copied()
    }

    /// All registered component type names
    pub fn component_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BoxCollider, HideFlags, JointSpring};

    #[test]
    fn test_assign_type_mismatch() {
        let mut slot = 0i32;
        assert!(assign(&mut slot, "count", Value::Int(4)).is_ok());
        assert_eq!(slot, 4);

        let err = assign(&mut slot, "count", Value::Bool(true)).unwrap_err();
        assert_eq!(
            err,
            ReflectError::TypeMismatch {
                member: "count".into(),
                expected: "System.Int32".into(),
                found: "System.Boolean".into(),
            }
        );
    }

    #[test]
    fn test_vec_with_null_entries() {
        let value = Value::Array(ArrayValue {
            element_type: "Material".into(),
            items: vec![Some(Value::BuiltinMaterial("Default-Diffuse".into())), None],
        });
        let list = Vec::<Option<MaterialRef>>::from_value(value.clone()).unwrap();
        assert_eq!(list, vec![Some(MaterialRef::Builtin("Default-Diffuse".into())), None]);

        // Non-optional elements cannot hold null
        assert!(Vec::<MaterialRef>::from_value(value).is_none());
    }

    #[test]
    fn test_enum_value() {
        let value = HideFlags::NotEditable.to_value().unwrap();
        assert_eq!(
            value,
            Value::Enum {
                type_name: "HideFlags".into(),
                member: "NotEditable".into()
            }
        );
        assert_eq!(HideFlags::from_value(value), Some(HideFlags::NotEditable));
    }

    #[test]
    fn test_capture_and_apply_record() {
        let spring = JointSpring {
            spring: 10.0,
            damper: 0.5,
            target_position: 30.0,
        };
        let record = capture(&spring);
        assert_eq!(record.type_name, "JointSpring");
        assert_eq!(record.get("damper"), Some(&Value::Float(0.5)));

        let mut copy = JointSpring::default();
        apply(&record, &mut copy).unwrap();
        assert_eq!(copy, spring);
    }

    #[test]
    fn test_registry() {
        let registry = TypeRegistry::with_builtins();
        let collider = registry.create("BoxCollider").unwrap();
        assert_eq!(collider.class(), ComponentClass::Collider);
        assert!(collider.as_any().downcast_ref::<BoxCollider>().is_some());
        assert!(registry.create("NoSuchComponent").is_none());
        assert!(registry.enum_members("HideFlags").unwrap().contains(&"DontSave"));
    }
}
