// SPDX-License-Identifier: MIT OR Apache-2.0
//! Encoding of one component block.
//!
//! A block is a `TypeName FieldCount` header followed by that many member
//! lines one level deeper. Encoding walks the component's members in
//! declared order and leaves out:
//! - identity properties the node already carries (`name`, `tag`, `layer`, `active`)
//! - properties still at their default (`hideFlags` of `None`, `enabled` of `true`)
//! - getters that would leak shared assets or duplicate another member
//! - derived camera properties and properties without a setter

use crate::error::{FormatError, ReflectError};
use crate::format::{parse_count, LineReader, LineWriter};
use crate::reflect::{Component, ComponentClass, Member, Reflect};
use crate::value::{StorageKind, Value};
use crate::value_codec::{decode_field, encode_field, read_field, write_field, DecodeContext, EncodeContext, FieldRecord};

/// Text form of one component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentRecord {
    /// Component type name
    pub type_name: String,
    /// Members that were written
    pub fields: Vec<FieldRecord>,
}

/// Whether the node codec writes components of this class at all
pub fn is_serializable(class: ComponentClass) -> bool {
    class != ComponentClass::ParticleEmitter
}

const IDENTITY: &[&str] = &["name", "tag", "layer", "active"];

/// Properties never read, by name and component class
fn skip_property(class: ComponentClass, member: &Member) -> bool {
    if !member.writable || IDENTITY.contains(&member.name) {
        return true;
    }
    match class {
        ComponentClass::Renderer => matches!(member.name, "material" | "materials" | "sharedMaterial"),
        ComponentClass::Collider => matches!(member.name, "material" | "mesh"),
        ComponentClass::MeshFilter => member.name == "mesh",
        ComponentClass::Rigidbody => member.name == "inertiaTensorRotation",
        ComponentClass::Camera => matches!(member.name, "pixelRect" | "aspect" | "layerCullDistances"),
        ComponentClass::ParticleEmitter => member.name == "particles",
        ComponentClass::Behaviour => false,
    }
}

fn at_default(member: &Member, value: &Value) -> bool {
    match (member.name, value) {
        ("hideFlags", Value::Enum { member: flags, .. }) => flags == "None",
        ("enabled", Value::Bool(enabled)) => *enabled,
        _ => false,
    }
}

/// Encode the members of a component
pub fn encode_component(component: &dyn Component, ctx: &mut EncodeContext<'_>) -> ComponentRecord {
    let class = component.class();
    let nested = format!("{} {}", ctx.location, component.type_name());
    let outer = std::mem::replace(&mut ctx.location, nested);

    let mut fields = Vec::new();
    for member in component.members() {
        if member.storage == StorageKind::Property && skip_property(class, member) {
            continue;
        }
        let Some(value) = component.get(member.name) else {
            continue;
        };
        if member.storage == StorageKind::Property && at_default(member, &value) {
            continue;
        }
        if let Some(field) = encode_field(member.storage, member.name, &value, ctx) {
            fields.push(field);
        }
    }

    ctx.location = outer;
    ComponentRecord {
        type_name: component.type_name().to_string(),
        fields,
    }
}

/// Write a component block
pub fn write_component(writer: &mut LineWriter, depth: usize, record: &ComponentRecord) {
    writer.line(depth, format_args!("{} {}", record.type_name, record.fields.len()));
    for field in &record.fields {
        write_field(writer, depth + 1, field);
    }
}

/// Read a component block
pub fn read_component(reader: &mut LineReader<'_>) -> Result<ComponentRecord, FormatError> {
    let (line, text) = reader.next_line("component header")?;
    let Some((type_name, count)) = text.split_once(' ') else {
        return Err(FormatError::Expected {
            line,
            expected: "'<ComponentType> <field count>'".to_string(),
            found: text.to_string(),
        });
    };
    let count = parse_count(line, count)?;
    let fields = (0..count)
        .map(|_| read_field(reader))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ComponentRecord {
        type_name: type_name.to_string(),
        fields,
    })
}

/// Decode and assign every member of a block, warning on members that do not fit
pub fn apply_component(record: &ComponentRecord, component: &mut dyn Component, ctx: &mut DecodeContext<'_>) {
    let nested = format!("{} {}", ctx.location, record.type_name);
    let outer = std::mem::replace(&mut ctx.location, nested);

    for field in &record.fields {
        let location = format!("{}.{}", ctx.location, field.name);
        let Some(member) = component.member(&field.name) else {
            ctx.warnings
                .push(location, ReflectError::UnknownMember(field.name.clone()).to_string());
            continue;
        };
        if member.storage != field.storage {
            ctx.warnings.push(
                location,
                format!(
                    "stored as {} but written as {}",
                    member.storage.as_str(),
                    field.storage.as_str()
                ),
            );
            continue;
        }
        if !member.writable {
            ctx.warnings
                .push(location, ReflectError::ReadOnly(field.name.clone()).to_string());
            continue;
        }
        let Some(value) = decode_field(field, ctx) else {
            continue;
        };
        if let Err(e) = component.set(&field.name, value) {
            ctx.warnings.push(location, e.to_string());
        }
    }

    ctx.location = outer;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryAssets;
    use crate::builtin::{BuiltinTable, StandardPrimitives};
    use crate::components::{BoxCollider, Camera, HideFlags, Light, LightType, MeshRenderer};
    use crate::error::WarningLog;
    use crate::reflect::TypeRegistry;
    use crate::scene::PathTable;
    use crate::value::MaterialRef;
    use crate::value_codec::Pass;

    fn encode(component: &dyn Component) -> (ComponentRecord, WarningLog) {
        let table = PathTable::default();
        let assets = MemoryAssets::new();
        let mut warnings = WarningLog::new();
        let mut ctx = EncodeContext {
            nodes: &table,
            assets: &assets,
            warnings: &mut warnings,
            location: "/Test".into(),
        };
        let record = encode_component(component, &mut ctx);
        (record, warnings)
    }

    fn apply(record: &ComponentRecord, component: &mut dyn Component) -> WarningLog {
        let table = PathTable::default();
        let assets = MemoryAssets::new();
        let builtins = BuiltinTable::from_factory(&StandardPrimitives);
        let registry = TypeRegistry::with_builtins();
        let mut warnings = WarningLog::new();
        let mut ctx = DecodeContext {
            pass: Pass::ValueAssignment,
            nodes: &table,
            assets: &assets,
            builtins: &builtins,
            registry: &registry,
            warnings: &mut warnings,
            location: "/Test".into(),
        };
        apply_component(record, component, &mut ctx);
        warnings
    }

    fn text_of(record: &ComponentRecord) -> String {
        let mut writer = LineWriter::new();
        write_component(&mut writer, 1, record);
        writer.finish()
    }

    #[test]
    fn test_default_box_collider() {
        let (record, warnings) = encode(&BoxCollider::default());
        assert!(warnings.is_empty());
        assert_eq!(
            text_of(&record),
            "  BoxCollider 1\n    field isTrigger primitive System.Boolean = False\n"
        );
    }

    #[test]
    fn test_non_default_flags_written() {
        let collider = BoxCollider {
            enabled: false,
            hide_flags: HideFlags::NotEditable,
            ..BoxCollider::default()
        };
        let (record, _) = encode(&collider);
        let names: Vec<_> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["isTrigger", "enabled", "hideFlags"]);
    }

    #[test]
    fn test_renderer_leaky_getters_excluded() {
        let renderer = MeshRenderer {
            shared_materials: vec![Some(MaterialRef::Builtin("Default-Diffuse".into()))],
            ..MeshRenderer::default()
        };
        let (record, _) = encode(&renderer);
        let names: Vec<_> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["castShadows", "receiveShadows", "sharedMaterials"]);
    }

    #[test]
    fn test_camera_derived_properties_excluded() {
        let (record, warnings) = encode(&Camera::default());
        assert!(warnings.is_empty());
        for name in ["pixelRect", "aspect", "layerCullDistances", "worldToCameraMatrix", "velocity"] {
            assert!(record.fields.iter().all(|f| f.name != name), "{name} was written");
        }
        assert!(record.fields.iter().any(|f| f.name == "fieldOfView"));
    }

    #[test]
    fn test_read_and_apply() {
        let light = Light {
            light_type: LightType::Spot,
            intensity: 2.5,
            ..Light::default()
        };
        let (record, _) = encode(&light);
        let text = text_of(&record);

        let parsed = read_component(&mut LineReader::new(&text)).unwrap();
        assert_eq!(parsed, record);

        let mut restored = Light::default();
        let warnings = apply(&parsed, &mut restored);
        assert!(warnings.is_empty());
        assert_eq!(restored, light);
    }

    #[test]
    fn test_mismatched_members_warn() {
        let text = "BoxCollider 4\n  property isTrigger primitive System.Boolean = True\n  field radius primitive System.Single = 1.00000\n  property enabled primitive System.Boolean = False\n  property hideFlags primitive HideFlags = Sideways\n";
        let record = read_component(&mut LineReader::new(text)).unwrap();

        let mut collider = BoxCollider::default();
        let warnings = apply(&record, &mut collider);
        assert_eq!(warnings.len(), 3);
        assert!(!collider.is_trigger);
        assert!(!collider.enabled);
        assert_eq!(collider.hide_flags, HideFlags::None);
    }

    #[test]
    fn test_read_only_member_warns() {
        let text = "MeshRenderer 1\n  property isVisible primitive System.Boolean = False\n";
        let record = read_component(&mut LineReader::new(text)).unwrap();
        let warnings = apply(&record, &mut MeshRenderer::default());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            read_component(&mut LineReader::new("BoxCollider\n")),
            Err(FormatError::Expected { .. })
        ));
        assert!(matches!(
            read_component(&mut LineReader::new("BoxCollider many\n")),
            Err(FormatError::InvalidNumber { .. })
        ));
    }
}
