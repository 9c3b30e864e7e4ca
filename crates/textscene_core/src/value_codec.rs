// SPDX-License-Identifier: MIT OR Apache-2.0
//! Encoding of single values.
//!
//! A value becomes a [`ValueRecord`]: kind token, declared type, value text
//! and, for arrays and complex values, nested lines one level deeper.
//!
//! ```text
//! field materialList array Material[] = 2
//!   builtinmaterial Material = Default-Diffuse
//!   null
//! property spring complex JointSpring = 3
//!   field spring primitive System.Single = 4.00000
//!   ...
//! ```

use crate::asset::AssetResolver;
use crate::builtin::BuiltinTable;
use crate::error::{DecodeError, EncodeError, FormatError, WarningLog};
use crate::format::{
    escape, float_tuple, parse_count, parse_float, parse_floats, unescape, LineReader, LineWriter,
};
use crate::reflect::TypeRegistry;
use crate::scene::NodeQuery;
use crate::value::{
    type_names, ArrayValue, AssetId, AssetRef, Color, ComponentLink, Record, Rect, StorageKind,
    Value, ValueKind,
};
use glam::{Quat, Vec2, Vec3, Vec4};

/// Which sweep of a load is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Node and component shells are created, links are not resolved
    CreateObjects,
    /// Values are assigned, links resolve against the finished forest
    ValueAssignment,
}

/// Lines nested under a value header
#[derive(Debug, Clone, PartialEq)]
pub enum Nested {
    /// Nothing nested
    Leaf,
    /// Array entries, `None` for null
    Entries(Vec<Option<ValueRecord>>),
    /// Complex members
    Members(Vec<FieldRecord>),
}

/// Text form of one value
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRecord {
    /// Encoding family
    pub kind: ValueKind,
    /// Declared type name
    pub type_name: String,
    /// Text after `=`, the count for arrays and complex values
    pub text: String,
    /// Nested lines
    pub nested: Nested,
}

impl ValueRecord {
    /// A single-line value
    pub fn leaf(kind: ValueKind, type_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            text: text.into(),
            nested: Nested::Leaf,
        }
    }
}

/// Text form of one named member
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    /// Field or property
    pub storage: StorageKind,
    /// Member name
    pub name: String,
    /// Member value
    pub value: ValueRecord,
}

/// State shared by encoders
pub struct EncodeContext<'a> {
    /// Paths of live nodes
    pub nodes: &'a dyn NodeQuery,
    /// Asset ids
    pub assets: &'a dyn AssetResolver,
    /// Collected warnings
    pub warnings: &'a mut WarningLog,
    /// Location reported with warnings
    pub location: String,
}

/// State shared by decoders
pub struct DecodeContext<'a> {
    /// Current sweep
    pub pass: Pass,
    /// Paths of loaded nodes
    pub nodes: &'a dyn NodeQuery,
    /// Asset lookups
    pub assets: &'a dyn AssetResolver,
    /// Builtin mesh and material names
    pub builtins: &'a BuiltinTable,
    /// Enum member tables
    pub registry: &'a TypeRegistry,
    /// Collected warnings
    pub warnings: &'a mut WarningLog,
    /// Location reported with warnings
    pub location: String,
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Encode a value, `Ok(None)` when it is skipped without a warning
pub fn encode_value(value: &Value, ctx: &mut EncodeContext<'_>) -> Result<Option<ValueRecord>, EncodeError> {
    use ValueKind::Primitive;

    let type_name = value.type_name();
    let record = match value {
        Value::Int(v) => ValueRecord::leaf(Primitive, type_name, v.to_string()),
        Value::Float(v) => ValueRecord::leaf(Primitive, type_name, crate::format::format_float(*v)),
        Value::Bool(v) => ValueRecord::leaf(Primitive, type_name, bool_text(*v)),
        Value::String(v) => ValueRecord::leaf(Primitive, type_name, escape(v)),
        Value::Enum { member, .. } => ValueRecord::leaf(Primitive, type_name, member.clone()),
        Value::Vector2(v) => ValueRecord::leaf(Primitive, type_name, float_tuple(&v.to_array())),
        Value::Vector3(v) => ValueRecord::leaf(Primitive, type_name, float_tuple(&v.to_array())),
        Value::Vector4(v) => ValueRecord::leaf(Primitive, type_name, float_tuple(&v.to_array())),
        Value::Quaternion(q) => ValueRecord::leaf(Primitive, type_name, float_tuple(&q.to_array())),
        Value::Color(c) => ValueRecord::leaf(Primitive, type_name, float_tuple(&[c.r, c.g, c.b, c.a])),
        Value::Rect(r) => {
            ValueRecord::leaf(Primitive, type_name, float_tuple(&[r.x, r.y, r.width, r.height]))
        }
        Value::Matrix(_) => {
            tracing::trace!("Skipping matrix at {}", ctx.location);
            return Ok(None);
        }
        Value::Array(array) => {
            let mut entries = Vec::with_capacity(array.items.len());
            for (index, item) in array.items.iter().enumerate() {
                let entry = match item {
                    Some(v) => encode_value(v, ctx).map_err(|e| EncodeError::Element {
                        index,
                        source: Box::new(e),
                    })?,
                    None => None,
                };
                entries.push(entry);
            }
            ValueRecord {
                kind: ValueKind::Array,
                type_name,
                text: entries.len().to_string(),
                nested: Nested::Entries(entries),
            }
        }
        Value::Complex(record) => {
            let members: Vec<FieldRecord> = record
                .members
                .iter()
                .filter_map(|m| encode_field(m.storage, &m.name, &m.value, ctx))
                .collect();
            ValueRecord {
                kind: ValueKind::Complex,
                type_name,
                text: members.len().to_string(),
                nested: Nested::Members(members),
            }
        }
        Value::Asset(asset) => match encode_asset(asset, ctx)? {
            Some(text) => ValueRecord::leaf(ValueKind::Asset, type_name, text),
            None => return Ok(None),
        },
        Value::Node(id) => {
            ValueRecord::leaf(ValueKind::SceneLink, type_name, link_path(ctx, *id)?)
        }
        Value::Component(link) => {
            ValueRecord::leaf(ValueKind::SceneLink, type_name, link_path(ctx, link.node)?)
        }
        Value::BuiltinMesh(name) => ValueRecord::leaf(ValueKind::BuiltinMesh, type_name, name.clone()),
        Value::BuiltinMaterial(name) => {
            ValueRecord::leaf(ValueKind::BuiltinMaterial, type_name, name.clone())
        }
        Value::Opaque { type_name, name } => {
            return Err(EncodeError::Unrepresentable {
                type_name: type_name.clone(),
                name: name.clone(),
            })
        }
    };
    Ok(Some(record))
}

fn encode_asset(asset: &AssetRef, ctx: &mut EncodeContext<'_>) -> Result<Option<String>, EncodeError> {
    if asset.path.is_empty() {
        if asset.name.is_empty() {
            return Ok(None);
        }
        return Err(EncodeError::Unrepresentable {
            type_name: asset.type_name.clone(),
            name: asset.name.clone(),
        });
    }
    let id = asset
        .id
        .or_else(|| ctx.assets.path_to_guid(&asset.path))
        .map(|id| id.to_string())
        .unwrap_or_default();
    Ok(Some(format!("{}, {}, {}", asset.path, asset.name, id)))
}

fn link_path(ctx: &mut EncodeContext<'_>, id: crate::node::NodeId) -> Result<String, EncodeError> {
    let path = ctx.nodes.full_path(id).ok_or(EncodeError::Dangling)?.to_string();
    let sharing = ctx.nodes.find_by_path(&path).len();
    if sharing > 1 {
        ctx.warnings.push(
            ctx.location.clone(),
            format!("'{path}' is shared by {sharing} nodes, the reference may resolve to another node"),
        );
    }
    Ok(path)
}

/// Encode a named member, turning failures into warnings
pub fn encode_field(
    storage: StorageKind,
    name: &str,
    value: &Value,
    ctx: &mut EncodeContext<'_>,
) -> Option<FieldRecord> {
    let nested = format!("{}.{}", ctx.location, name);
    let outer = std::mem::replace(&mut ctx.location, nested);
    let result = encode_value(value, ctx);
    let location = std::mem::replace(&mut ctx.location, outer);
    match result {
        Ok(Some(value)) => Some(FieldRecord {
            storage,
            name: name.to_string(),
            value,
        }),
        Ok(None) => None,
        Err(e) => {
            ctx.warnings.push(location, format!("cannot be saved: {e}"));
            None
        }
    }
}

/// Decode a value, `Ok(None)` when it stays unset
pub fn decode_value(record: &ValueRecord, ctx: &mut DecodeContext<'_>) -> Result<Option<Value>, DecodeError> {
    let value = match record.kind {
        ValueKind::Primitive => decode_primitive(&record.type_name, &record.text, ctx.registry)?,
        ValueKind::Array => {
            let Nested::Entries(entries) = &record.nested else {
                return Ok(None);
            };
            let element_type = record
                .type_name
                .strip_suffix("[]")
                .unwrap_or(&record.type_name)
                .to_string();
            let mut items = Vec::with_capacity(entries.len());
            for (index, entry) in entries.iter().enumerate() {
                let item = match entry {
                    Some(entry) => match decode_value(entry, ctx) {
                        Ok(item) => item,
                        Err(e) => {
                            ctx.warnings.push(format!("{}[{index}]", ctx.location), e.to_string());
                            None
                        }
                    },
                    None => None,
                };
                items.push(item);
            }
            Value::Array(ArrayValue { element_type, items })
        }
        ValueKind::Complex => {
            let Nested::Members(members) = &record.nested else {
                return Ok(None);
            };
            let mut complex = Record::new(record.type_name.clone());
            for member in members {
                if let Some(value) = decode_field(member, ctx) {
                    complex.push(member.storage, member.name.clone(), value);
                }
            }
            Value::Complex(complex)
        }
        ValueKind::Asset => Value::Asset(decode_asset(&record.type_name, &record.text, ctx)?),
        ValueKind::SceneLink => {
            if ctx.pass != Pass::ValueAssignment {
                return Ok(None);
            }
            resolve_link(&record.type_name, &record.text, ctx)?
        }
        ValueKind::BuiltinMesh => match ctx.builtins.mesh(&record.text) {
            Some(name) => Value::BuiltinMesh(name.to_string()),
            None => {
                return Err(DecodeError::UnknownBuiltin {
                    kind: "mesh",
                    name: record.text.clone(),
                })
            }
        },
        ValueKind::BuiltinMaterial => match ctx.builtins.material(&record.text) {
            Some(name) => Value::BuiltinMaterial(name.to_string()),
            None => {
                return Err(DecodeError::UnknownBuiltin {
                    kind: "material",
                    name: record.text.clone(),
                })
            }
        },
    };
    Ok(Some(value))
}

/// Decode a named member, turning failures into warnings
pub fn decode_field(field: &FieldRecord, ctx: &mut DecodeContext<'_>) -> Option<Value> {
    let nested = format!("{}.{}", ctx.location, field.name);
    let outer = std::mem::replace(&mut ctx.location, nested);
    let result = decode_value(&field.value, ctx);
    let location = std::mem::replace(&mut ctx.location, outer);
    match result {
        Ok(value) => value,
        Err(e) => {
            ctx.warnings.push(location, e.to_string());
            None
        }
    }
}

fn fixed<const N: usize>(type_name: &str, text: &str) -> Result<[f32; N], DecodeError> {
    let values = parse_floats(text);
    if values.len() < N {
        return Err(DecodeError::Parse {
            type_name: type_name.to_string(),
            text: text.to_string(),
        });
    }
    let mut out = [0.0; N];
    out.copy_from_slice(&values[..N]);
    Ok(out)
}

fn decode_primitive(type_name: &str, text: &str, registry: &TypeRegistry) -> Result<Value, DecodeError> {
    let parse_error = || DecodeError::Parse {
        type_name: type_name.to_string(),
        text: text.to_string(),
    };
    Ok(match type_name {
        type_names::INT => Value::Int(text.trim().parse().map_err(|_| parse_error())?),
        type_names::FLOAT => Value::Float(parse_float(text)),
        type_names::BOOL => {
            if text.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if text.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                return Err(parse_error());
            }
        }
        type_names::STRING => Value::String(unescape(text)),
        type_names::VECTOR2 => Value::Vector2(Vec2::from_array(fixed(type_name, text)?)),
        type_names::VECTOR3 => Value::Vector3(Vec3::from_array(fixed(type_name, text)?)),
        type_names::VECTOR4 => Value::Vector4(Vec4::from_array(fixed(type_name, text)?)),
        type_names::QUATERNION => Value::Quaternion(Quat::from_array(fixed(type_name, text)?)),
        type_names::COLOR => {
            let [r, g, b, a] = fixed::<4>(type_name, text)?;
            Value::Color(Color::rgba(r, g, b, a))
        }
        type_names::RECT => {
            let [x, y, width, height] = fixed::<4>(type_name, text)?;
            Value::Rect(Rect::new(x, y, width, height))
        }
        _ => {
            let members = registry
                .enum_members(type_name)
                .ok_or_else(|| DecodeError::UnknownType(type_name.to_string()))?;
            let member = text.trim();
            if !members.contains(&member) {
                return Err(DecodeError::UnknownEnumMember {
                    type_name: type_name.to_string(),
                    member: member.to_string(),
                });
            }
            Value::Enum {
                type_name: type_name.to_string(),
                member: member.to_string(),
            }
        }
    })
}

fn decode_asset(type_name: &str, text: &str, ctx: &mut DecodeContext<'_>) -> Result<AssetRef, DecodeError> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let mut path = parts.first().copied().unwrap_or_default().to_string();
    let name = parts.get(1).copied().unwrap_or_default();

    if let Some(id) = parts.get(2).and_then(|t| AssetId::parse(t)) {
        match ctx.assets.guid_to_path(id) {
            Some(current) => path = current,
            None => tracing::debug!("Asset id {} unknown, falling back to '{}'", id, path),
        }
    }
    if path.is_empty() {
        return Err(DecodeError::MissingAsset(text.to_string()));
    }

    let found = if name.is_empty() {
        ctx.assets.load_asset(&path, type_name)
    } else {
        ctx.assets
            .assets_at_path(&path)
            .into_iter()
            .find(|asset| asset.name == name && asset.type_name == type_name)
    };
    found.ok_or_else(|| DecodeError::MissingAsset(format!("{path} ({name})")))
}

fn resolve_link(type_name: &str, path: &str, ctx: &mut DecodeContext<'_>) -> Result<Value, DecodeError> {
    let matches = ctx.nodes.find_by_path(path);
    let Some(&target) = matches.first() else {
        return Err(DecodeError::MissingTarget(path.to_string()));
    };
    if matches.len() > 1 {
        tracing::debug!("'{}' matches {} nodes, using the first", path, matches.len());
    }
    if type_name == type_names::GAME_OBJECT {
        return Ok(Value::Node(target));
    }
    if ctx.nodes.has_component(target, type_name) {
        Ok(Value::Component(ComponentLink::new(target, type_name)))
    } else {
        Err(DecodeError::MissingComponent {
            path: path.to_string(),
            type_name: type_name.to_string(),
        })
    }
}

fn write_nested(writer: &mut LineWriter, depth: usize, nested: &Nested) {
    match nested {
        Nested::Leaf => {}
        Nested::Entries(entries) => {
            for entry in entries {
                match entry {
                    Some(value) => {
                        writer.line(
                            depth,
                            format_args!("{} {} = {}", value.kind.as_str(), value.type_name, value.text),
                        );
                        write_nested(writer, depth + 1, &value.nested);
                    }
                    None => writer.line(depth, "null"),
                }
            }
        }
        Nested::Members(members) => {
            for member in members {
                write_field(writer, depth, member);
            }
        }
    }
}

/// Write a member line and its nested lines
pub fn write_field(writer: &mut LineWriter, depth: usize, field: &FieldRecord) {
    writer.line(
        depth,
        format_args!(
            "{} {} {} {} = {}",
            field.storage.as_str(),
            field.name,
            field.value.kind.as_str(),
            field.value.type_name,
            field.value.text
        ),
    );
    write_nested(writer, depth + 1, &field.value.nested);
}

fn split_assignment(line: usize, text: &str) -> Result<(&str, &str), FormatError> {
    if let Some(parts) = text.split_once(" = ") {
        return Ok(parts);
    }
    text.strip_suffix(" =")
        .map(|head| (head, ""))
        .ok_or_else(|| FormatError::Expected {
            line,
            expected: "'<header> = <value>'".to_string(),
            found: text.to_string(),
        })
}

fn parse_kind(line: usize, token: &str) -> Result<ValueKind, FormatError> {
    token.parse().map_err(|()| FormatError::UnknownToken {
        line,
        what: "value kind",
        token: token.to_string(),
    })
}

fn read_body(
    reader: &mut LineReader<'_>,
    line: usize,
    kind: ValueKind,
    type_name: &str,
    text: &str,
) -> Result<ValueRecord, FormatError> {
    let nested = match kind {
        ValueKind::Array => {
            let count = parse_count(line, text)?;
            let entries = (0..count)
                .map(|_| read_entry(reader))
                .collect::<Result<Vec<_>, _>>()?;
            Nested::Entries(entries)
        }
        ValueKind::Complex => {
            let count = parse_count(line, text)?;
            let members = (0..count)
                .map(|_| read_field(reader))
                .collect::<Result<Vec<_>, _>>()?;
            Nested::Members(members)
        }
        _ => Nested::Leaf,
    };
    Ok(ValueRecord {
        kind,
        type_name: type_name.to_string(),
        text: text.to_string(),
        nested,
    })
}

fn read_entry(reader: &mut LineReader<'_>) -> Result<Option<ValueRecord>, FormatError> {
    let (line, text) = reader.next_line("array entry")?;
    if text == "null" {
        return Ok(None);
    }
    let (head, value) = split_assignment(line, text)?;
    let tokens: Vec<&str> = head.split_whitespace().collect();
    let [kind, type_name] = tokens[..] else {
        return Err(FormatError::Expected {
            line,
            expected: "'<kind> <type> = <value>'".to_string(),
            found: text.to_string(),
        });
    };
    let kind = parse_kind(line, kind)?;
    read_body(reader, line, kind, type_name, value).map(Some)
}

/// Read a member line and its nested lines
pub fn read_field(reader: &mut LineReader<'_>) -> Result<FieldRecord, FormatError> {
    let (line, text) = reader.next_line("field")?;
    let (head, value) = split_assignment(line, text)?;
    let tokens: Vec<&str> = head.split_whitespace().collect();
    let [storage, name, kind, type_name] = tokens[..] else {
        return Err(FormatError::Expected {
            line,
            expected: "'<storage> <name> <kind> <type> = <value>'".to_string(),
            found: text.to_string(),
        });
    };
    let storage = storage.parse().map_err(|()| FormatError::UnknownToken {
        line,
        what: "storage kind",
        token: storage.to_string(),
    })?;
    let kind = parse_kind(line, kind)?;
    Ok(FieldRecord {
        storage,
        name: name.to_string(),
        value: read_body(reader, line, kind, type_name, value)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryAssets;
    use crate::builtin::StandardPrimitives;
    use crate::node::Node;
    use crate::scene::{PathTable, Scene};

    struct Fixture {
        assets: MemoryAssets,
        table: PathTable,
        builtins: BuiltinTable,
        registry: TypeRegistry,
        warnings: WarningLog,
    }

    impl Fixture {
        fn new(scene: &Scene) -> Self {
            Self {
                assets: MemoryAssets::new(),
                table: scene.path_table(),
                builtins: BuiltinTable::from_factory(&StandardPrimitives),
                registry: TypeRegistry::with_builtins(),
                warnings: WarningLog::new(),
            }
        }

        fn encode(&mut self, value: &Value) -> Result<Option<ValueRecord>, EncodeError> {
            let mut ctx = EncodeContext {
                nodes: &self.table,
                assets: &self.assets,
                warnings: &mut self.warnings,
                location: "test".into(),
            };
            encode_value(value, &mut ctx)
        }

        fn decode(&mut self, record: &ValueRecord, pass: Pass) -> Result<Option<Value>, DecodeError> {
            let mut ctx = DecodeContext {
                pass,
                nodes: &self.table,
                assets: &self.assets,
                builtins: &self.builtins,
                registry: &self.registry,
                warnings: &mut self.warnings,
                location: "test".into(),
            };
            decode_value(record, &mut ctx)
        }
    }

    fn text_of(field: &FieldRecord) -> String {
        let mut writer = LineWriter::new();
        write_field(&mut writer, 0, field);
        writer.finish()
    }

    #[test]
    fn test_primitive_lines() {
        let mut fx = Fixture::new(&Scene::new());
        let record = fx.encode(&Value::Vector3(Vec3::new(1.0, -2.0, 0.5))).unwrap().unwrap();
        let field = FieldRecord {
            storage: StorageKind::Property,
            name: "center".into(),
            value: record,
        };
        assert_eq!(
            text_of(&field),
            "property center primitive Vector3 = (1.00000, -2.00000, 0.50000)\n"
        );
    }

    #[test]
    fn test_infinity_round_trip() {
        let mut fx = Fixture::new(&Scene::new());
        let record = fx.encode(&Value::Float(f32::INFINITY)).unwrap().unwrap();
        assert_eq!(record.text, "Infinity");
        assert_eq!(
            fx.decode(&record, Pass::ValueAssignment).unwrap(),
            Some(Value::Float(f32::INFINITY))
        );
    }

    #[test]
    fn test_unparsable_float_is_nan() {
        let mut fx = Fixture::new(&Scene::new());
        let record = ValueRecord::leaf(ValueKind::Primitive, type_names::FLOAT, "oops");
        let Some(Value::Float(v)) = fx.decode(&record, Pass::ValueAssignment).unwrap() else {
            panic!("expected a float");
        };
        assert!(v.is_nan());
    }

    #[test]
    fn test_unknown_enum_member() {
        let mut fx = Fixture::new(&Scene::new());
        let record = ValueRecord::leaf(ValueKind::Primitive, "LightType", "Laser");
        assert_eq!(
            fx.decode(&record, Pass::ValueAssignment),
            Err(DecodeError::UnknownEnumMember {
                type_name: "LightType".into(),
                member: "Laser".into()
            })
        );
        let record = ValueRecord::leaf(ValueKind::Primitive, "LightType", "Spot");
        assert!(fx.decode(&record, Pass::ValueAssignment).unwrap().is_some());
    }

    #[test]
    fn test_empty_array_header_only() {
        let mut fx = Fixture::new(&Scene::new());
        let value = Value::Array(ArrayValue {
            element_type: "Material".into(),
            items: Vec::new(),
        });
        let record = fx.encode(&value).unwrap().unwrap();
        let field = FieldRecord {
            storage: StorageKind::Field,
            name: "materialList".into(),
            value: record,
        };
        let text = text_of(&field);
        assert_eq!(text, "field materialList array Material[] = 0\n");

        let mut reader = LineReader::new(&text);
        let parsed = read_field(&mut reader).unwrap();
        assert_eq!(parsed, field);
        assert_eq!(fx.decode(&parsed.value, Pass::ValueAssignment).unwrap(), Some(value));
    }

    #[test]
    fn test_array_entries_with_null() {
        let text = "field materialList array Material[] = 2\n  builtinmaterial Material = Default-Diffuse\n  null\n";
        let mut reader = LineReader::new(text);
        let field = read_field(&mut reader).unwrap();

        let mut fx = Fixture::new(&Scene::new());
        let value = fx.decode(&field.value, Pass::ValueAssignment).unwrap().unwrap();
        assert_eq!(
            value,
            Value::Array(ArrayValue {
                element_type: "Material".into(),
                items: vec![Some(Value::BuiltinMaterial("Default-Diffuse".into())), None],
            })
        );

        let encoded = fx.encode(&value).unwrap().unwrap();
        assert_eq!(
            text_of(&FieldRecord {
                storage: StorageKind::Field,
                name: "materialList".into(),
                value: encoded
            }),
            text
        );
    }

    #[test]
    fn test_unrepresentable_element_drops_array() {
        let mut fx = Fixture::new(&Scene::new());
        let value = Value::Array(ArrayValue {
            element_type: "Material".into(),
            items: vec![Some(Value::Opaque {
                type_name: "Material".into(),
                name: "Runtime".into(),
            })],
        });
        assert!(matches!(fx.encode(&value), Err(EncodeError::Element { index: 0, .. })));
    }

    #[test]
    fn test_complex_nested_lines() {
        let mut record = Record::new("JointSpring");
        record.push(StorageKind::Field, "spring", Value::Float(4.0));
        record.push(StorageKind::Field, "damper", Value::Float(1.0));

        let mut fx = Fixture::new(&Scene::new());
        let encoded = fx.encode(&Value::Complex(record.clone())).unwrap().unwrap();
        let text = text_of(&FieldRecord {
            storage: StorageKind::Property,
            name: "spring".into(),
            value: encoded,
        });
        assert_eq!(
            text,
            "property spring complex JointSpring = 2\n  field spring primitive System.Single = 4.00000\n  field damper primitive System.Single = 1.00000\n"
        );

        let parsed = read_field(&mut LineReader::new(&text)).unwrap();
        assert_eq!(
            fx.decode(&parsed.value, Pass::ValueAssignment).unwrap(),
            Some(Value::Complex(record))
        );
    }

    #[test]
    fn test_asset_prefers_id() {
        let mut fx = Fixture::new(&Scene::new());
        let id = fx.assets.add_asset("Assets/Moved/Red.mat", "Material", "Red");
        let text = format!("Assets/Old/Red.mat, Red, {id}");
        let record = ValueRecord::leaf(ValueKind::Asset, "Material", text);

        let Some(Value::Asset(asset)) = fx.decode(&record, Pass::ValueAssignment).unwrap() else {
            panic!("expected an asset");
        };
        assert_eq!(asset.path, "Assets/Moved/Red.mat");
    }

    #[test]
    fn test_asset_picks_named_sub_asset() {
        let mut fx = Fixture::new(&Scene::new());
        fx.assets.add_asset("Assets/Boat.obj", "Mesh", "Hull");
        fx.assets.add_asset("Assets/Boat.obj", "Mesh", "Sail");

        let record = ValueRecord::leaf(ValueKind::Asset, "Mesh", "Assets/Boat.obj, Sail, ");
        let Some(Value::Asset(asset)) = fx.decode(&record, Pass::ValueAssignment).unwrap() else {
            panic!("expected an asset");
        };
        assert_eq!(asset.name, "Sail");

        let missing = ValueRecord::leaf(ValueKind::Asset, "Mesh", "Assets/Boat.obj, Mast, ");
        assert!(matches!(
            fx.decode(&missing, Pass::ValueAssignment),
            Err(DecodeError::MissingAsset(_))
        ));
    }

    #[test]
    fn test_asset_text_includes_id() {
        let mut fx = Fixture::new(&Scene::new());
        let id = fx.assets.add_asset("Assets/Red.mat", "Material", "Red");
        let value = Value::Asset(AssetRef::new("Material", "Assets/Red.mat", "Red"));
        let record = fx.encode(&value).unwrap().unwrap();
        assert_eq!(record.text, format!("Assets/Red.mat, Red, {id}"));
    }

    #[test]
    fn test_scenelink_deferred_until_assignment() {
        let scene = Scene::from_roots(vec![Node::new("Door")]);
        let door = scene.roots[0].id;
        let mut fx = Fixture::new(&scene);
        let record = ValueRecord::leaf(ValueKind::SceneLink, "GameObject", "/Door");

        assert_eq!(fx.decode(&record, Pass::CreateObjects).unwrap(), None);
        assert_eq!(
            fx.decode(&record, Pass::ValueAssignment).unwrap(),
            Some(Value::Node(door))
        );

        let transform = ValueRecord::leaf(ValueKind::SceneLink, "Transform", "/Door");
        assert_eq!(
            fx.decode(&transform, Pass::ValueAssignment).unwrap(),
            Some(Value::Component(ComponentLink::new(door, "Transform")))
        );

        let collider = ValueRecord::leaf(ValueKind::SceneLink, "BoxCollider", "/Door");
        assert!(matches!(
            fx.decode(&collider, Pass::ValueAssignment),
            Err(DecodeError::MissingComponent { .. })
        ));
    }

    #[test]
    fn test_scenelink_encode_warns_on_shared_path() {
        let scene = Scene::from_roots(vec![Node::new("Twin"), Node::new("Twin")]);
        let first = scene.roots[0].id;
        let mut fx = Fixture::new(&scene);

        let record = fx.encode(&Value::Node(first)).unwrap().unwrap();
        assert_eq!(record.text, "/Twin");
        assert_eq!(fx.warnings.len(), 1);

        assert_eq!(
            fx.encode(&Value::Node(crate::node::NodeId::new())),
            Err(EncodeError::Dangling)
        );
    }

    #[test]
    fn test_matrix_skipped_silently() {
        let mut fx = Fixture::new(&Scene::new());
        assert_eq!(fx.encode(&Value::Matrix(glam::Mat4::IDENTITY)), Ok(None));
        assert!(fx.warnings.is_empty());
    }

    #[test]
    fn test_string_with_newline_and_empty_value() {
        let mut fx = Fixture::new(&Scene::new());
        let record = fx.encode(&Value::String("a\nb".into())).unwrap().unwrap();
        assert_eq!(record.text, "a\\nb");

        let mut reader = LineReader::new("field nextScene primitive System.String = \n");
        let field = read_field(&mut reader).unwrap();
        assert_eq!(
            fx.decode(&field.value, Pass::ValueAssignment).unwrap(),
            Some(Value::String(String::new()))
        );

        let record = fx.encode(&Value::String("end  ".into())).unwrap().unwrap();
        let line = format!("field nextScene primitive System.String = {}\n", record.text);
        let field = read_field(&mut LineReader::new(&line)).unwrap();
        assert_eq!(
            fx.decode(&field.value, Pass::ValueAssignment).unwrap(),
            Some(Value::String("end  ".into()))
        );
    }

    #[test]
    fn test_malformed_field_lines() {
        let mut reader = LineReader::new("field isTrigger primitive = False\n");
        assert!(matches!(read_field(&mut reader), Err(FormatError::Expected { .. })));

        let mut reader = LineReader::new("member isTrigger primitive System.Boolean = False\n");
        assert!(matches!(
            read_field(&mut reader),
            Err(FormatError::UnknownToken { what: "storage kind", .. })
        ));

        let mut reader = LineReader::new("field list array Material[] = 2\n  null\n");
        assert!(matches!(
            read_field(&mut reader),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }
}
