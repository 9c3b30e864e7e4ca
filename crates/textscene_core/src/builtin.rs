// SPDX-License-Identifier: MIT OR Apache-2.0
//! Builtin primitive meshes and the default material.
//!
//! Builtin resources have no asset path, so documents name them. The name
//! table is read off throwaway primitive nodes built by a
//! [`PrimitiveFactory`], once per deserializer.

use crate::components::{BoxCollider, MeshFilter, MeshRenderer, SphereCollider};
use crate::node::Node;
use crate::reflect::Reflect;
use crate::value::{MaterialRef, MeshRef, Value};

/// Name of the engine's default material
pub const DEFAULT_MATERIAL: &str = "Default-Diffuse";

/// Primitive shapes the engine can create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveShape {
    /// Unit cube
    Cube,
    /// Unit sphere
    Sphere,
    /// Flat 10x10 plane
    Plane,
    /// Capsule
    Capsule,
    /// Cylinder
    Cylinder,
}

impl PrimitiveShape {
    /// Every shape
    pub const ALL: [Self; 5] = [Self::Cube, Self::Sphere, Self::Plane, Self::Capsule, Self::Cylinder];

    /// Name of the shape's mesh
    pub fn mesh_name(self) -> &'static str {
        match self {
            Self::Cube => "Cube",
            Self::Sphere => "Sphere",
            Self::Plane => "Plane",
            Self::Capsule => "Capsule",
            Self::Cylinder => "Cylinder",
        }
    }
}

/// Creates primitive nodes
pub trait PrimitiveFactory {
    /// Create a node showing the shape
    fn create_primitive(&self, shape: PrimitiveShape) -> Node;
}

/// Primitives as the engine creates them
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPrimitives;

impl PrimitiveFactory for StandardPrimitives {
    fn create_primitive(&self, shape: PrimitiveShape) -> Node {
        let mesh = MeshFilter {
            shared_mesh: Some(MeshRef::Builtin(shape.mesh_name().to_string())),
            ..MeshFilter::default()
        };
        let renderer = MeshRenderer {
            shared_materials: vec![Some(MaterialRef::Builtin(DEFAULT_MATERIAL.to_string()))],
            ..MeshRenderer::default()
        };
        let node = Node::new(shape.mesh_name())
            .with_component(mesh)
            .with_component(renderer);
        match shape {
            PrimitiveShape::Sphere => node.with_component(SphereCollider::default()),
            _ => node.with_component(BoxCollider::default()),
        }
    }
}

/// Name-keyed builtin meshes and materials
#[derive(Debug, Clone, Default)]
pub struct BuiltinTable {
    meshes: Vec<String>,
    materials: Vec<String>,
}

impl BuiltinTable {
    /// Populate from freshly created primitives, which are then dropped
    pub fn from_factory(factory: &dyn PrimitiveFactory) -> Self {
        let mut table = Self::default();
        for shape in PrimitiveShape::ALL {
            let node = factory.create_primitive(shape);
            let mesh = node
                .component_by_name("MeshFilter")
                .and_then(|filter| filter.get("sharedMesh"));
            if let Some(Value::BuiltinMesh(name)) = mesh {
                table.meshes.push(name);
            }
            if shape == PrimitiveShape::Cylinder {
                let material = node
                    .component_by_name("MeshRenderer")
                    .and_then(|renderer| renderer.get("sharedMaterial"));
                if let Some(Value::BuiltinMaterial(name)) = material {
                    table.materials.push(name);
                }
            }
        }
        tracing::debug!(
            "Builtin table: {} meshes, {} materials",
            table.meshes.len(),
            table.materials.len()
        );
        table
    }

    /// Builtin mesh by name
    pub fn mesh(&self, name: &str) -> Option<&str> {
        self.meshes.iter().find(|m| *m == name).map(String::as_str)
    }

    /// Builtin material by name
    pub fn material(&self, name: &str) -> Option<&str> {
        self.materials.iter().find(|m| *m == name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let table = BuiltinTable::from_factory(&StandardPrimitives);
        for shape in PrimitiveShape::ALL {
            assert_eq!(table.mesh(shape.mesh_name()), Some(shape.mesh_name()));
        }
        assert_eq!(table.material(DEFAULT_MATERIAL), Some(DEFAULT_MATERIAL));
        assert!(table.mesh("Torus").is_none());
    }

    struct NoMaterials;

    impl PrimitiveFactory for NoMaterials {
        fn create_primitive(&self, shape: PrimitiveShape) -> Node {
            Node::new(shape.mesh_name())
        }
    }

    #[test]
    fn test_factory_without_resources() {
        let table = BuiltinTable::from_factory(&NoMaterials);
        assert!(table.mesh("Cube").is_none());
        assert!(table.material(DEFAULT_MATERIAL).is_none());
    }
}
