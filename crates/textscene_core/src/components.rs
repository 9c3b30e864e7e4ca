// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in component types.
//!
//! These cover the engine components a scene document commonly carries:
//! - colliders, mesh filters and renderers
//! - lights, cameras and audio sources
//! - rigidbodies and hinge joints
//! - legacy particle emitters, which cannot be saved
//! - `LevelLinks`, a script component holding cross references
//!
//! Member names follow the engine's camelCase spelling since they are
//! written verbatim into documents.

use crate::error::ReflectError;
use crate::node::NodeId;
use crate::reflect::{
    apply, assign, assign_link, capture, Component, ComponentClass, Member, Reflect, ReflectValue,
    TypeRegistry,
};
use crate::value::{type_names, AssetRef, Color, ComponentLink, MaterialRef, MeshRef, Rect, Value};
use glam::{Mat4, Vec3};

crate::reflect_enum! {
    /// Editor visibility and persistence flags
    #[derive(Default)]
    pub enum HideFlags as "HideFlags" {
        /// Visible and editable
        #[default]
        None,
        /// Hidden from the hierarchy
        HideInHierarchy,
        /// Hidden from the inspector
        HideInInspector,
        /// Never saved
        DontSave,
        /// Visible but locked
        NotEditable,
    }
}

crate::reflect_enum! {
    /// Light types
    #[derive(Default)]
    pub enum LightType as "LightType" {
        /// Cone light
        Spot,
        /// Infinitely distant light
        Directional,
        /// Omnidirectional light
        #[default]
        Point,
    }
}

crate::reflect_enum! {
    /// What a camera clears before rendering
    #[derive(Default)]
    pub enum CameraClearFlags as "CameraClearFlags" {
        /// Clear with the skybox
        #[default]
        Skybox,
        /// Clear with the background color
        SolidColor,
        /// Clear depth only
        Depth,
        /// Keep previous contents
        Nothing,
    }
}

crate::reflect_enum! {
    /// Rigidbody interpolation mode
    #[derive(Default)]
    pub enum RigidbodyInterpolation as "RigidbodyInterpolation" {
        /// No interpolation
        #[default]
        None,
        /// Interpolate from the previous frame
        Interpolate,
        /// Extrapolate from the current velocity
        Extrapolate,
    }
}

fn unknown(name: &str) -> ReflectError {
    ReflectError::UnknownMember(name.to_string())
}

fn read_only(name: &str) -> ReflectError {
    ReflectError::ReadOnly(name.to_string())
}

// ============================================================================
// Nested aggregates
// ============================================================================

/// Spring settings of a hinge joint
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointSpring {
    /// Spring force
    pub spring: f32,
    /// Damping force
    pub damper: f32,
    /// Rest angle in degrees
    pub target_position: f32,
}

impl Reflect for JointSpring {
    fn type_name(&self) -> &'static str {
        "JointSpring"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::field("spring"),
            Member::field("damper"),
            Member::field("targetPosition"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "spring" => self.spring.to_value(),
            "damper" => self.damper.to_value(),
            "targetPosition" => self.target_position.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "spring" => assign(&mut self.spring, name, value),
            "damper" => assign(&mut self.damper, name, value),
            "targetPosition" => assign(&mut self.target_position, name, value),
            _ => Err(unknown(name)),
        }
    }
}

/// Angle limits of a hinge joint
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointLimits {
    /// Lower limit in degrees
    pub min: f32,
    /// Upper limit in degrees
    pub max: f32,
    /// Bounciness at the lower limit
    pub min_bounce: f32,
    /// Bounciness at the upper limit
    pub max_bounce: f32,
}

impl Reflect for JointLimits {
    fn type_name(&self) -> &'static str {
        "JointLimits"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::field("min"),
            Member::field("max"),
            Member::field("minBounce"),
            Member::field("maxBounce"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "min" => self.min.to_value(),
            "max" => self.max.to_value(),
            "minBounce" => self.min_bounce.to_value(),
            "maxBounce" => self.max_bounce.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "min" => assign(&mut self.min, name, value),
            "max" => assign(&mut self.max, name, value),
            "minBounce" => assign(&mut self.min_bounce, name, value),
            "maxBounce" => assign(&mut self.max_bounce, name, value),
            _ => Err(unknown(name)),
        }
    }
}

macro_rules! complex_value {
    ($ty:ty) => {
        impl ReflectValue for $ty {
            fn declared_type() -> String {
                <$ty>::default().type_name().to_string()
            }

            fn to_value(&self) -> Option<Value> {
                Some(Value::Complex(capture(self)))
            }

            fn from_value(value: Value) -> Option<Self> {
                let Value::Complex(record) = value else {
                    return None;
                };
                let mut target = <$ty>::default();
                if record.type_name != target.type_name() {
                    return None;
                }
                apply(&record, &mut target).ok()?;
                Some(target)
            }
        }
    };
}

complex_value!(JointSpring);
complex_value!(JointLimits);

// ============================================================================
// Colliders
// ============================================================================

/// Box-shaped collider
#[derive(Debug, Clone, PartialEq)]
pub struct BoxCollider {
    /// Whether this is a trigger (no physics response)
    pub is_trigger: bool,
    /// Whether the collider takes part in the simulation
    pub enabled: bool,
    /// Physics material asset
    pub shared_material: Option<AssetRef>,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for BoxCollider {
    fn default() -> Self {
        Self {
            is_trigger: false,
            enabled: true,
            shared_material: None,
            hide_flags: HideFlags::None,
        }
    }
}

impl Reflect for BoxCollider {
    fn type_name(&self) -> &'static str {
        "BoxCollider"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::field("isTrigger"),
            Member::property("enabled"),
            Member::property("material"),
            Member::property("sharedMaterial"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "isTrigger" => self.is_trigger.to_value(),
            "enabled" => self.enabled.to_value(),
            "material" | "sharedMaterial" => self.shared_material.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "isTrigger" => assign(&mut self.is_trigger, name, value),
            "enabled" => assign(&mut self.enabled, name, value),
            "material" | "sharedMaterial" => assign(&mut self.shared_material, name, value),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for BoxCollider {
    fn class(&self) -> ComponentClass {
        ComponentClass::Collider
    }
}

/// Sphere-shaped collider
#[derive(Debug, Clone, PartialEq)]
pub struct SphereCollider {
    /// Whether the collider takes part in the simulation
    pub enabled: bool,
    /// Whether this is a trigger
    pub is_trigger: bool,
    /// Center offset
    pub center: Vec3,
    /// Radius of the sphere
    pub radius: f32,
    /// Physics material asset
    pub shared_material: Option<AssetRef>,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for SphereCollider {
    fn default() -> Self {
        Self {
            enabled: true,
            is_trigger: false,
            center: Vec3::ZERO,
            radius: 0.5,
            shared_material: None,
            hide_flags: HideFlags::None,
        }
    }
}

impl Reflect for SphereCollider {
    fn type_name(&self) -> &'static str {
        "SphereCollider"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::property("enabled"),
            Member::property("isTrigger"),
            Member::property("center"),
            Member::property("radius"),
            Member::property("material"),
            Member::property("sharedMaterial"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "enabled" => self.enabled.to_value(),
            "isTrigger" => self.is_trigger.to_value(),
            "center" => self.center.to_value(),
            "radius" => self.radius.to_value(),
            "material" | "sharedMaterial" => self.shared_material.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "enabled" => assign(&mut self.enabled, name, value),
            "isTrigger" => assign(&mut self.is_trigger, name, value),
            "center" => assign(&mut self.center, name, value),
            "radius" => assign(&mut self.radius, name, value),
            "material" | "sharedMaterial" => assign(&mut self.shared_material, name, value),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for SphereCollider {
    fn class(&self) -> ComponentClass {
        ComponentClass::Collider
    }
}

/// Collider using an arbitrary mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshCollider {
    /// Whether the collider takes part in the simulation
    pub enabled: bool,
    /// Whether this is a trigger
    pub is_trigger: bool,
    /// Use the convex hull of the mesh
    pub convex: bool,
    /// Collision mesh
    pub shared_mesh: Option<MeshRef>,
    /// Physics material asset
    pub shared_material: Option<AssetRef>,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for MeshCollider {
    fn default() -> Self {
        Self {
            enabled: true,
            is_trigger: false,
            convex: false,
            shared_mesh: None,
            shared_material: None,
            hide_flags: HideFlags::None,
        }
    }
}

impl Reflect for MeshCollider {
    fn type_name(&self) -> &'static str {
        "MeshCollider"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::property("enabled"),
            Member::property("isTrigger"),
            Member::property("convex"),
            Member::property("mesh"),
            Member::property("sharedMesh"),
            Member::property("material"),
            Member::property("sharedMaterial"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "enabled" => self.enabled.to_value(),
            "isTrigger" => self.is_trigger.to_value(),
            "convex" => self.convex.to_value(),
            "mesh" | "sharedMesh" => self.shared_mesh.to_value(),
            "material" | "sharedMaterial" => self.shared_material.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "enabled" => assign(&mut self.enabled, name, value),
            "isTrigger" => assign(&mut self.is_trigger, name, value),
            "convex" => assign(&mut self.convex, name, value),
            "mesh" | "sharedMesh" => assign(&mut self.shared_mesh, name, value),
            "material" | "sharedMaterial" => assign(&mut self.shared_material, name, value),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for MeshCollider {
    fn class(&self) -> ComponentClass {
        ComponentClass::Collider
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Holds the mesh a renderer draws
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshFilter {
    /// Mesh asset or builtin primitive
    pub shared_mesh: Option<MeshRef>,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Reflect for MeshFilter {
    fn type_name(&self) -> &'static str {
        "MeshFilter"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::property("mesh"),
            Member::property("sharedMesh"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "mesh" | "sharedMesh" => self.shared_mesh.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "mesh" | "sharedMesh" => assign(&mut self.shared_mesh, name, value),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for MeshFilter {
    fn class(&self) -> ComponentClass {
        ComponentClass::MeshFilter
    }
}

/// Draws the mesh of the node's mesh filter
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRenderer {
    /// Whether the renderer draws
    pub enabled: bool,
    /// Whether to cast shadows
    pub cast_shadows: bool,
    /// Whether to receive shadows
    pub receive_shadows: bool,
    /// Material per submesh
    pub shared_materials: Vec<Option<MaterialRef>>,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self {
            enabled: true,
            cast_shadows: true,
            receive_shadows: true,
            shared_materials: Vec::new(),
            hide_flags: HideFlags::None,
        }
    }
}

impl Reflect for MeshRenderer {
    fn type_name(&self) -> &'static str {
        "MeshRenderer"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::property("enabled"),
            Member::property("castShadows"),
            Member::property("receiveShadows"),
            Member::property("material"),
            Member::property("materials"),
            Member::property("sharedMaterial"),
            Member::property("sharedMaterials"),
            Member::read_only("isVisible"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "enabled" => self.enabled.to_value(),
            "castShadows" => self.cast_shadows.to_value(),
            "receiveShadows" => self.receive_shadows.to_value(),
            "material" | "sharedMaterial" => self.shared_materials.first().cloned().flatten().to_value(),
            "materials" | "sharedMaterials" => self.shared_materials.to_value(),
            "isVisible" => (self.enabled && !self.shared_materials.is_empty()).to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "enabled" => assign(&mut self.enabled, name, value),
            "castShadows" => assign(&mut self.cast_shadows, name, value),
            "receiveShadows" => assign(&mut self.receive_shadows, name, value),
            "material" | "sharedMaterial" => {
                let mut first = None;
                assign(&mut first, name, value)?;
                match self.shared_materials.first_mut() {
                    Some(slot) => *slot = first,
                    None => self.shared_materials.push(first),
                }
                Ok(())
            }
            "materials" | "sharedMaterials" => assign(&mut self.shared_materials, name, value),
            "isVisible" => Err(read_only(name)),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for MeshRenderer {
    fn class(&self) -> ComponentClass {
        ComponentClass::Renderer
    }
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Whether the light is on
    pub enabled: bool,
    /// Type of light
    pub light_type: LightType,
    /// Light color
    pub color: Color,
    /// Light intensity
    pub intensity: f32,
    /// Range for point/spot lights
    pub range: f32,
    /// Spot angle in degrees
    pub spot_angle: f32,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            enabled: true,
            light_type: LightType::Point,
            color: Color::WHITE,
            intensity: 1.0,
            range: 10.0,
            spot_angle: 30.0,
            hide_flags: HideFlags::None,
        }
    }
}

impl Reflect for Light {
    fn type_name(&self) -> &'static str {
        "Light"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::property("enabled"),
            Member::property("type"),
            Member::property("color"),
            Member::property("intensity"),
            Member::property("range"),
            Member::property("spotAngle"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "enabled" => self.enabled.to_value(),
            "type" => self.light_type.to_value(),
            "color" => self.color.to_value(),
            "intensity" => self.intensity.to_value(),
            "range" => self.range.to_value(),
            "spotAngle" => self.spot_angle.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "enabled" => assign(&mut self.enabled, name, value),
            "type" => assign(&mut self.light_type, name, value),
            "color" => assign(&mut self.color, name, value),
            "intensity" => assign(&mut self.intensity, name, value),
            "range" => assign(&mut self.range, name, value),
            "spotAngle" => assign(&mut self.spot_angle, name, value),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for Light {}

/// Rendering viewpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Whether the camera renders
    pub enabled: bool,
    /// Vertical field of view in degrees
    pub field_of_view: f32,
    /// Near clipping plane
    pub near_clip_plane: f32,
    /// Far clipping plane
    pub far_clip_plane: f32,
    /// Orthographic projection
    pub orthographic: bool,
    /// Half height of the orthographic view
    pub orthographic_size: f32,
    /// Render order
    pub depth: f32,
    /// What to clear before rendering
    pub clear_flags: CameraClearFlags,
    /// Clear color
    pub background_color: Color,
    /// Normalized viewport rectangle
    pub rect: Rect,
    /// Target size in pixels, used to derive the pixel rectangle
    pub target_size: (f32, f32),
    /// Per-layer culling distances, zero means far plane
    pub layer_cull_distances: Vec<f32>,
    /// Custom world to camera matrix
    pub world_to_camera: Mat4,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            enabled: true,
            field_of_view: 60.0,
            near_clip_plane: 0.3,
            far_clip_plane: 1000.0,
            orthographic: false,
            orthographic_size: 5.0,
            depth: 0.0,
            clear_flags: CameraClearFlags::Skybox,
            background_color: Color::rgba(0.19, 0.3, 0.47, 0.0),
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            target_size: (1920.0, 1080.0),
            layer_cull_distances: vec![0.0; 32],
            world_to_camera: Mat4::IDENTITY,
            hide_flags: HideFlags::None,
        }
    }
}

impl Camera {
    /// Viewport in pixels
    pub fn pixel_rect(&self) -> Rect {
        let (w, h) = self.target_size;
        Rect::new(self.rect.x * w, self.rect.y * h, self.rect.width * w, self.rect.height * h)
    }

    /// Width over height of the pixel viewport
    pub fn aspect(&self) -> f32 {
        let pixels = self.pixel_rect();
        if pixels.height == 0.0 {
            1.0
        } else {
            pixels.width / pixels.height
        }
    }
}

impl Reflect for Camera {
    fn type_name(&self) -> &'static str {
        "Camera"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::property("enabled"),
            Member::property("fieldOfView"),
            Member::property("nearClipPlane"),
            Member::property("farClipPlane"),
            Member::property("orthographic"),
            Member::property("orthographicSize"),
            Member::property("depth"),
            Member::property("clearFlags"),
            Member::property("backgroundColor"),
            Member::property("rect"),
            Member::property("pixelRect"),
            Member::property("aspect"),
            Member::property("layerCullDistances"),
            Member::property("worldToCameraMatrix"),
            Member::read_only("velocity"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "enabled" => self.enabled.to_value(),
            "fieldOfView" => self.field_of_view.to_value(),
            "nearClipPlane" => self.near_clip_plane.to_value(),
            "farClipPlane" => self.far_clip_plane.to_value(),
            "orthographic" => self.orthographic.to_value(),
            "orthographicSize" => self.orthographic_size.to_value(),
            "depth" => self.depth.to_value(),
            "clearFlags" => self.clear_flags.to_value(),
            "backgroundColor" => self.background_color.to_value(),
            "rect" => self.rect.to_value(),
            "pixelRect" => self.pixel_rect().to_value(),
            "aspect" => self.aspect().to_value(),
            "layerCullDistances" => self.layer_cull_distances.to_value(),
            "worldToCameraMatrix" => self.world_to_camera.to_value(),
            "velocity" => Vec3::ZERO.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "enabled" => assign(&mut self.enabled, name, value),
            "fieldOfView" => assign(&mut self.field_of_view, name, value),
            "nearClipPlane" => assign(&mut self.near_clip_plane, name, value),
            "farClipPlane" => assign(&mut self.far_clip_plane, name, value),
            "orthographic" => assign(&mut self.orthographic, name, value),
            "orthographicSize" => assign(&mut self.orthographic_size, name, value),
            "depth" => assign(&mut self.depth, name, value),
            "clearFlags" => assign(&mut self.clear_flags, name, value),
            "backgroundColor" => assign(&mut self.background_color, name, value),
            "rect" => assign(&mut self.rect, name, value),
            "pixelRect" => {
                let mut pixels = Rect::default();
                assign(&mut pixels, name, value)?;
                let (w, h) = self.target_size;
                if w > 0.0 && h > 0.0 {
                    self.rect = Rect::new(pixels.x / w, pixels.y / h, pixels.width / w, pixels.height / h);
                }
                Ok(())
            }
            "aspect" => {
                let mut aspect = 0.0f32;
                assign(&mut aspect, name, value)?;
                if aspect > 0.0 {
                    self.target_size.0 = self.target_size.1 * aspect / self.rect.width.max(f32::EPSILON)
                        * self.rect.height;
                }
                Ok(())
            }
            "layerCullDistances" => assign(&mut self.layer_cull_distances, name, value),
            "worldToCameraMatrix" => assign(&mut self.world_to_camera, name, value),
            "velocity" => Err(read_only(name)),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for Camera {
    fn class(&self) -> ComponentClass {
        ComponentClass::Camera
    }
}

// ============================================================================
// Physics
// ============================================================================

/// Physics body
#[derive(Debug, Clone, PartialEq)]
pub struct Rigidbody {
    /// Mass in kilograms
    pub mass: f32,
    /// Linear drag
    pub drag: f32,
    /// Angular drag
    pub angular_drag: f32,
    /// Whether gravity applies
    pub use_gravity: bool,
    /// Driven by animation instead of physics
    pub is_kinematic: bool,
    /// Interpolation mode
    pub interpolation: RigidbodyInterpolation,
    /// Center of mass offset
    pub center_of_mass: Vec3,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            drag: 0.0,
            angular_drag: 0.05,
            use_gravity: true,
            is_kinematic: false,
            interpolation: RigidbodyInterpolation::None,
            center_of_mass: Vec3::ZERO,
            hide_flags: HideFlags::None,
        }
    }
}

impl Reflect for Rigidbody {
    fn type_name(&self) -> &'static str {
        "Rigidbody"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::property("mass"),
            Member::property("drag"),
            Member::property("angularDrag"),
            Member::property("useGravity"),
            Member::property("isKinematic"),
            Member::property("interpolation"),
            Member::property("centerOfMass"),
            Member::property("inertiaTensorRotation"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "mass" => self.mass.to_value(),
            "drag" => self.drag.to_value(),
            "angularDrag" => self.angular_drag.to_value(),
            "useGravity" => self.use_gravity.to_value(),
            "isKinematic" => self.is_kinematic.to_value(),
            "interpolation" => self.interpolation.to_value(),
            "centerOfMass" => self.center_of_mass.to_value(),
            "inertiaTensorRotation" => glam::Quat::IDENTITY.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "mass" => assign(&mut self.mass, name, value),
            "drag" => assign(&mut self.drag, name, value),
            "angularDrag" => assign(&mut self.angular_drag, name, value),
            "useGravity" => assign(&mut self.use_gravity, name, value),
            "isKinematic" => assign(&mut self.is_kinematic, name, value),
            "interpolation" => assign(&mut self.interpolation, name, value),
            "centerOfMass" => assign(&mut self.center_of_mass, name, value),
            "inertiaTensorRotation" => {
                let mut rotation = glam::Quat::IDENTITY;
                assign(&mut rotation, name, value)
            }
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for Rigidbody {
    fn class(&self) -> ComponentClass {
        ComponentClass::Rigidbody
    }
}

/// Hinge between this node's body and another
#[derive(Debug, Clone, PartialEq)]
pub struct HingeJoint {
    /// Body the hinge connects to, world when unset
    pub connected_body: Option<ComponentLink>,
    /// Anchor in local space
    pub anchor: Vec3,
    /// Rotation axis in local space
    pub axis: Vec3,
    /// Whether the spring is active
    pub use_spring: bool,
    /// Spring settings
    pub spring: JointSpring,
    /// Whether limits are active
    pub use_limits: bool,
    /// Limit settings
    pub limits: JointLimits,
    /// Force that breaks the joint
    pub break_force: f32,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for HingeJoint {
    fn default() -> Self {
        Self {
            connected_body: None,
            anchor: Vec3::ZERO,
            axis: Vec3::X,
            use_spring: false,
            spring: JointSpring::default(),
            use_limits: false,
            limits: JointLimits::default(),
            break_force: f32::INFINITY,
            hide_flags: HideFlags::None,
        }
    }
}

impl Reflect for HingeJoint {
    fn type_name(&self) -> &'static str {
        "HingeJoint"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::property("connectedBody"),
            Member::property("anchor"),
            Member::property("axis"),
            Member::property("useSpring"),
            Member::property("spring"),
            Member::property("useLimits"),
            Member::property("limits"),
            Member::property("breakForce"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "connectedBody" => self.connected_body.to_value(),
            "anchor" => self.anchor.to_value(),
            "axis" => self.axis.to_value(),
            "useSpring" => self.use_spring.to_value(),
            "spring" => self.spring.to_value(),
            "useLimits" => self.use_limits.to_value(),
            "limits" => self.limits.to_value(),
            "breakForce" => self.break_force.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "connectedBody" => assign_link(&mut self.connected_body, name, "Rigidbody", value),
            "anchor" => assign(&mut self.anchor, name, value),
            "axis" => assign(&mut self.axis, name, value),
            "useSpring" => assign(&mut self.use_spring, name, value),
            "spring" => assign(&mut self.spring, name, value),
            "useLimits" => assign(&mut self.use_limits, name, value),
            "limits" => assign(&mut self.limits, name, value),
            "breakForce" => assign(&mut self.break_force, name, value),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for HingeJoint {}

// ============================================================================
// Audio
// ============================================================================

/// Plays an audio clip
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    /// Whether the source plays
    pub enabled: bool,
    /// Audio clip asset
    pub clip: Option<AssetRef>,
    /// Volume (0-1)
    pub volume: f32,
    /// Pitch multiplier
    pub pitch: f32,
    /// Loop playback
    pub looping: bool,
    /// Start playing when the scene starts
    pub play_on_awake: bool,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for AudioSource {
    fn default() -> Self {
        Self {
            enabled: true,
            clip: None,
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            play_on_awake: true,
            hide_flags: HideFlags::None,
        }
    }
}

impl Reflect for AudioSource {
    fn type_name(&self) -> &'static str {
        "AudioSource"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::property("enabled"),
            Member::property("clip"),
            Member::property("volume"),
            Member::property("pitch"),
            Member::property("loop"),
            Member::property("playOnAwake"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "enabled" => self.enabled.to_value(),
            "clip" => self.clip.to_value(),
            "volume" => self.volume.to_value(),
            "pitch" => self.pitch.to_value(),
            "loop" => self.looping.to_value(),
            "playOnAwake" => self.play_on_awake.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "enabled" => assign(&mut self.enabled, name, value),
            "clip" => assign(&mut self.clip, name, value),
            "volume" => assign(&mut self.volume, name, value),
            "pitch" => assign(&mut self.pitch, name, value),
            "loop" => assign(&mut self.looping, name, value),
            "playOnAwake" => assign(&mut self.play_on_awake, name, value),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for AudioSource {}

// ============================================================================
// Particles
// ============================================================================

/// Legacy particle emitter, its live particle state cannot be written
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEmitter {
    /// Whether the emitter runs
    pub enabled: bool,
    /// Emit particles automatically
    pub emit: bool,
    /// Minimum particle size
    pub min_size: f32,
    /// Maximum particle size
    pub max_size: f32,
    /// Live particle positions
    pub particles: Vec<Vec3>,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for ParticleEmitter {
    fn default() -> Self {
        Self {
            enabled: true,
            emit: true,
            min_size: 0.1,
            max_size: 0.1,
            particles: Vec::new(),
            hide_flags: HideFlags::None,
        }
    }
}

impl Reflect for ParticleEmitter {
    fn type_name(&self) -> &'static str {
        "ParticleEmitter"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::property("enabled"),
            Member::property("emit"),
            Member::property("minSize"),
            Member::property("maxSize"),
            Member::property("particles"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "enabled" => self.enabled.to_value(),
            "emit" => self.emit.to_value(),
            "minSize" => self.min_size.to_value(),
            "maxSize" => self.max_size.to_value(),
            "particles" => self.particles.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "enabled" => assign(&mut self.enabled, name, value),
            "emit" => assign(&mut self.emit, name, value),
            "minSize" => assign(&mut self.min_size, name, value),
            "maxSize" => assign(&mut self.max_size, name, value),
            "particles" => assign(&mut self.particles, name, value),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for ParticleEmitter {
    fn class(&self) -> ComponentClass {
        ComponentClass::ParticleEmitter
    }
}

// ============================================================================
// Scripts
// ============================================================================

/// Script component linking to other nodes, components, assets and levels
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLinks {
    /// Materials to cycle through
    pub material_list: Vec<Option<MaterialRef>>,
    /// Another node in the scene
    pub go_link: Option<NodeId>,
    /// Placement of another node
    pub transform_link: Option<ComponentLink>,
    /// Template asset to spawn
    pub prefab_link: Option<AssetRef>,
    /// Collider on another node
    pub collider_link: Option<ComponentLink>,
    /// Document to load next
    pub next_scene: String,
    /// Whether the script runs
    pub enabled: bool,
    /// Editor flags
    pub hide_flags: HideFlags,
}

impl Default for LevelLinks {
    fn default() -> Self {
        Self {
            material_list: Vec::new(),
            go_link: None,
            transform_link: None,
            prefab_link: None,
            collider_link: None,
            next_scene: String::new(),
            enabled: true,
            hide_flags: HideFlags::None,
        }
    }
}

impl Reflect for LevelLinks {
    fn type_name(&self) -> &'static str {
        "LevelLinks"
    }

    fn members(&self) -> &'static [Member] {
        const MEMBERS: &[Member] = &[
            Member::field("materialList"),
            Member::field("goLink"),
            Member::field("transformLink"),
            Member::field("prefabLink"),
            Member::field("colliderLink"),
            Member::field("nextScene"),
            Member::property("enabled"),
            Member::property("hideFlags"),
        ];
        MEMBERS
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "materialList" => self.material_list.to_value(),
            "goLink" => self.go_link.to_value(),
            "transformLink" => self.transform_link.to_value(),
            "prefabLink" => self.prefab_link.to_value(),
            "colliderLink" => self.collider_link.to_value(),
            "nextScene" => self.next_scene.to_value(),
            "enabled" => self.enabled.to_value(),
            "hideFlags" => self.hide_flags.to_value(),
            _ => None,
        }
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        match name {
            "materialList" => assign(&mut self.material_list, name, value),
            "goLink" => assign(&mut self.go_link, name, value),
            "transformLink" => {
                assign_link(&mut self.transform_link, name, type_names::TRANSFORM, value)
            }
            "prefabLink" => assign(&mut self.prefab_link, name, value),
            "colliderLink" => assign_link(&mut self.collider_link, name, "BoxCollider", value),
            "nextScene" => assign(&mut self.next_scene, name, value),
            "enabled" => assign(&mut self.enabled, name, value),
            "hideFlags" => assign(&mut self.hide_flags, name, value),
            _ => Err(unknown(name)),
        }
    }
}

impl Component for LevelLinks {}

/// Register every built-in component and enum type
pub fn register_builtins(registry: &mut TypeRegistry) {
    registry.register_component(|| Box::new(BoxCollider::default()));
    registry.register_component(|| Box::new(SphereCollider::default()));
    registry.register_component(|| Box::new(MeshCollider::default()));
    registry.register_component(|| Box::new(MeshFilter::default()));
    registry.register_component(|| Box::new(MeshRenderer::default()));
    registry.register_component(|| Box::new(Light::default()));
    registry.register_component(|| Box::new(Camera::default()));
    registry.register_component(|| Box::new(Rigidbody::default()));
    registry.register_component(|| Box::new(HingeJoint::default()));
    registry.register_component(|| Box::new(AudioSource::default()));
    registry.register_component(|| Box::new(ParticleEmitter::default()));
    registry.register_component(|| Box::new(LevelLinks::default()));

    registry.register_enum::<HideFlags>();
    registry.register_enum::<LightType>();
    registry.register_enum::<CameraClearFlags>();
    registry.register_enum::<RigidbodyInterpolation>();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = TypeRegistry::with_builtins();
        let types: Vec<_> = registry.component_types().collect();
        assert_eq!(types.len(), 12);
        assert!(types.contains(&"HingeJoint"));
        assert_eq!(
            registry.component("ParticleEmitter").unwrap().class,
            ComponentClass::ParticleEmitter
        );
    }

    #[test]
    fn test_every_member_readable_or_rejected() {
        let registry = TypeRegistry::with_builtins();
        for type_name in registry.component_types() {
            let mut component = registry.create(type_name).unwrap();
            for member in component.members() {
                let Some(value) = component.get(member.name) else {
                    continue;
                };
                let result = component.set(member.name, value);
                if member.writable {
                    assert!(result.is_ok(), "{type_name}.{} failed: {result:?}", member.name);
                } else {
                    assert_eq!(result, Err(ReflectError::ReadOnly(member.name.to_string())));
                }
            }
        }
    }

    #[test]
    fn test_renderer_material_aliases() {
        let mut renderer = MeshRenderer::default();
        renderer
            .set("sharedMaterial", Value::BuiltinMaterial("Default-Diffuse".into()))
            .unwrap();
        assert_eq!(
            renderer.shared_materials,
            vec![Some(MaterialRef::Builtin("Default-Diffuse".into()))]
        );
        assert_eq!(renderer.get("material"), renderer.get("sharedMaterial"));
    }

    #[test]
    fn test_link_target_type_checked() {
        let mut links = LevelLinks::default();
        let node = NodeId::new();

        let collider = Value::Component(ComponentLink::new(node, "BoxCollider"));
        assert!(links.set("colliderLink", collider).is_ok());

        let wrong = Value::Component(ComponentLink::new(node, "SphereCollider"));
        assert!(matches!(
            links.set("colliderLink", wrong),
            Err(ReflectError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_complex_member() {
        let mut hinge = HingeJoint::default();
        let spring = JointSpring {
            spring: 4.0,
            damper: 1.0,
            target_position: 90.0,
        };
        hinge.set("spring", spring.to_value().unwrap()).unwrap();
        assert_eq!(hinge.spring, spring);

        let limits = JointLimits::default().to_value().unwrap();
        assert!(hinge.set("spring", limits).is_err());
    }

    #[test]
    fn test_camera_derived_rect() {
        let mut camera = Camera::default();
        camera.rect = Rect::new(0.0, 0.0, 0.5, 1.0);
        assert_eq!(camera.pixel_rect(), Rect::new(0.0, 0.0, 960.0, 1080.0));
    }
}
