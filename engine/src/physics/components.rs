//! Authored physics components for the entity system
//!
//! These are the values a scene file (or game code) puts on an entity. The
//! binder reads them when the entity attaches; nothing here touches the
//! physics engine.

use super::collider::{ColliderMaterial, ColliderOverrides};
use super::groups::InteractionMask;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error for unknown shape or body-kind tags
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} tag '{tag}'")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub tag: String,
}

/// Collider shape tag. Parsing ignores case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ShapeKind {
    #[default]
    Cube,
    Sphere,
    Capsule,
    Cylinder,
    Mesh,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Cube => "cube",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Capsule => "capsule",
            ShapeKind::Cylinder => "cylinder",
            ShapeKind::Mesh => "mesh",
        }
    }
}

impl FromStr for ShapeKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CUBE" => Ok(ShapeKind::Cube),
            "SPHERE" => Ok(ShapeKind::Sphere),
            "CAPSULE" => Ok(ShapeKind::Capsule),
            "CYLINDER" => Ok(ShapeKind::Cylinder),
            "MESH" => Ok(ShapeKind::Mesh),
            _ => Err(UnknownTag {
                kind: "shape",
                tag: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ShapeKind {
    type Error = UnknownTag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ShapeKind> for String {
    fn from(kind: ShapeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the engine simulates a body. Parsing ignores case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RigidBodyKind {
    /// Moved by forces and contacts
    Dynamic,
    /// Moved only by game code
    Kinematic,
    /// Never moves
    #[default]
    Fixed,
    /// Game-driven character body
    Player,
}

impl RigidBodyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RigidBodyKind::Dynamic => "dynamic",
            RigidBodyKind::Kinematic => "kinematic",
            RigidBodyKind::Fixed => "fixed",
            RigidBodyKind::Player => "player",
        }
    }
}

impl FromStr for RigidBodyKind {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DYNAMIC" => Ok(RigidBodyKind::Dynamic),
            "KINEMATIC" => Ok(RigidBodyKind::Kinematic),
            "FIXED" => Ok(RigidBodyKind::Fixed),
            "PLAYER" => Ok(RigidBodyKind::Player),
            _ => Err(UnknownTag {
                kind: "rigid body",
                tag: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for RigidBodyKind {
    type Error = UnknownTag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RigidBodyKind> for String {
    fn from(kind: RigidBodyKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for RigidBodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One authored collider. Unset dimensions are measured from the mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColliderConfig {
    pub shape: ShapeKind,
    pub sensor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friction: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restitution: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<InteractionMask>,
    /// Offset from the body origin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    /// Library mesh to measure instead of the entity's collision proxy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
}

impl ColliderConfig {
    pub fn new(shape: ShapeKind) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Caller-provided values handed to collider derivation
    pub fn overrides(&self) -> ColliderOverrides {
        ColliderOverrides {
            position: self.position,
            width: self.width,
            height: self.height,
            depth: self.depth,
            radius: self.radius,
            material: ColliderMaterial {
                mass: self.mass,
                friction: self.friction,
                restitution: self.restitution,
                density: self.density,
            },
            sensor: self.sensor,
            groups: self.groups.map(InteractionMask::with_default_filter),
        }
    }
}

/// Physics configuration carried by a scene entity.
///
/// The top-level collider fields describe a single collider. When
/// `colliders` is non-empty it replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicsBody {
    pub enabled: bool,
    pub kind: RigidBodyKind,
    pub shape: ShapeKind,
    pub sensor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friction: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restitution: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<InteractionMask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(alias = "lockPosition", skip_serializing_if = "Option::is_none")]
    pub lock_translation: Option<[bool; 3]>,
    #[serde(alias = "lockOrientation", skip_serializing_if = "Option::is_none")]
    pub lock_rotation: Option<[bool; 3]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub colliders: Vec<ColliderConfig>,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: RigidBodyKind::default(),
            shape: ShapeKind::default(),
            sensor: false,
            mass: None,
            friction: None,
            restitution: None,
            density: None,
            groups: None,
            position: None,
            width: None,
            height: None,
            depth: None,
            radius: None,
            lock_translation: None,
            lock_rotation: None,
            colliders: Vec::new(),
        }
    }
}

impl PhysicsBody {
    /// Single-collider body of the given kind and shape
    pub fn new(kind: RigidBodyKind, shape: ShapeKind) -> Self {
        Self {
            kind,
            shape,
            ..Default::default()
        }
    }

    /// Body with an explicit collider list
    pub fn with_colliders(kind: RigidBodyKind, colliders: Vec<ColliderConfig>) -> Self {
        Self {
            kind,
            colliders,
            ..Default::default()
        }
    }

    /// Colliders to derive, in authored order
    pub fn collider_configs(&self) -> Vec<ColliderConfig> {
        if !self.colliders.is_empty() {
            return self.colliders.clone();
        }

        vec![ColliderConfig {
            shape: self.shape,
            sensor: self.sensor,
            mass: self.mass,
            friction: self.friction,
            restitution: self.restitution,
            density: self.density,
            groups: self.groups,
            position: self.position,
            width: self.width,
            height: self.height,
            depth: self.depth,
            radius: self.radius,
            mesh: None,
        }]
    }
}

/// Names the library mesh whose bounds stand in for the entity's collision shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionProxy {
    pub mesh: String,
}

impl CollisionProxy {
    pub fn new(mesh: impl Into<String>) -> Self {
        Self { mesh: mesh.into() }
    }
}
