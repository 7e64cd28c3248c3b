//! Collider descriptors and their derivation from render meshes

use super::bounds::{box_bounds, indexed_geometry, sphere_bounds};
use super::components::ShapeKind;
use super::groups::InteractionMask;
use crate::graphics::Mesh;
use glam::Vec3;
use tracing::warn;

/// Engine-ready collision shape. Cube and cylinder dimensions are full
/// extents; capsule height excludes the two caps.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Cube { width: f32, height: f32, depth: f32 },
    Sphere { radius: f32 },
    Capsule { radius: f32, height: f32 },
    Cylinder { radius: f32, height: f32 },
    Mesh { vertices: Vec<f32>, indices: Vec<u32> },
}

impl ColliderShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ColliderShape::Cube { .. } => ShapeKind::Cube,
            ColliderShape::Sphere { .. } => ShapeKind::Sphere,
            ColliderShape::Capsule { .. } => ShapeKind::Capsule,
            ColliderShape::Cylinder { .. } => ShapeKind::Cylinder,
            ColliderShape::Mesh { .. } => ShapeKind::Mesh,
        }
    }
}

/// Dynamic properties; `None` leaves the engine default in place
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColliderMaterial {
    pub mass: Option<f32>,
    pub friction: Option<f32>,
    pub restitution: Option<f32>,
    pub density: Option<f32>,
}

/// A collider ready for engine construction
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderDesc {
    pub shape: ColliderShape,
    /// Offset from the body origin
    pub position: Vec3,
    pub material: ColliderMaterial,
    pub sensor: bool,
    pub groups: Option<InteractionMask>,
}

/// Values the caller already knows. Anything unset is measured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColliderOverrides {
    pub position: Option<Vec3>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub depth: Option<f32>,
    pub radius: Option<f32>,
    pub material: ColliderMaterial,
    pub sensor: bool,
    pub groups: Option<InteractionMask>,
}

/// Fill in a collider of `kind` from the mesh's bounds.
///
/// Returns `None` when there is no mesh to measure. Provided overrides always
/// win over measured values; mesh colliders sit at the body origin.
pub fn derive_collider(
    kind: ShapeKind,
    overrides: &ColliderOverrides,
    world_scale: Vec3,
    mesh: Option<&Mesh>,
) -> Option<ColliderDesc> {
    let mesh = mesh?;

    let (shape, center) = match kind {
        ShapeKind::Cube => {
            let bounds = box_bounds(mesh, world_scale);
            let shape = ColliderShape::Cube {
                width: overrides.width.unwrap_or(bounds.size.x),
                height: overrides.height.unwrap_or(bounds.size.y),
                depth: overrides.depth.unwrap_or(bounds.size.z),
            };
            (shape, bounds.center)
        }
        ShapeKind::Sphere => {
            let bounds = sphere_bounds(mesh, world_scale);
            let shape = ColliderShape::Sphere {
                radius: overrides.radius.unwrap_or(bounds.radius),
            };
            (shape, bounds.center)
        }
        ShapeKind::Cylinder => {
            let bounds = box_bounds(mesh, world_scale);
            let shape = ColliderShape::Cylinder {
                radius: overrides.radius.unwrap_or(horizontal_radius(bounds.size)),
                height: overrides.height.unwrap_or(bounds.size.y),
            };
            (shape, bounds.center)
        }
        ShapeKind::Capsule => {
            let bounds = box_bounds(mesh, world_scale);
            let radius = overrides.radius.unwrap_or(horizontal_radius(bounds.size));
            let height = overrides
                .height
                .unwrap_or_else(|| capsule_height(bounds.size.y, radius));
            (ColliderShape::Capsule { radius, height }, bounds.center)
        }
        ShapeKind::Mesh => {
            let geometry = indexed_geometry(mesh, world_scale);
            let shape = ColliderShape::Mesh {
                vertices: geometry.vertices,
                indices: geometry.indices,
            };
            (shape, Vec3::ZERO)
        }
    };

    let position = match kind {
        ShapeKind::Mesh => Vec3::ZERO,
        _ => overrides.position.unwrap_or(center),
    };

    Some(ColliderDesc {
        shape,
        position,
        material: overrides.material,
        sensor: overrides.sensor,
        groups: overrides.groups,
    })
}

fn horizontal_radius(size: Vec3) -> f32 {
    size.x.max(size.z) * 0.5
}

// Cylindrical section between the caps
fn capsule_height(box_height: f32, radius: f32) -> f32 {
    let height = box_height - 2.0 * radius;
    if height < 0.0 {
        warn!(
            box_height,
            radius, "Mesh is too flat for a capsule of this radius, using a sphere-like capsule"
        );
        return 0.0;
    }
    height
}
