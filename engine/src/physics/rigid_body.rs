//! Rigid body descriptors assembled from scene entities

use super::collider::{derive_collider, ColliderDesc};
use super::components::{CollisionProxy, PhysicsBody, RigidBodyKind};
use super::error::PhysicsError;
use crate::core::entity::{refresh_global_transform, Entity, GlobalTransform, World, WorldPose};
use crate::graphics::{Mesh, MeshLibrary};
use glam::{Quat, Vec3};
use std::sync::Arc;
use tracing::{debug, warn};

/// A body plus its colliders, ready for engine construction
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyDesc {
    pub kind: RigidBodyKind,
    pub position: Vec3,
    /// Unit quaternion
    pub rotation: Quat,
    pub lock_translation: [bool; 3],
    pub lock_rotation: [bool; 3],
    /// Never empty
    pub colliders: Vec<ColliderDesc>,
}

/// Build the descriptor for an entity from its freshly resolved world pose.
///
/// The entity's world matrix is recomputed first so pending transform edits
/// are honored.
pub fn rigid_body_for_entity(
    world: &mut World,
    entity: Entity,
    library: &MeshLibrary,
) -> Result<RigidBodyDesc, PhysicsError> {
    let matrix = refresh_global_transform(world, entity)?;
    let pose = GlobalTransform::from_matrix(matrix).decompose();

    let body: PhysicsBody = world
        .get::<PhysicsBody>(entity)
        .map(|body| (*body).clone())
        .map_err(|_| PhysicsError::MissingBody(entity))?;
    let proxy = world
        .get::<CollisionProxy>(entity)
        .ok()
        .and_then(|proxy| library.get(&proxy.mesh));

    assemble_rigid_body(entity, &pose, &body, proxy.as_deref(), library)
}

/// Assemble a descriptor from an already resolved pose.
///
/// Each collider measures the mesh it names in the library, or the entity's
/// collision proxy when it names none. Colliders that cannot be derived are
/// skipped; at least one must survive.
pub fn assemble_rigid_body(
    entity: Entity,
    pose: &WorldPose,
    body: &PhysicsBody,
    proxy: Option<&Mesh>,
    library: &MeshLibrary,
) -> Result<RigidBodyDesc, PhysicsError> {
    let mut colliders = Vec::new();

    for config in body.collider_configs() {
        let named: Option<Arc<Mesh>> = config.mesh.as_deref().and_then(|name| {
            let mesh = library.get(name);
            if mesh.is_none() {
                warn!(entity = ?entity, mesh = name, "Collider names an unknown mesh");
            }
            mesh
        });
        let source = match &config.mesh {
            Some(_) => named.as_deref(),
            None => proxy,
        };

        match derive_collider(config.shape, &config.overrides(), pose.scale, source) {
            Some(collider) => colliders.push(collider),
            None => debug!(entity = ?entity, shape = %config.shape, "Skipping collider without a mesh"),
        }
    }

    if colliders.is_empty() {
        return Err(PhysicsError::NoCollider(entity));
    }

    Ok(RigidBodyDesc {
        kind: body.kind,
        position: pose.position,
        rotation: pose.rotation.normalize(),
        lock_translation: body.lock_translation.unwrap_or_default(),
        lock_rotation: body.lock_rotation.unwrap_or_default(),
        colliders,
    })
}
