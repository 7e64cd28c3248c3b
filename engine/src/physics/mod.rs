//! Physics integration using Rapier3D
//!
//! Turns scene entities (world transform, collision proxy mesh, authored
//! [`PhysicsBody`] configuration) into rigid body descriptors and binds them
//! to a physics world owned by the scene.

pub mod binder;
pub mod bounds;
pub mod collider;
pub mod components;
pub mod engine;
pub mod error;
pub mod groups;
pub mod loader;
pub mod rigid_body;
pub mod world;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use binder::{AttachOutcome, AttachRequest, Preparation, SceneHit, ScenePhysics, SkipReason};
pub use bounds::{box_bounds, indexed_geometry, sphere_bounds, weld_vertices, IndexedGeometry};
pub use collider::{derive_collider, ColliderDesc, ColliderMaterial, ColliderOverrides, ColliderShape};
pub use components::{
    CollisionProxy, ColliderConfig, PhysicsBody, RigidBodyKind, ShapeKind, UnknownTag,
};
pub use engine::{BodyHandles, PhysicsEngine, PhysicsModule, RaycastHit, RaycastQuery};
pub use error::PhysicsError;
pub use groups::{GroupError, InteractionMask, GROUP_COUNT};
pub use loader::{EngineInit, EngineLoadError, EngineLoader, LoaderStatus, ModuleSource, Platform};
pub use rigid_body::{assemble_rigid_body, rigid_body_for_entity, RigidBodyDesc};
pub use world::{configure_physics_engine, physics_engine, RapierModule, RapierSource, RapierWorld};

// Re-export commonly used Rapier types
pub use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
