//! Scene engine with rigid body physics
//!
//! This crate provides an entity hierarchy, mesh geometry, scene
//! serialization, and the integration layer that turns authored scene
//! entities into Rapier rigid bodies.

pub mod config;
pub mod core;
pub mod graphics;
pub mod io;
pub mod physics;

// Re-export commonly used types
pub mod prelude {
    // Entity system types
    pub use crate::core::entity::{
        update_hierarchy_system, Entity, GlobalTransform, Name, Parent, Transform, World,
    };

    // Math types
    pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

    // Graphics types
    pub use crate::graphics::{Aabb, BoundingSphere, Geometry, Mesh, MeshLibrary};

    // IO types
    pub use crate::io::{EntityMapper, Scene, SceneError};

    // Config types
    pub use crate::config::{AssetConfig, PhysicsSettings};

    // Physics types
    pub use crate::physics::{
        configure_physics_engine, physics_engine, AttachOutcome, CollisionProxy, InteractionMask,
        PhysicsBody, PhysicsError, RapierWorld, RigidBodyKind, ScenePhysics, ShapeKind, SkipReason,
    };
}

/// Initialize logging for the engine
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
